// ROM geometry: banks, access units and the hardware address map.
//
// The absolute address computed here only ever ends up in diagnostic
// output. Reads always go through a region at a bank-relative offset.

use std::fmt;

/// Bus address of the cartridge ROM window (ROM 4 first, then ROM 3).
pub const DEFAULT_HARDWARE_BASE: u64 = 0xFA_0000;

/// Size of one bank window in bytes.
pub const DEFAULT_BANK_SIZE: usize = 64 * 1024;

/// Number of banks a ROM image is split into.
pub const BANK_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Word,
    Byte,
}

impl Unit {
    pub const fn bytes(self) -> usize {
        match self {
            Unit::Word => 2,
            Unit::Byte => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Word => "words",
            Unit::Byte => "bytes",
        }
    }

    /// Hex digits needed to print one value of this width.
    pub(crate) const fn hex_width(self) -> usize {
        self.bytes() * 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    /// First 64K window, wired to the ROM4 select line.
    Rom4,
    /// Second 64K window, wired to the ROM3 select line.
    Rom3,
}

impl Bank {
    pub const ALL: [Bank; BANK_COUNT] = [Bank::Rom4, Bank::Rom3];

    pub const fn index(self) -> usize {
        match self {
            Bank::Rom4 => 0,
            Bank::Rom3 => 1,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bank::Rom4 => write!(f, "ROM 4"),
            Bank::Rom3 => write!(f, "ROM 3"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    BankSizeNotPowerOfTwo(usize),
    BankSizeTooSmall(usize),
    MisalignedBase(u64),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::BankSizeNotPowerOfTwo(size) => {
                write!(f, "bank size {:#x} is not a power of two", size)
            }
            LayoutError::BankSizeTooSmall(size) => {
                write!(f, "bank size {:#x} is too small, need at least 8 bytes", size)
            }
            LayoutError::MisalignedBase(base) => {
                write!(f, "hardware base {:#x} is not word aligned", base)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// Where the banks live and how big they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomLayout {
    hardware_base: u64,
    bank_size: usize,
}

impl Default for RomLayout {
    fn default() -> Self {
        Self {
            hardware_base: DEFAULT_HARDWARE_BASE,
            bank_size: DEFAULT_BANK_SIZE,
        }
    }
}

impl RomLayout {
    pub fn new(hardware_base: u64, bank_size: usize) -> Result<Self, LayoutError> {
        if !bank_size.is_power_of_two() {
            return Err(LayoutError::BankSizeNotPowerOfTwo(bank_size));
        }
        // Address-line tests need line A1 to exist.
        if bank_size < 8 {
            return Err(LayoutError::BankSizeTooSmall(bank_size));
        }
        if hardware_base % 2 != 0 {
            return Err(LayoutError::MisalignedBase(hardware_base));
        }
        Ok(Self { hardware_base, bank_size })
    }

    pub fn hardware_base(&self) -> u64 {
        self.hardware_base
    }

    pub fn bank_size(&self) -> usize {
        self.bank_size
    }

    /// Total size of device and reference regions.
    pub fn image_size(&self) -> usize {
        self.bank_size * BANK_COUNT
    }

    /// Offset of a bank inside a region.
    pub fn bank_start(&self, bank: Bank) -> usize {
        bank.index() * self.bank_size
    }

    pub fn units_per_bank(&self, unit: Unit) -> usize {
        self.bank_size / unit.bytes()
    }

    /// Number of address bits decoded inside one bank.
    pub fn address_bits(&self) -> u32 {
        self.bank_size.trailing_zeros()
    }

    pub fn mapper(&self) -> AddressMapper {
        AddressMapper {
            hardware_base: self.hardware_base,
            bank_size: self.bank_size as u64,
        }
    }
}

/// Turns (bank, unit offset) into the address a logic analyser would see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMapper {
    hardware_base: u64,
    bank_size: u64,
}

impl AddressMapper {
    pub fn absolute_address(&self, bank: Bank, offset_in_unit: usize, unit: Unit) -> u64 {
        bank.index() as u64 * self.bank_size
            + self.hardware_base
            + (offset_in_unit * unit.bytes()) as u64
    }
}
