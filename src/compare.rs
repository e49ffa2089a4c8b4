// Unit-wise comparison of one bank of the device against the reference.

use crate::layout::{Bank, RomLayout, Unit};
use crate::region::MemoryRegion;

/// Result of comparing one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Match,
    Mismatch { expected: u16, actual: u16 },
}

impl Outcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Match)
    }
}

/// Reads the same unit from device and reference and compares them bit for bit.
pub struct Comparator<'a> {
    device: &'a dyn MemoryRegion,
    reference: &'a dyn MemoryRegion,
    bank_start: usize,
    unit: Unit,
}

impl<'a> Comparator<'a> {
    pub fn new(
        device: &'a dyn MemoryRegion,
        reference: &'a dyn MemoryRegion,
        layout: &RomLayout,
        bank: Bank,
        unit: Unit,
    ) -> Self {
        Self {
            device,
            reference,
            bank_start: layout.bank_start(bank),
            unit,
        }
    }

    /// Compares the unit at `offset` (in units, relative to the bank).
    pub fn compare(&self, offset: usize) -> Outcome {
        let byte_offset = self.bank_start + offset * self.unit.bytes();
        let (expected, actual) = match self.unit {
            Unit::Word => (
                self.reference.read_u16(byte_offset),
                self.device.read_u16(byte_offset),
            ),
            Unit::Byte => (
                u16::from(self.reference.read_u8(byte_offset)),
                u16::from(self.device.read_u8(byte_offset)),
            ),
        };
        if expected == actual {
            Outcome::Match
        } else {
            Outcome::Mismatch { expected, actual }
        }
    }
}
