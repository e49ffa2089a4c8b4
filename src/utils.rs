// Command line handling.

use std::path::PathBuf;

use clap::Parser;

use crate::image::validate_version;
use crate::layout::{RomLayout, DEFAULT_BANK_SIZE, DEFAULT_HARDWARE_BASE};
use crate::logger::LogLevel;
use crate::pattern::SeedSource;
use crate::suite::{SuiteConfig, MASK_ALL};

// Debug builds run against the emulator's ROM dump and keep the long
// tests short.
#[cfg(debug_assertions)]
pub const DEFAULT_IMAGE: &str = "HATARROM.BIN";
#[cfg(not(debug_assertions))]
pub const DEFAULT_IMAGE: &str = "TESTROM.BIN";

#[cfg(debug_assertions)]
pub const DEFAULT_REQUESTS: usize = 1000;
#[cfg(not(debug_assertions))]
pub const DEFAULT_REQUESTS: usize = 1_000_000;

pub const DEFAULT_DEVICE_PATH: &str = "/dev/mem";

/// Version string the ROM images of this build carry.
pub const BUILD_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(short = 'i', long = "image", default_value = DEFAULT_IMAGE,
          help = "Reference image the ROM was programmed from")]
    pub image: PathBuf,

    #[arg(short = 'b', long = "base", value_parser = parse_number,
          default_value_t = DEFAULT_HARDWARE_BASE,
          help = "Bus address of the first bank (supports hex like 0xFA0000)")]
    pub base: u64,

    #[arg(short = 's', long = "bank-size", value_parser = parse_size,
          default_value_t = DEFAULT_BANK_SIZE as u64,
          help = "Size of one bank, default unit is bytes (supports K and M suffixes)")]
    pub bank_size: u64,

    #[arg(short = 'd', long = "device-path", default_value = DEFAULT_DEVICE_PATH,
          help = "Physical memory device the ROM window is mapped from")]
    pub device_path: PathBuf,

    #[arg(short = 'f', long = "device-file", conflicts_with = "device_path",
          help = "Verify a ROM dump file instead of the live ROM window")]
    pub device_file: Option<PathBuf>,

    #[arg(short = 'r', long = "random-requests", default_value_t = DEFAULT_REQUESTS,
          help = "Number of reads per random access test")]
    pub random_requests: usize,

    #[arg(short = 'a', long = "address-line-requests", default_value_t = DEFAULT_REQUESTS,
          help = "Number of reads per address line")]
    pub address_line_requests: usize,

    #[arg(long = "seed", value_parser = parse_number,
          help = "Fixed seed for the random tests (default: time based, new per test)")]
    pub seed: Option<u64>,

    #[arg(short = 'p', long = "tests", value_parser = parse_number,
          default_value = "0x3ff",
          help = "Mask of tests to run (supports hex like 0x3ff)")]
    pub tests: u64,

    #[arg(long = "expected-version", default_value = BUILD_VERSION,
          help = "Version string the ROM image must carry")]
    pub expected_version: String,

    #[arg(short = 'c', long = "core",
          help = "Logical core to pin the verification thread to")]
    pub core: Option<usize>,

    #[arg(short = 'g', long = "generate",
          help = "Write a fresh test image to this path and exit")]
    pub generate: Option<PathBuf>,

    #[arg(short = 'w', long = "wait-key",
          help = "Wait for a key press before exiting")]
    pub wait_key: bool,

    #[arg(short = 'v', long = "verbose", conflicts_with = "quiet",
          help = "Show debug messages")]
    pub verbose: bool,

    #[arg(short = 'q', long = "quiet", help = "Only show warnings and errors")]
    pub quiet: bool,
}

impl Args {
    pub fn layout(&self) -> Result<RomLayout, String> {
        let bank_size = usize::try_from(self.bank_size)
            .map_err(|_| format!("bank size {} does not fit in memory", self.bank_size))?;
        RomLayout::new(self.base, bank_size).map_err(|e| e.to_string())
    }

    pub fn seed_source(&self) -> SeedSource {
        match self.seed {
            Some(seed) => SeedSource::Fixed(seed),
            None => SeedSource::Time,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Warn
        } else {
            LogLevel::Info
        }
    }

    /// The version images must carry, if it fits the ROM header.
    pub fn expected_version(&self) -> Result<&str, String> {
        validate_version(&self.expected_version)?;
        Ok(&self.expected_version)
    }

    pub fn suite_config(&self) -> Result<SuiteConfig, String> {
        if self.tests & !MASK_ALL != 0 {
            return Err(format!(
                "test mask 0x{:X} selects unknown tests (valid bits: 0x{:X})",
                self.tests, MASK_ALL
            ));
        }
        Ok(SuiteConfig {
            random_requests: self.random_requests,
            address_line_requests: self.address_line_requests,
            expected_version: self.expected_version()?.to_string(),
            mask: self.tests,
        })
    }
}

/// Parses a byte count such as `65536`, `64K` or `1M`.
///
/// Hex input (`0x10000`) takes no suffix, so a trailing `B` stays a digit.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim().to_uppercase();
    if s.starts_with("0X") {
        return parse_number(&s);
    }

    let (num_str, mult) = if let Some(num) = s.strip_suffix('K') {
        (num, 1024)
    } else if let Some(num) = s.strip_suffix('M') {
        (num, 1024 * 1024)
    } else if let Some(num) = s.strip_suffix('B') {
        (num, 1)
    } else {
        (s.as_str(), 1)
    };

    parse_number(num_str)?
        .checked_mul(mult)
        .ok_or_else(|| format!("Size too large: {}", s))
}

/// Parses a decimal or `0x`-prefixed hex number.
pub fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|_| format!("Invalid hex number: {}", s))
    } else {
        s.parse::<u64>().map_err(|_| format!("Invalid number: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes_with_suffixes() {
        assert_eq!(parse_size("65536"), Ok(65536));
        assert_eq!(parse_size("64K"), Ok(65536));
        assert_eq!(parse_size("64k"), Ok(65536));
        assert_eq!(parse_size("1M"), Ok(1 << 20));
        assert_eq!(parse_size("0x10000"), Ok(65536));
        assert_eq!(parse_size("0x8B"), Ok(0x8B));
        assert_eq!(parse_size("0xFFFFB"), Ok(0xFFFFB));
        assert_eq!(parse_size("128B"), Ok(128));
        assert!(parse_size("0x4K").is_err());
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn parses_hex_and_decimal_numbers() {
        assert_eq!(parse_number("0xFA0000"), Ok(0xFA0000));
        assert_eq!(parse_number("0X3ff"), Ok(0x3FF));
        assert_eq!(parse_number("42"), Ok(42));
        assert!(parse_number("0xZZ").is_err());
    }

    #[test]
    fn defaults_describe_the_cartridge_port() {
        let args = Args::parse_from(["romtester"]);
        assert_eq!(args.layout(), Ok(RomLayout::default()));
        assert_eq!(args.seed_source(), SeedSource::Time);
        assert_eq!(args.log_level(), LogLevel::Info);
        let config = args.suite_config().unwrap();
        assert_eq!(config.mask, MASK_ALL);
        assert_eq!(config.expected_version, BUILD_VERSION);
        assert_eq!(config.random_requests, DEFAULT_REQUESTS);
    }

    #[test]
    fn command_line_overrides_geometry_and_seed() {
        let args = Args::parse_from([
            "romtester", "--base", "0xE00000", "--bank-size", "4K", "--seed", "0x1234", "-p", "0x3", "-v",
        ]);
        assert_eq!(args.layout(), RomLayout::new(0xE00000, 4096).map_err(|e| e.to_string()));
        assert_eq!(args.seed_source(), SeedSource::Fixed(0x1234));
        assert_eq!(args.log_level(), LogLevel::Debug);
        assert_eq!(args.suite_config().unwrap().mask, 0x3);
    }

    #[test]
    fn unknown_test_bits_are_rejected() {
        let args = Args::parse_from(["romtester", "-p", "0x400"]);
        assert!(args.suite_config().is_err());
    }

    #[test]
    fn hex_bank_size_ending_in_b_is_not_truncated() {
        let args = Args::parse_from(["romtester", "--bank-size", "0x8B"]);
        assert_eq!(args.bank_size, 0x8B);
        assert!(args.layout().unwrap_err().contains("power of two"));
    }

    #[test]
    fn overlong_expected_version_is_a_config_error() {
        let args = Args::parse_from(["romtester", "--expected-version", "v10.20.30-beta"]);
        assert!(args.expected_version().is_err());
        assert!(args.suite_config().unwrap_err().contains("at most 10"));

        let args = Args::parse_from(["romtester", "--expected-version", "v10.20.30-"]);
        assert_eq!(args.suite_config().unwrap().expected_version, "v10.20.30-");
    }

    #[test]
    fn bad_bank_size_is_reported() {
        let args = Args::parse_from(["romtester", "--bank-size", "3000"]);
        assert!(args.layout().unwrap_err().contains("power of two"));
    }
}
