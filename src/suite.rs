// The fixed battery of ROM checks and the runner that walks it.

use std::io::Write;

use crate::harness::{Harness, TestCase};
use crate::image::{decode_version, read_version_field};
use crate::layout::{Bank, Unit};
use crate::pattern::PatternKind;
use crate::report::{ReportMode, TestResult};
use crate::{log_info_fmt, log_warn_fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteEntry {
    /// Compare the version string stored in the ROM with ours.
    VersionString,
    /// One harness run per bank.
    Verify {
        pattern: PatternKind,
        unit: Unit,
        mode: ReportMode,
    },
}

pub struct SuiteTest {
    pub name: &'static str,
    pub entry: SuiteEntry,
    pub mask: u64,
}

pub const MASK_VERSION_STRING: u64 = 1 << 0;
pub const MASK_SEQ_WORDS: u64 = 1 << 1;
pub const MASK_SEQ_WORDS_STATS: u64 = 1 << 2;
pub const MASK_SEQ_BYTES: u64 = 1 << 3;
pub const MASK_SEQ_BYTES_STATS: u64 = 1 << 4;
pub const MASK_RANDOM_WORDS: u64 = 1 << 5;
pub const MASK_RANDOM_WORDS_STATS: u64 = 1 << 6;
pub const MASK_RANDOM_BYTES: u64 = 1 << 7;
pub const MASK_RANDOM_BYTES_STATS: u64 = 1 << 8;
pub const MASK_ADDRESS_LINES: u64 = 1 << 9;

/// Every test in the battery.
pub const MASK_ALL: u64 = (1 << 10) - 1;

const fn verify(pattern: PatternKind, unit: Unit, mode: ReportMode) -> SuiteEntry {
    SuiteEntry::Verify { pattern, unit, mode }
}

pub static SUITE: &[SuiteTest] = &[
    SuiteTest { name: "Version String", entry: SuiteEntry::VersionString, mask: MASK_VERSION_STRING },
    SuiteTest { name: "Sequential Words", entry: verify(PatternKind::Sequential, Unit::Word, ReportMode::FailFast), mask: MASK_SEQ_WORDS },
    SuiteTest { name: "Sequential Words Stats", entry: verify(PatternKind::Sequential, Unit::Word, ReportMode::Stats), mask: MASK_SEQ_WORDS_STATS },
    SuiteTest { name: "Sequential Bytes", entry: verify(PatternKind::Sequential, Unit::Byte, ReportMode::FailFast), mask: MASK_SEQ_BYTES },
    SuiteTest { name: "Sequential Bytes Stats", entry: verify(PatternKind::Sequential, Unit::Byte, ReportMode::Stats), mask: MASK_SEQ_BYTES_STATS },
    SuiteTest { name: "Random Words", entry: verify(PatternKind::Random, Unit::Word, ReportMode::FailFast), mask: MASK_RANDOM_WORDS },
    SuiteTest { name: "Random Words Stats", entry: verify(PatternKind::Random, Unit::Word, ReportMode::Stats), mask: MASK_RANDOM_WORDS_STATS },
    SuiteTest { name: "Random Bytes", entry: verify(PatternKind::Random, Unit::Byte, ReportMode::FailFast), mask: MASK_RANDOM_BYTES },
    SuiteTest { name: "Random Bytes Stats", entry: verify(PatternKind::Random, Unit::Byte, ReportMode::Stats), mask: MASK_RANDOM_BYTES_STATS },
    SuiteTest { name: "Address Lines", entry: verify(PatternKind::AddressLine, Unit::Word, ReportMode::FailFast), mask: MASK_ADDRESS_LINES },
];

pub fn print_test_mask_help() {
    println!("Test Masks");
    println!("==========");
    println!();

    let mut mask: u64 = 0;
    for test in SUITE.iter() {
        println!("    {:24}|0x{:04X}", test.name, test.mask);
        mask |= test.mask;
    }
    println!("Use logical OR to combine tests: 0x{:04X}", mask)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    pub random_requests: usize,
    pub address_line_requests: usize,
    /// Version string the ROM is expected to carry.
    pub expected_version: String,
    pub mask: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRecord {
    pub name: String,
    pub result: TestResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteSummary {
    pub records: Vec<SuiteRecord>,
}

impl SuiteSummary {
    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.passed()
    }

    /// Worst result across every executed test, `Pass` for an empty run.
    pub fn overall(&self) -> TestResult {
        self.records
            .iter()
            .map(|r| r.result)
            .max()
            .unwrap_or(TestResult::Pass)
    }

    fn push(&mut self, name: String, result: TestResult) {
        self.records.push(SuiteRecord { name, result });
    }
}

/// Compares the version string stored in the device with `expected`.
pub fn check_version<W: Write>(harness: &mut Harness<'_, W>, expected: &str) -> TestResult {
    let found = decode_version(&read_version_field(harness.device()));
    let console = harness.console_mut();
    console.begin_test("version string");
    if found == expected {
        console.finish_test(&format!("Matches: {}.", expected));
        TestResult::Pass
    } else {
        console.fail_test(&format!(
            "ROM version string mismatch. Expected: {}, got: {}",
            expected, found
        ));
        log_warn_fmt!("ROM carries version '{}', this build expects '{}'", found, expected);
        TestResult::Fail
    }
}

/// Runs every selected test in catalogue order, regardless of earlier failures.
pub fn run_suite<W: Write>(harness: &mut Harness<'_, W>, config: &SuiteConfig) -> SuiteSummary {
    let mut summary = SuiteSummary::default();

    for test in SUITE.iter().filter(|t| config.mask & t.mask != 0) {
        match test.entry {
            SuiteEntry::VersionString => {
                let result = check_version(harness, &config.expected_version);
                summary.push(test.name.to_string(), result);
            }
            SuiteEntry::Verify { pattern, unit, mode } => {
                let requests = match pattern {
                    PatternKind::Sequential => 0,
                    PatternKind::Random => config.random_requests,
                    PatternKind::AddressLine => config.address_line_requests,
                };
                for bank in Bank::ALL {
                    let case = TestCase {
                        pattern,
                        unit,
                        mode,
                        bank,
                        requests,
                    };
                    let report = harness.run_test(&case);
                    summary.push(format!("{} {}", test.name, bank), report.result());
                }
            }
        }
    }

    log_info_fmt!(
        "Suite finished: {} passed, {} failed",
        summary.passed(),
        summary.failed()
    );
    summary
}
