// The verification harness: one parameterised traversal loop that every
// test in the suite is an instance of.

use std::fmt;
use std::io::Write;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::compare::Comparator;
use crate::console::Console;
use crate::layout::{Bank, RomLayout, Unit};
use crate::pattern::{AccessSequence, PatternKind, SeedSource};
use crate::region::MemoryRegion;
use crate::report::{FailFast, ReportMode, ReportingStrategy, Stats, Summary, TestResult};
use crate::log_debug_fmt;

/// Parameters of one test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCase {
    pub pattern: PatternKind,
    pub unit: Unit,
    pub mode: ReportMode,
    pub bank: Bank,
    /// Number of draws for random tests, repetitions per line for
    /// address-line tests. Unused by sequential tests.
    pub requests: usize,
}

impl TestCase {
    /// One-line description printed before the test runs.
    pub fn label(&self) -> String {
        let stats = match self.mode {
            ReportMode::Stats => "stats ",
            ReportMode::FailFast => "",
        };
        match self.pattern {
            PatternKind::Sequential => format!(
                "{}sequential read {} {}",
                stats,
                self.unit.as_str(),
                self.bank
            ),
            PatternKind::Random => format!(
                "{}{} random read {} {}",
                stats,
                self.requests,
                self.unit.as_str(),
                self.bank
            ),
            PatternKind::AddressLine => format!(
                "{}addr lines read {} {} with {} req x line",
                stats,
                self.unit.as_str(),
                self.bank,
                self.requests
            ),
        }
    }
}

/// What one test found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub case: TestCase,
    pub summary: Summary,
    /// Bus address of the first mismatch, for fail-fast runs that found one.
    pub mismatch_address: Option<u64>,
}

impl TestReport {
    pub fn result(&self) -> TestResult {
        self.summary.result()
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.summary {
            Summary::Clean { .. } => write!(f, "Success."),
            Summary::Counted { success, failure } => {
                write!(f, "Success: {}, Fail: {}", success, failure)
            }
            Summary::Stopped { mismatch, .. } => {
                write!(f, "Data mismatch")?;
                if let Some(address) = self.mismatch_address {
                    write!(f, " at address 0x{:06X}", address)?;
                }
                if let Some(line) = mismatch.probe.line {
                    write!(f, " with only A{} high", line)?;
                }
                write!(
                    f,
                    ". Expected: 0x{:0w$X}, got: 0x{:0w$X}",
                    mismatch.expected,
                    mismatch.actual,
                    w = self.case.unit.hex_width()
                )
            }
        }
    }
}

pub struct Harness<'a, W: Write> {
    device: &'a dyn MemoryRegion,
    reference: &'a dyn MemoryRegion,
    layout: RomLayout,
    seeds: SeedSource,
    console: Console<W>,
}

impl<'a, W: Write> Harness<'a, W> {
    /// Both regions must be `layout.image_size()` bytes long.
    ///
    /// # Panics
    /// Panics if either region has the wrong length.
    pub fn new(
        device: &'a dyn MemoryRegion,
        reference: &'a dyn MemoryRegion,
        layout: RomLayout,
        seeds: SeedSource,
        console: Console<W>,
    ) -> Self {
        assert_eq!(device.len(), layout.image_size(), "device region size");
        assert_eq!(reference.len(), layout.image_size(), "reference region size");
        Self {
            device,
            reference,
            layout,
            seeds,
            console,
        }
    }

    pub fn device(&self) -> &'a dyn MemoryRegion {
        self.device
    }

    pub fn console_mut(&mut self) -> &mut Console<W> {
        &mut self.console
    }

    pub fn into_console(self) -> Console<W> {
        self.console
    }

    pub fn run_test(&mut self, case: &TestCase) -> TestReport {
        let label = case.label();
        // Logged before the label so the test line stays in one piece.
        let seed = self.seeds.seed();
        if case.pattern == PatternKind::Random {
            log_debug_fmt!("{}: seed {:#x}", label, seed);
        }
        self.console.begin_test(&label);

        let sequence = case.pattern.sequence(
            &self.layout,
            case.unit,
            case.requests,
            StdRng::seed_from_u64(seed),
        );
        let comparator = Comparator::new(
            self.device,
            self.reference,
            &self.layout,
            case.bank,
            case.unit,
        );

        let summary = match case.mode {
            ReportMode::FailFast => {
                traverse(sequence, &comparator, FailFast::default(), &mut self.console)
            }
            ReportMode::Stats => traverse(sequence, &comparator, Stats::default(), &mut self.console),
        };

        let mapper = self.layout.mapper();
        let mismatch_address = match summary {
            Summary::Stopped { mismatch, .. } => {
                Some(mapper.absolute_address(case.bank, mismatch.probe.offset, case.unit))
            }
            _ => None,
        };

        let report = TestReport {
            case: *case,
            summary,
            mismatch_address,
        };
        match report.summary {
            Summary::Stopped { .. } => self.console.fail_test(&report.to_string()),
            _ => self.console.finish_test(&report.to_string()),
        }

        log_debug_fmt!(
            "{}: {:?} after {} positions",
            label,
            summary.result(),
            summary.visited()
        );

        report
    }
}

/// Walks `sequence` in order, feeding every outcome to `strategy` until it asks to stop.
fn traverse<S: ReportingStrategy, W: Write>(
    sequence: AccessSequence,
    comparator: &Comparator<'_>,
    mut strategy: S,
    console: &mut Console<W>,
) -> Summary {
    for (iteration, probe) in sequence.enumerate() {
        console.spin(iteration);
        if strategy
            .record(probe, comparator.compare(probe.offset))
            .is_break()
        {
            break;
        }
    }
    strategy.finish()
}
