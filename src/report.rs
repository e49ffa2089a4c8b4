// Reporting strategies: what to do with each comparison outcome.

use std::ops::ControlFlow;

use crate::compare::Outcome;
use crate::pattern::Probe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Stop at the first mismatch.
    FailFast,
    /// Visit everything and count.
    Stats,
}

impl ReportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportMode::FailFast => "fail-fast",
            ReportMode::Stats => "stats",
        }
    }
}

/// Exit status of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TestResult {
    Pass = 0,
    Fail = 1,
}

impl TestResult {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_pass(self) -> bool {
        self == TestResult::Pass
    }
}

/// The first differing position found by a fail-fast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub probe: Probe,
    pub expected: u16,
    pub actual: u16,
}

/// What a finished traversal found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    /// Fail-fast run that saw only matches.
    Clean { visited: usize },
    /// Fail-fast run stopped at `mismatch`, the `visited`-th position.
    Stopped { visited: usize, mismatch: Mismatch },
    Counted { success: usize, failure: usize },
}

impl Summary {
    pub fn visited(&self) -> usize {
        match *self {
            Summary::Clean { visited } | Summary::Stopped { visited, .. } => visited,
            Summary::Counted { success, failure } => success + failure,
        }
    }

    pub fn result(&self) -> TestResult {
        match *self {
            Summary::Clean { .. } => TestResult::Pass,
            Summary::Stopped { .. } => TestResult::Fail,
            Summary::Counted { failure, .. } => {
                if failure > 0 {
                    TestResult::Fail
                } else {
                    TestResult::Pass
                }
            }
        }
    }
}

/// Consumes outcomes in visiting order and decides when to stop.
pub trait ReportingStrategy {
    fn record(&mut self, probe: Probe, outcome: Outcome) -> ControlFlow<()>;

    fn finish(self) -> Summary;
}

#[derive(Debug, Default)]
pub struct FailFast {
    visited: usize,
    first: Option<Mismatch>,
}

impl ReportingStrategy for FailFast {
    fn record(&mut self, probe: Probe, outcome: Outcome) -> ControlFlow<()> {
        self.visited += 1;
        match outcome {
            Outcome::Match => ControlFlow::Continue(()),
            Outcome::Mismatch { expected, actual } => {
                self.first = Some(Mismatch { probe, expected, actual });
                ControlFlow::Break(())
            }
        }
    }

    fn finish(self) -> Summary {
        match self.first {
            Some(mismatch) => Summary::Stopped {
                visited: self.visited,
                mismatch,
            },
            None => Summary::Clean { visited: self.visited },
        }
    }
}

#[derive(Debug, Default)]
pub struct Stats {
    success: usize,
    failure: usize,
}

impl ReportingStrategy for Stats {
    fn record(&mut self, _probe: Probe, outcome: Outcome) -> ControlFlow<()> {
        if outcome.is_match() {
            self.success += 1;
        } else {
            self.failure += 1;
        }
        ControlFlow::Continue(())
    }

    fn finish(self) -> Summary {
        Summary::Counted {
            success: self.success,
            failure: self.failure,
        }
    }
}
