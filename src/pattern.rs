// Access patterns: which unit offsets of a bank are visited, and in what order.

use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::layout::{RomLayout, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Sequential,
    Random,
    AddressLine,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Sequential => "sequential",
            PatternKind::Random => "random",
            PatternKind::AddressLine => "address line",
        }
    }

    /// Builds the offset sequence for one test.
    ///
    /// `requests` is ignored by the sequential pattern, which always covers
    /// the whole bank. `rng` is only consumed by the random pattern.
    pub fn sequence(
        self,
        layout: &RomLayout,
        unit: Unit,
        requests: usize,
        rng: StdRng,
    ) -> AccessSequence {
        let units = layout.units_per_bank(unit);
        match self {
            PatternKind::Sequential => AccessSequence::Sequential(0..units),
            PatternKind::Random => AccessSequence::Random(RandomOffsets {
                rng,
                remaining: requests,
                units,
            }),
            PatternKind::AddressLine => AccessSequence::AddressLine(AddressLineOffsets::new(
                address_lines(layout),
                unit,
                requests,
            )),
        }
    }
}

/// The address lines that can be driven high on their own.
///
/// A0 never reaches a 16-bit bus and the topmost line of the bank is not
/// probed, so a 64K bank yields A1..=A14.
pub fn address_lines(layout: &RomLayout) -> Range<u32> {
    1..layout.address_bits() - 1
}

/// One visited position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// Offset inside the bank, in units.
    pub offset: usize,
    /// The address line held high, for the address-line pattern.
    pub line: Option<u32>,
}

impl Probe {
    fn at(offset: usize) -> Self {
        Self { offset, line: None }
    }
}

/// Lazy offset sequence produced by a `PatternKind`.
#[derive(Debug, Clone)]
pub enum AccessSequence {
    Sequential(Range<usize>),
    Random(RandomOffsets),
    AddressLine(AddressLineOffsets),
}

impl Iterator for AccessSequence {
    type Item = Probe;

    fn next(&mut self) -> Option<Probe> {
        match self {
            AccessSequence::Sequential(range) => range.next().map(Probe::at),
            AccessSequence::Random(offsets) => offsets.next(),
            AccessSequence::AddressLine(offsets) => offsets.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            AccessSequence::Sequential(range) => range.size_hint(),
            AccessSequence::Random(offsets) => (offsets.remaining, Some(offsets.remaining)),
            AccessSequence::AddressLine(offsets) => {
                let left = offsets.remaining();
                (left, Some(left))
            }
        }
    }
}

/// Uniform draws with replacement from `[0, units)`.
#[derive(Debug, Clone)]
pub struct RandomOffsets {
    rng: StdRng,
    remaining: usize,
    units: usize,
}

impl Iterator for RandomOffsets {
    type Item = Probe;

    fn next(&mut self) -> Option<Probe> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(Probe::at(self.rng.gen_range(0..self.units)))
    }
}

/// Each line's single-bit address, repeated `requests` times.
#[derive(Debug, Clone)]
pub struct AddressLineOffsets {
    lines: Range<u32>,
    current: Option<u32>,
    unit: Unit,
    requests: usize,
    left_on_line: usize,
}

impl AddressLineOffsets {
    fn new(mut lines: Range<u32>, unit: Unit, requests: usize) -> Self {
        let current = if requests == 0 { None } else { lines.next() };
        Self {
            lines,
            current,
            unit,
            requests,
            left_on_line: requests,
        }
    }

    fn remaining(&self) -> usize {
        match self.current {
            Some(_) => self.left_on_line + self.lines.len() * self.requests,
            None => 0,
        }
    }
}

impl Iterator for AddressLineOffsets {
    type Item = Probe;

    fn next(&mut self) -> Option<Probe> {
        let line = self.current?;
        self.left_on_line -= 1;
        if self.left_on_line == 0 {
            self.current = self.lines.next();
            self.left_on_line = self.requests;
        }
        // Only `line` set on the byte address bus.
        let byte_address = 1usize << line;
        Some(Probe {
            offset: byte_address / self.unit.bytes(),
            line: Some(line),
        })
    }
}

/// Where random-pattern seeds come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    /// A fresh, coarse time-derived seed for every test.
    Time,
    /// The same seed for every test, so runs can be reproduced.
    Fixed(u64),
}

impl SeedSource {
    pub fn seed(&self) -> u64 {
        match self {
            SeedSource::Fixed(seed) => *seed,
            SeedSource::Time => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() ^ u64::from(d.subsec_micros()))
                .unwrap_or_default(),
        }
    }

    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn layout() -> RomLayout {
        RomLayout::default()
    }

    fn rng() -> StdRng {
        SeedSource::Fixed(1).rng()
    }

    #[test]
    fn sequential_covers_bank_in_order() {
        for unit in [Unit::Word, Unit::Byte] {
            let offsets: Vec<usize> = PatternKind::Sequential
                .sequence(&layout(), unit, 0, rng())
                .map(|p| p.offset)
                .collect();
            let count = layout().units_per_bank(unit);
            assert_eq!(offsets.len(), count);
            assert!(offsets.iter().enumerate().all(|(i, &o)| i == o));
        }
    }

    #[test]
    fn sequential_is_restartable() {
        let a: Vec<Probe> = PatternKind::Sequential.sequence(&layout(), Unit::Word, 0, rng()).collect();
        let b: Vec<Probe> = PatternKind::Sequential.sequence(&layout(), Unit::Word, 0, rng()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn random_yields_requested_count_in_range() {
        for unit in [Unit::Word, Unit::Byte] {
            let units = layout().units_per_bank(unit);
            let seq = PatternKind::Random.sequence(&layout(), unit, 5000, rng());
            assert_eq!(seq.size_hint(), (5000, Some(5000)));
            let offsets: Vec<usize> = seq.map(|p| p.offset).collect();
            assert_eq!(offsets.len(), 5000);
            assert!(offsets.iter().all(|&o| o < units));
        }
    }

    #[test]
    fn random_coverage_grows_with_requests() {
        let small = RomLayout::new(0, 256).unwrap();
        let seen: HashSet<usize> = PatternKind::Random
            .sequence(&small, Unit::Byte, 20_000, rng())
            .map(|p| p.offset)
            .collect();
        // 20000 draws over 256 slots leave nothing uncovered in practice.
        assert_eq!(seen.len(), 256);
    }

    #[test]
    fn fixed_seed_reproduces_random_sequence() {
        let seeds = SeedSource::Fixed(0xC0FFEE);
        let a: Vec<Probe> = PatternKind::Random.sequence(&layout(), Unit::Byte, 100, seeds.rng()).collect();
        let b: Vec<Probe> = PatternKind::Random.sequence(&layout(), Unit::Byte, 100, seeds.rng()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn address_lines_skip_a0_and_stop_at_a14() {
        assert_eq!(address_lines(&layout()), 1..15);

        let probes: Vec<Probe> = PatternKind::AddressLine
            .sequence(&layout(), Unit::Word, 3, rng())
            .collect();
        assert_eq!(probes.len(), 14 * 3);
        for probe in &probes {
            let line = probe.line.unwrap();
            assert!((1..=14).contains(&line));
            assert_eq!(probe.offset * Unit::Word.bytes(), 1 << line);
        }
        let lines: Vec<u32> = probes.iter().step_by(3).map(|p| p.line.unwrap()).collect();
        assert_eq!(lines, (1..=14).collect::<Vec<_>>());
    }

    #[test]
    fn address_line_byte_offsets_are_the_raw_address() {
        let offsets: Vec<usize> = PatternKind::AddressLine
            .sequence(&layout(), Unit::Byte, 1, rng())
            .map(|p| p.offset)
            .collect();
        assert_eq!(offsets, (1..=14).map(|l| 1usize << l).collect::<Vec<_>>());
    }

    #[test]
    fn address_line_size_hint_tracks_progress() {
        let mut seq = PatternKind::AddressLine.sequence(&layout(), Unit::Word, 2, rng());
        assert_eq!(seq.size_hint(), (28, Some(28)));
        seq.next();
        seq.next();
        seq.next();
        assert_eq!(seq.size_hint(), (25, Some(25)));
    }

    #[test]
    fn zero_requests_produce_nothing() {
        assert_eq!(PatternKind::AddressLine.sequence(&layout(), Unit::Word, 0, rng()).count(), 0);
        assert_eq!(PatternKind::Random.sequence(&layout(), Unit::Word, 0, rng()).count(), 0);
    }
}
