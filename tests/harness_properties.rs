mod common;

use common::{output, RomFixture};

use romtester::layout::{Bank, Unit};
use romtester::pattern::{PatternKind, SeedSource};
use romtester::report::{ReportMode, Summary, TestResult};
use romtester::harness::TestCase;

const UNITS: [Unit; 2] = [Unit::Word, Unit::Byte];

fn case(pattern: PatternKind, unit: Unit, mode: ReportMode, bank: Bank, requests: usize) -> TestCase {
    TestCase { pattern, unit, mode, bank, requests }
}

#[test]
fn fail_fast_and_stats_agree_on_matching_data() {
    let fixture = RomFixture::generated(11);
    let mut harness = fixture.harness(SeedSource::Fixed(5));
    for bank in Bank::ALL {
        for unit in UNITS {
            let fast = harness.run_test(&case(PatternKind::Sequential, unit, ReportMode::FailFast, bank, 0));
            let stats = harness.run_test(&case(PatternKind::Sequential, unit, ReportMode::Stats, bank, 0));
            assert_eq!(fast.result(), TestResult::Pass);
            assert_eq!(stats.result(), TestResult::Pass);
            assert_eq!(
                stats.summary,
                Summary::Counted { success: fixture.layout.units_per_bank(unit), failure: 0 }
            );
        }
    }
}

#[test]
fn fail_fast_and_stats_agree_on_corrupted_data() {
    let mut fixture = RomFixture::generated(12);
    let offset = fixture.layout.bank_start(Bank::Rom4) + 0x1234;
    fixture.flip_device_byte(offset, 0x10);
    let mut harness = fixture.harness(SeedSource::Fixed(5));
    for unit in UNITS {
        let fast = harness.run_test(&case(PatternKind::Sequential, unit, ReportMode::FailFast, Bank::Rom4, 0));
        let stats = harness.run_test(&case(PatternKind::Sequential, unit, ReportMode::Stats, Bank::Rom4, 0));
        assert_eq!(fast.result(), TestResult::Fail);
        assert_eq!(stats.result(), TestResult::Fail);
        match stats.summary {
            Summary::Counted { failure, .. } => assert_eq!(failure, 1),
            other => panic!("unexpected summary {:?}", other),
        }
    }
}

#[test]
fn sequential_runs_are_repeatable() {
    let mut fixture = RomFixture::generated(13);
    fixture.flip_device_byte(fixture.layout.bank_start(Bank::Rom3) + 999, 0xFF);
    let mut harness = fixture.harness(SeedSource::Time);
    let c = case(PatternKind::Sequential, Unit::Byte, ReportMode::FailFast, Bank::Rom3, 0);
    let first = harness.run_test(&c);
    let second = harness.run_test(&c);
    assert_eq!(first, second);
}

#[test]
fn stats_counts_add_up_for_every_pattern_and_unit() {
    let mut fixture = RomFixture::generated(14);
    // Sprinkle differences over both banks, including an address-line slot.
    for offset in [0x0002, 0x0400, 0x2345, 0x8001, 0x10000 + 0x40, 0x1FFFF] {
        fixture.flip_device_byte(offset, 0x01);
    }
    let mut harness = fixture.harness(SeedSource::Fixed(99));
    for pattern in [PatternKind::Sequential, PatternKind::Random, PatternKind::AddressLine] {
        for unit in UNITS {
            for bank in Bank::ALL {
                let requests = 3000;
                let report = harness.run_test(&case(pattern, unit, ReportMode::Stats, bank, requests));
                let expected_visits = match pattern {
                    PatternKind::Sequential => fixture.layout.units_per_bank(unit),
                    PatternKind::Random => requests,
                    PatternKind::AddressLine => 14 * requests,
                };
                match report.summary {
                    Summary::Counted { success, failure } => {
                        assert_eq!(success + failure, expected_visits, "{}", report.case.label());
                    }
                    other => panic!("unexpected summary {:?}", other),
                }
            }
        }
    }
}

#[test]
fn fail_fast_reports_position_k_and_goes_no_further() {
    let mut fixture = RomFixture::zeroed();
    let k = 0x321;
    let bank = Bank::Rom4;
    // Word k covers bytes 2k and 2k+1.
    fixture.flip_device_byte(fixture.layout.bank_start(bank) + 2 * k + 1, 0x04);
    let mut harness = fixture.harness(SeedSource::Fixed(0));
    let report = harness.run_test(&case(PatternKind::Sequential, Unit::Word, ReportMode::FailFast, bank, 0));

    assert_eq!(report.summary.visited(), k + 1);
    assert_eq!(report.mismatch_address, Some(0xFA0000 + 2 * k as u64));
    match report.summary {
        Summary::Stopped { mismatch, .. } => {
            assert_eq!(mismatch.probe.offset, k);
            assert_eq!(mismatch.expected, 0x0000);
            assert_eq!(mismatch.actual, 0x0004);
        }
        other => panic!("unexpected summary {:?}", other),
    }
}

#[test]
fn flipped_byte_in_bank_b_leaves_bank_a_clean() {
    let mut fixture = RomFixture::generated(15);
    let absolute = fixture.layout.bank_start(Bank::Rom3) + 100;
    let expected = fixture.reference.as_slice()[absolute];
    fixture.flip_device_byte(absolute, 0xFF);
    let actual = fixture.device.as_slice()[absolute];

    let mut harness = fixture.harness(SeedSource::Fixed(1));
    let bank_b = harness.run_test(&case(PatternKind::Sequential, Unit::Byte, ReportMode::FailFast, Bank::Rom3, 0));
    let bank_a = harness.run_test(&case(PatternKind::Sequential, Unit::Byte, ReportMode::FailFast, Bank::Rom4, 0));

    assert_eq!(bank_b.result(), TestResult::Fail);
    assert_eq!(bank_b.mismatch_address, Some(0xFB0064));
    match bank_b.summary {
        Summary::Stopped { mismatch, .. } => {
            assert_eq!(mismatch.expected, u16::from(expected));
            assert_eq!(mismatch.actual, u16::from(actual));
        }
        other => panic!("unexpected summary {:?}", other),
    }
    assert_eq!(bank_a.result(), TestResult::Pass);

    let out = output(harness);
    assert!(out.contains(&format!(
        "x Error: Data mismatch at address 0xFB0064. Expected: 0x{:02X}, got: 0x{:02X}\r\n",
        expected, actual
    )));
    assert!(out.contains("- Testing sequential read bytes ROM 4...  "));
}

#[test]
fn random_fail_fast_with_fixed_seed_is_reproducible() {
    let mut fixture = RomFixture::zeroed();
    // Corrupt a quarter of bank A so random probes hit quickly.
    for offset in (0..fixture.layout.bank_size()).step_by(4) {
        fixture.flip_device_byte(offset, 0x01);
    }
    let c = case(PatternKind::Random, Unit::Byte, ReportMode::FailFast, Bank::Rom4, 10_000);
    let a = fixture.harness(SeedSource::Fixed(77)).run_test(&c);
    let b = fixture.harness(SeedSource::Fixed(77)).run_test(&c);
    assert_eq!(a, b);
    assert_eq!(a.result(), TestResult::Fail);
    let address = a.mismatch_address.unwrap();
    assert_eq!((address - 0xFA0000) % 4, 0);
}
