use std::cell::RefCell;

use res_profile::oracles::synthetic::FnOracle;
use res_profile::{
    BisectRecord, ProfileScanner, ProfileScannerBuilder, ProfileStore, ScanError,
};

#[test]
fn degenerate_range_fails_without_scanning() {
    let calls = RefCell::new(0u32);
    let oracle = FnOracle::new(|r| {
        *calls.borrow_mut() += 1;
        -r
    });
    let scanner = ProfileScanner::new(oracle);
    match scanner.scan((5.0, 5.0)) {
        Err(ScanError::InvalidRange { lo, hi }) => {
            assert_eq!(lo, 5.0);
            assert_eq!(hi, 5.0);
        }
        other => panic!("expected InvalidRange, got {other:?}"),
    }
    assert_eq!(*calls.borrow(), 0, "no oracle call for a degenerate range");
}

#[test]
fn first_logarithmic_midpoint_is_exactly_ten() {
    let sampled = RefCell::new(Vec::new());
    let oracle = FnOracle::new(|r| {
        sampled.borrow_mut().push(r);
        -r
    });
    let scanner = ProfileScanner::new(oracle);
    scanner.scan((1.0, 100.0)).unwrap();

    let sampled = sampled.borrow();
    assert_eq!(sampled[0], 1.0);
    assert_eq!(sampled[1], 100.0);
    // Geometric mean of the full range, sampled before any sub-interval.
    assert_eq!(sampled[2], 10.0);
}

#[test]
fn interval_straddling_zero_uses_arithmetic_midpoint() {
    let sampled = RefCell::new(Vec::new());
    let oracle = FnOracle::new(|r| {
        sampled.borrow_mut().push(r);
        -r
    });
    let scanner = ProfileScanner::new(oracle);
    scanner.scan((-4.0, 4.0)).unwrap();

    let sampled = sampled.borrow();
    assert_eq!(sampled[2], 0.0);
}

#[test]
fn monotone_oracle_yields_non_increasing_profile() {
    let scanner = ProfileScanner::new(FnOracle::new(|r| -r));
    let profile = scanner.scan((1.0, 100.0)).unwrap();
    assert!(profile.len() >= 2);
    for pair in profile.steps().windows(2) {
        assert!(pair[0].resolution < pair[1].resolution);
        assert!(pair[0].bisect_value >= pair[1].bisect_value);
    }
}

#[test]
fn end_to_end_linear_scenario() {
    let scanner = ProfileScannerBuilder::new(FnOracle::new(|r| 10.0 - r))
        .min_diff_bisect(2.0)
        .min_diff_resolution(0.01)
        .linear_bisection(true)
        .build();
    let profile = scanner.scan((0.0, 10.0)).unwrap();

    let first = profile.steps().first().unwrap();
    let last = profile.steps().last().unwrap();
    assert_eq!((first.resolution, first.bisect_value), (0.0, 10.0));
    assert_eq!((last.resolution, last.bisect_value), (10.0, 0.0));

    for pair in profile.steps().windows(2) {
        let gap = pair[0].bisect_value - pair[1].bisect_value;
        // Strictly decreasing, and every surviving interval reached the
        // bisect-value stop criterion.
        assert!(gap > 0.0);
        assert!(gap <= 2.0 + 1e-9);
    }
}

#[test]
fn step_oracle_compresses_to_two_breakpoints() {
    let oracle = FnOracle::new(|r| if r < 5.0 { 10.0 } else { 0.0 });
    let scanner = ProfileScanner::new(oracle);
    let profile = scanner.scan((0.0, 10.0)).unwrap();

    let kept: Vec<(f64, f64)> = profile
        .iter()
        .map(|s| (s.resolution, s.bisect_value))
        .collect();
    assert_eq!(kept, vec![(0.0, 10.0), (5.0, 0.0)]);
}

#[test]
fn repair_overwrites_stale_lower_resolution_record() {
    // The exact reference scenario: two flat records, then an insertion
    // that violates the non-increasing assumption relative to the lower one.
    let mut store = ProfileStore::new();
    store.insert(
        2.0,
        BisectRecord {
            partition: "old",
            bisect_value: 5.0,
        },
    );
    store.insert(
        8.0,
        BisectRecord {
            partition: "old",
            bisect_value: 5.0,
        },
    );
    store.insert(
        5.0,
        BisectRecord {
            partition: "new",
            bisect_value: 9.0,
        },
    );
    store.enforce_monotonic(5.0);

    let repaired = store.get(2.0).unwrap();
    assert_eq!(repaired.bisect_value, 9.0);
    assert_eq!(repaired.partition, "new");
    assert_eq!(store.get(8.0).unwrap().bisect_value, 5.0);
}

#[test]
fn noisy_sample_is_propagated_forward_by_repair() {
    // Deterministic except for one low outlier at resolution 2.5: the
    // repair rule treats the new record as authoritative and overwrites
    // every higher-resolution record showing a higher value.
    let oracle = FnOracle::new(|r| if r == 2.5 { 0.5 } else { 10.0 - r });
    let scanner = ProfileScannerBuilder::new(FnOracle::new(|r| 10.0 - r))
        .min_diff_bisect(2.0)
        .min_diff_resolution(0.01)
        .linear_bisection(true)
        .build();
    // Sanity: the clean profile keeps 5.0 as a breakpoint.
    let clean = scanner.scan((0.0, 10.0)).unwrap();
    assert!(clean.iter().any(|s| s.resolution == 5.0));

    let scanner = ProfileScannerBuilder::new(oracle)
        .min_diff_bisect(2.0)
        .min_diff_resolution(0.01)
        .linear_bisection(true)
        .build();
    let noisy = scanner.scan((0.0, 10.0)).unwrap();

    // The outlier survives as a breakpoint and swallows the plateau of
    // overwritten records behind it.
    assert!(noisy.iter().any(|s| s.resolution == 2.5 && s.bisect_value == 0.5));
    assert!(noisy.iter().all(|s| s.resolution != 5.0));
    for pair in noisy.steps().windows(2) {
        assert!(pair[0].bisect_value >= pair[1].bisect_value);
    }
    let last = noisy.steps().last().unwrap();
    assert_eq!((last.resolution, last.bisect_value), (10.0, 0.0));
}
