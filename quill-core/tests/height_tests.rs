// quill-core/tests/height_tests.rs
//
// Tests for the height synchronizer: tolerance, zero reports, clamping to
// the configured maximum.

use quill_core::height::{DEFAULT_INITIAL_HEIGHT, HEIGHT_TOLERANCE, HeightSync, transition};

// ============================================================================
// Pure Transition Tests
// ============================================================================

#[test]
fn test_transition_table() {
    // (current, max, reported, expected)
    let cases = [
        (20, None, 21, 20),
        (20, None, 22, 20),
        (20, None, 18, 20),
        (20, None, 23, 23),
        (20, None, 17, 17),
        (20, None, 0, 20),
        (20, Some(100), 150, 100),
        (20, Some(100), 100, 100),
        (20, Some(100), 99, 99),
        (100, Some(100), 101, 100),
        (100, Some(100), 40, 40),
        (300, None, 1, 1),
    ];
    for (current, max, reported, expected) in cases {
        assert_eq!(
            transition(current, max, reported),
            expected,
            "transition({current}, {max:?}, {reported})"
        );
    }
}

#[test]
fn test_tolerance_constant() {
    assert_eq!(HEIGHT_TOLERANCE, 2);
    assert_eq!(DEFAULT_INITIAL_HEIGHT, 20);
}

#[test]
fn test_zero_never_changes_current() {
    for current in [0, 1, 20, 99, 5000] {
        for max in [None, Some(10), Some(10_000)] {
            assert_eq!(transition(current, max, 0), current);
        }
    }
}

// ============================================================================
// HeightSync Tests
// ============================================================================

#[test]
fn test_default_state() {
    let sync = HeightSync::default();
    assert_eq!(sync.current(), 20);
    assert_eq!(sync.max(), None);
}

#[test]
fn test_in_tolerance_report_is_ignored() {
    let mut sync = HeightSync::new(20, None);
    assert!(!sync.apply(21));
    assert_eq!(sync.current(), 20);
}

#[test]
fn test_report_above_max_is_clamped() {
    let mut sync = HeightSync::new(20, Some(100));
    assert!(sync.apply(150));
    assert_eq!(sync.current(), 100);
    // Still above max: clamps to the value it already has.
    assert!(!sync.apply(150));
    assert_eq!(sync.current(), 100);
}

#[test]
fn test_shrinking_report_applies() {
    let mut sync = HeightSync::new(20, None);
    assert!(sync.apply(200));
    assert!(sync.apply(60));
    assert_eq!(sync.current(), 60);
}

#[test]
fn test_initial_height_above_max_starts_clamped() {
    let sync = HeightSync::new(500, Some(100));
    assert_eq!(sync.current(), 100);
}

#[test]
fn test_current_never_exceeds_max() {
    let max = 240;
    let mut sync = HeightSync::new(20, Some(max));
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..2_000 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let reported = (seed % 600) as u32;
        sync.apply(reported);
        assert!(sync.current() <= max, "current {} > max", sync.current());
    }
}

#[test]
fn test_apply_matches_transition() {
    let reports = [0, 21, 40, 41, 39, 500, 0, 3, 5, 9];
    let mut sync = HeightSync::new(20, Some(300));
    let mut expected = 20;
    for reported in reports {
        let next = transition(expected, Some(300), reported);
        assert_eq!(sync.apply(reported), next != expected);
        expected = next;
        assert_eq!(sync.current(), expected);
    }
}
