// quill-core/tests/property_tests.rs
//
// Property-based checks for the universally quantified guarantees: commands
// survive encode -> parse unchanged for any argument text, and the height
// synchronizer never lets the layout height exceed its maximum.

use proptest::prelude::*;
use quill_core::height::{HEIGHT_TOLERANCE, HeightSync, transition};
use quill_core::protocol::{
    Command, CommandEncoder, CommandName, encode_command, is_valid_namespace, parse_statement,
};

// ── Strategies ──────────────────────────────────────────────────────────

fn namespace_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z_$][A-Za-z0-9_$]{0,8}(\\.[A-Za-z_$][A-Za-z0-9_$]{0,8}){0,3}"
}

/// Any command with the right number of arguments, each arbitrary text or
/// `null`.
fn command_strategy() -> impl Strategy<Value = Command> {
    prop::sample::select(CommandName::ALL.to_vec()).prop_flat_map(|name| {
        prop::collection::vec(prop::option::of(any::<String>()), name.arity())
            .prop_map(move |args| Command::new(name, args))
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Command round trip
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn test_statement_round_trip_any_arguments(
        namespace in namespace_strategy(),
        command in command_strategy(),
    ) {
        prop_assert!(is_valid_namespace(&namespace));
        let statement = encode_command(&namespace, &command);
        prop_assert_eq!(parse_statement(&namespace, &statement), Ok(command));
    }

    #[test]
    fn test_encoded_statement_is_one_line(command in command_strategy()) {
        let statement = CommandEncoder::default().encode(&command);
        prop_assert!(
            !statement.contains(['\n', '\r', '\u{2028}', '\u{2029}']),
            "encoded statement contains a line terminator: {:?}",
            statement
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Height synchronizer
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn test_current_never_exceeds_max_for_any_reports(
        initial in 0u32..10_000,
        max in 0u32..5_000,
        reports in prop::collection::vec(any::<u32>(), 0..64),
    ) {
        let mut sync = HeightSync::new(initial, Some(max));
        prop_assert!(sync.current() <= max);
        for reported in reports {
            sync.apply(reported);
            prop_assert!(sync.current() <= max);
        }
    }

    #[test]
    fn test_zero_and_in_tolerance_reports_never_change_current(
        current in 0u32..100_000,
        max in prop::option::of(0u32..100_000),
        delta in 0u32..=HEIGHT_TOLERANCE,
        above in any::<bool>(),
    ) {
        prop_assert_eq!(transition(current, max, 0), current);
        let reported = if above { current + delta } else { current.saturating_sub(delta) };
        if reported != 0 {
            prop_assert_eq!(transition(current, max, reported), current);
        }
    }

    #[test]
    fn test_apply_reports_change_exactly_when_current_moves(
        reports in prop::collection::vec(0u32..2_000, 0..64),
        max in prop::option::of(0u32..2_000),
    ) {
        let mut sync = HeightSync::new(20, max);
        for reported in reports {
            let before = sync.current();
            let changed = sync.apply(reported);
            prop_assert_eq!(changed, sync.current() != before);
        }
    }
}
