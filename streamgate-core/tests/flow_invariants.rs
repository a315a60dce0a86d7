//! Property tests for the flow-control half.
//!
//! The credit invariant must hold at every observed instant, for any
//! interleaving of window grants and reservations the contract allows, and
//! every disallowed step must be refused without mutating the half.

use proptest::prelude::*;

use streamgate_core::error::FlowError;
use streamgate_core::flow::{FlowHalf, HalfState};

/// One step of a randomly generated half workload.
#[derive(Debug, Clone)]
enum Step {
    /// Grant `ack_delta` more acknowledgement (capped at sequence) and
    /// `max_delta` more maximum.
    Window { ack_delta: u64, max_delta: u32 },
    /// Attempt to reserve a payload of `length` units.
    Reserve { length: u16 },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u64..4096, 0u32..4096).prop_map(|(ack_delta, max_delta)| Step::Window {
            ack_delta,
            max_delta,
        }),
        (0u16..2048).prop_map(|length| Step::Reserve { length }),
    ]
}

proptest! {
    /// Invariant: acknowledge <= sequence <= acknowledge + maximum after
    /// every accepted step; refused steps leave the half untouched.
    #[test]
    fn invariant_holds_under_any_workload(
        initial_maximum in 0u32..8192,
        steps in proptest::collection::vec(step_strategy(), 1..64),
    ) {
        let mut half = FlowHalf::new();
        half.open(0, 0).unwrap();
        half.on_window(0, initial_maximum, 0, 0).unwrap();

        for step in steps {
            let before = (half.sequence(), half.acknowledge(), half.maximum());
            match step {
                Step::Window { ack_delta, max_delta } => {
                    let ack = (half.acknowledge() + ack_delta).min(half.sequence());
                    let max = half.maximum().saturating_add(max_delta);
                    half.on_window(ack, max, 0, 0).unwrap();
                }
                Step::Reserve { length } => {
                    match half.reserve(usize::from(length)) {
                        Ok(reserved) => {
                            prop_assert_eq!(u64::from(reserved), u64::from(length));
                            prop_assert_eq!(half.sequence(), before.0 + u64::from(length));
                        }
                        Err(FlowError::WindowOverrun { .. }) => {
                            // Refused reservations must not move anything.
                            prop_assert_eq!(
                                (half.sequence(), half.acknowledge(), half.maximum()),
                                before
                            );
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {other}"),
                    }
                }
            }
            prop_assert!(half.invariant_holds());
        }
    }

    /// Monotonicity: acknowledge and maximum never decrease across any
    /// sequence of accepted windows, and a regressing window is refused.
    #[test]
    fn windows_grow_monotonically(
        grants in proptest::collection::vec((0u64..1024, 0u32..1024), 1..32),
    ) {
        let mut half = FlowHalf::new();
        half.open(0, 0).unwrap();
        half.on_window(0, 1024, 0, 0).unwrap();

        // Keep some sequence headroom so acknowledge has room to advance.
        half.reserve(1024).unwrap();

        let mut last_ack = 0u64;
        let mut last_max = 1024u32;
        for (ack_delta, max_delta) in grants {
            let ack = (last_ack + ack_delta).min(half.sequence());
            let max = last_max.saturating_add(max_delta);
            half.on_window(ack, max, 0, 0).unwrap();
            prop_assert!(half.acknowledge() >= last_ack);
            prop_assert!(half.maximum() >= last_max);
            last_ack = half.acknowledge();
            last_max = half.maximum();
        }

        if last_max > 0 {
            let result = half.on_window(last_ack, last_max - 1, 0, 0);
            prop_assert!(
                matches!(result, Err(FlowError::WindowRegressed { .. })),
                "expected WindowRegressed"
            );
        }
    }

    /// Closing is terminal and idempotent regardless of prior history.
    #[test]
    fn closed_half_ignores_everything(
        maximum in 1u32..4096,
        late_windows in proptest::collection::vec((0u64..4096, 0u32..4096), 0..8),
    ) {
        let mut half = FlowHalf::new();
        half.open(0, 0).unwrap();
        half.on_window(0, maximum, 0, 0).unwrap();
        assert!(half.close(false));

        for (ack, max) in late_windows {
            // Late frames are ignored, never an error, never a reopen.
            prop_assert_eq!(half.on_window(ack, max, 0, 0), Ok(false));
            prop_assert_eq!(half.state(), HalfState::Closed);
        }
        prop_assert!(!half.close(true));
    }
}
