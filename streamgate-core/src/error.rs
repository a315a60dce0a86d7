//! Error taxonomies for the core primitives.
//!
//! Implements: REQ-FRM-002 (Wire Codec), REQ-FLW-001 (Window Accounting)
//!
//! Frame decode problems and flow-control violations are distinct failure
//! families: the former come from the wire and are always survivable, the
//! latter signal a peer (or a bug) breaking the credit contract and converge
//! on session teardown. Neither panics.

use thiserror::Error;

use crate::frame::BudgetId;

/// Decode failures for inbound frame bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer ended before the frame did.
    #[error("truncated frame: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the decoder needed next.
        needed: usize,
        /// Bytes remaining in the buffer.
        available: usize,
    },

    /// The kind tag does not name any frame kind.
    #[error("unknown frame kind 0x{kind:02x}")]
    UnknownKind {
        /// The offending tag byte.
        kind: u8,
    },
}

/// Flow-control contract violations on one half.
///
/// Every variant except [`FlowError::BudgetExhausted`] indicates a protocol
/// error by the sender: the relay responds by resetting the offending half
/// and aborting its pair, never by truncating or buffering unbounded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// `open` was called on a half that already left `Idle`.
    #[error("half already open (state {state})")]
    AlreadyOpen {
        /// Lowercase state label at the time of the call.
        state: &'static str,
    },

    /// Progress was attempted on a half that is not open.
    #[error("half not open (state {state})")]
    NotOpen { state: &'static str },

    /// A reservation would advance `sequence` beyond
    /// `acknowledge + maximum`.
    #[error(
        "window overrun: sequence {sequence} + reserved {reserved} exceeds \
         acknowledge {acknowledge} + maximum {maximum}"
    )]
    WindowOverrun {
        sequence: u64,
        acknowledge: u64,
        maximum: u32,
        reserved: u32,
    },

    /// A Window tried to shrink the window or regress the acknowledge.
    ///
    /// Windows only grow within a session lifetime; a shrink would risk a
    /// not-yet-observed overrun.
    #[error(
        "window regressed: acknowledge {acknowledge}/maximum {maximum} \
         after acknowledge {current_acknowledge}/maximum {current_maximum}"
    )]
    WindowRegressed {
        acknowledge: u64,
        maximum: u32,
        current_acknowledge: u64,
        current_maximum: u32,
    },

    /// A Window acknowledged more than was ever sent.
    #[error("acknowledge {acknowledge} ahead of sequence {sequence}")]
    AcknowledgeOverrun { acknowledge: u64, sequence: u64 },

    /// A Data frame carried a `sequence` lower than already observed.
    #[error("sequence regressed: {sequence} after {current}")]
    SequenceRegressed { sequence: u64, current: u64 },

    /// The shared credit pool could not cover a reservation.
    ///
    /// Treated like a window violation: the half that cannot be served is
    /// reset and its pair aborted.
    #[error("budget {budget_id} exhausted claiming {requested} units")]
    BudgetExhausted {
        budget_id: BudgetId,
        requested: u32,
    },
}
