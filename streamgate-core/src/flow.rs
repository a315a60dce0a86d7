//! Flow-control half: per-direction credit accounting and lifecycle.
//!
//! Implements: REQ-FLW-001 (Window Accounting)
//! Implements: REQ-FLW-002 (Half Lifecycle)
//!
//! One [`FlowHalf`] tracks one direction of one logical stream. The same
//! type serves both seats at the relay:
//!
//! - **sender seat** — the relay emits Data on this half; [`FlowHalf::open`]
//!   starts it, [`FlowHalf::on_window`] absorbs credit granted by the far
//!   receiver, [`FlowHalf::reserve`] gates every Data frame before it is
//!   emitted.
//! - **receiver seat** — the relay receives Data on this half;
//!   [`FlowHalf::on_window`] records credit the relay itself granted,
//!   [`FlowHalf::on_data`] validates inbound progress against it.
//!
//! Invariant at every observed instant once open:
//!
//! ```text
//! acknowledge <= sequence <= acknowledge + maximum
//! ```
//!
//! Backpressure is structural, not advisory: a reservation that does not fit
//! is refused with [`FlowError::WindowOverrun`] before anything is emitted.
//! There is no retry at this layer.

use tracing::trace;

use crate::error::FlowError;
use crate::frame::BudgetId;

/// Lifecycle of one half.
///
/// ```text
/// Idle → Opening → Open → Closing → Closed
/// ```
///
/// `Closing` is reached by a graceful close with units still unacknowledged;
/// the half completes to `Closed` when a Window catches `acknowledge` up to
/// `sequence`. An abrupt close jumps straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfState {
    /// Created, no Begin exchanged.
    Idle,
    /// Begin sent or received, no Window yet.
    Opening,
    /// Credit flowing; Data may move.
    Open,
    /// Graceful close issued, acknowledgement outstanding.
    Closing,
    /// Terminal; all further frames on this half are ignored.
    Closed,
}

impl HalfState {
    /// Stable lowercase label for logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            HalfState::Idle => "idle",
            HalfState::Opening => "opening",
            HalfState::Open => "open",
            HalfState::Closing => "closing",
            HalfState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for HalfState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credit accounting for one direction of one logical stream.
#[derive(Debug, Clone)]
pub struct FlowHalf {
    state: HalfState,
    sequence: u64,
    acknowledge: u64,
    maximum: u32,
    budget_id: BudgetId,
    padding: u32,
}

impl Default for FlowHalf {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowHalf {
    /// A fresh half in `Idle` with a zero window.
    pub fn new() -> Self {
        Self {
            state: HalfState::Idle,
            sequence: 0,
            acknowledge: 0,
            maximum: 0,
            budget_id: 0,
            padding: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> HalfState {
        self.state
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn acknowledge(&self) -> u64 {
        self.acknowledge
    }

    #[inline]
    pub fn maximum(&self) -> u32 {
        self.maximum
    }

    #[inline]
    pub fn budget_id(&self) -> BudgetId {
        self.budget_id
    }

    #[inline]
    pub fn padding(&self) -> u32 {
        self.padding
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == HalfState::Closed
    }

    /// Window units still usable: `(acknowledge + maximum) - sequence`.
    #[inline]
    pub fn available(&self) -> u64 {
        (self.acknowledge + u64::from(self.maximum)).saturating_sub(self.sequence)
    }

    /// Transition `Idle → Opening` on send/receipt of the half's Begin.
    ///
    /// # Errors
    ///
    /// [`FlowError::AlreadyOpen`] if the half already left `Idle`; opening
    /// is valid exactly once.
    pub fn open(&mut self, initial_maximum: u32, budget_id: BudgetId) -> Result<(), FlowError> {
        if self.state != HalfState::Idle {
            return Err(FlowError::AlreadyOpen {
                state: self.state.as_str(),
            });
        }
        self.maximum = initial_maximum;
        self.budget_id = budget_id;
        self.state = HalfState::Opening;
        Ok(())
    }

    /// Absorb a Window observed on this half.
    ///
    /// Windows only grow: `acknowledge` and `maximum` are monotonically
    /// non-decreasing within a session lifetime, and `acknowledge` can never
    /// pass `sequence`. The first Window completes `Opening → Open`; a
    /// Window arriving after `Closed` is a late network frame and is
    /// silently ignored.
    ///
    /// Returns `true` if this call opened the half.
    ///
    /// # Errors
    ///
    /// [`FlowError::WindowRegressed`], [`FlowError::AcknowledgeOverrun`],
    /// or [`FlowError::NotOpen`] when the Window breaks the credit contract.
    pub fn on_window(
        &mut self,
        acknowledge: u64,
        maximum: u32,
        budget_id: BudgetId,
        padding: u32,
    ) -> Result<bool, FlowError> {
        match self.state {
            HalfState::Closed => {
                trace!(acknowledge, maximum, "window after close ignored");
                return Ok(false);
            }
            HalfState::Idle => {
                return Err(FlowError::NotOpen {
                    state: self.state.as_str(),
                });
            }
            HalfState::Opening | HalfState::Open | HalfState::Closing => {}
        }

        if acknowledge < self.acknowledge || maximum < self.maximum {
            return Err(FlowError::WindowRegressed {
                acknowledge,
                maximum,
                current_acknowledge: self.acknowledge,
                current_maximum: self.maximum,
            });
        }
        if acknowledge > self.sequence {
            return Err(FlowError::AcknowledgeOverrun {
                acknowledge,
                sequence: self.sequence,
            });
        }

        self.acknowledge = acknowledge;
        self.maximum = maximum;
        self.budget_id = budget_id;
        self.padding = padding;

        debug_assert!(self.acknowledge <= self.sequence);

        match self.state {
            HalfState::Opening => {
                self.state = HalfState::Open;
                Ok(true)
            }
            HalfState::Closing if self.acknowledge == self.sequence => {
                self.state = HalfState::Closed;
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// Reserve window units for an outgoing Data frame and advance
    /// `sequence`.
    ///
    /// `reserved = length + padding`; the reservation is refused before
    /// anything is emitted if it would overrun `acknowledge + maximum`.
    /// An overrun is a bug in the sender, not a network condition.
    ///
    /// # Errors
    ///
    /// [`FlowError::NotOpen`] before the first Window,
    /// [`FlowError::WindowOverrun`] when the window cannot cover the
    /// reservation.
    pub fn reserve(&mut self, length: usize) -> Result<u32, FlowError> {
        if self.state != HalfState::Open {
            return Err(FlowError::NotOpen {
                state: self.state.as_str(),
            });
        }
        let reserved = u32::try_from(length)
            .ok()
            .and_then(|len| len.checked_add(self.padding))
            .ok_or(FlowError::WindowOverrun {
                sequence: self.sequence,
                acknowledge: self.acknowledge,
                maximum: self.maximum,
                reserved: u32::MAX,
            })?;

        if self.sequence + u64::from(reserved) > self.acknowledge + u64::from(self.maximum) {
            return Err(FlowError::WindowOverrun {
                sequence: self.sequence,
                acknowledge: self.acknowledge,
                maximum: self.maximum,
                reserved,
            });
        }

        self.sequence += u64::from(reserved);
        debug_assert!(self.sequence <= self.acknowledge + u64::from(self.maximum));
        Ok(reserved)
    }

    /// Validate inbound Data (or Flush) progress on the receiver seat.
    ///
    /// `sequence` is the frame-carried cumulative offer; the new high-water
    /// mark `sequence + reserved` must stay inside the granted window.
    ///
    /// # Errors
    ///
    /// [`FlowError::NotOpen`], [`FlowError::SequenceRegressed`], or
    /// [`FlowError::WindowOverrun`] — the last being the single most
    /// important refusal in the engine: it is what keeps buffering bounded.
    pub fn on_data(&mut self, sequence: u64, reserved: u32) -> Result<(), FlowError> {
        if self.state != HalfState::Open {
            return Err(FlowError::NotOpen {
                state: self.state.as_str(),
            });
        }
        if sequence < self.sequence {
            return Err(FlowError::SequenceRegressed {
                sequence,
                current: self.sequence,
            });
        }

        let advanced = sequence + u64::from(reserved);
        if advanced > self.acknowledge + u64::from(self.maximum) {
            return Err(FlowError::WindowOverrun {
                sequence,
                acknowledge: self.acknowledge,
                maximum: self.maximum,
                reserved,
            });
        }

        self.sequence = advanced;
        Ok(())
    }

    /// Advance `sequence` by `reserved` without payload (Flush relay on the
    /// sender seat).
    ///
    /// # Errors
    ///
    /// Same refusals as [`FlowHalf::on_data`].
    pub fn advance(&mut self, reserved: u32) -> Result<(), FlowError> {
        self.on_data(self.sequence, reserved)
    }

    /// Grant credit on the receiver seat (the relay is about to emit a
    /// Window for this half).
    ///
    /// Same monotonicity rules as [`FlowHalf::on_window`]; split only so
    /// call sites read as "credit granted" vs "credit observed".
    pub fn credit(
        &mut self,
        acknowledge: u64,
        maximum: u32,
        budget_id: BudgetId,
        padding: u32,
    ) -> Result<bool, FlowError> {
        self.on_window(acknowledge, maximum, budget_id, padding)
    }

    /// Close this half.
    ///
    /// Graceful close parks the half in `Closing` until outstanding units
    /// are acknowledged (or moves straight to `Closed` when none are);
    /// abrupt close is immediate. Closing a `Closed` half is a no-op.
    ///
    /// Returns `true` if the state changed, so callers can emit the
    /// End/Abort/Reset frame exactly once per half.
    pub fn close(&mut self, graceful: bool) -> bool {
        match self.state {
            HalfState::Closed => false,
            _ if !graceful => {
                self.state = HalfState::Closed;
                true
            }
            _ if self.acknowledge == self.sequence => {
                self.state = HalfState::Closed;
                true
            }
            _ => {
                self.state = HalfState::Closing;
                true
            }
        }
    }

    /// Receiver-seat End: the sender will offer no more Data.
    ///
    /// Returns `true` if the state changed (idempotent, like
    /// [`FlowHalf::close`]).
    pub fn on_end(&mut self) -> bool {
        if self.state == HalfState::Closed {
            return false;
        }
        self.state = HalfState::Closed;
        true
    }

    /// The credit invariant, checkable at any observed instant.
    pub fn invariant_holds(&self) -> bool {
        self.acknowledge <= self.sequence
            && self.sequence <= self.acknowledge + u64::from(self.maximum)
    }
}
