//! Proxy session: the unit of relay.
//!
//! Implements: REQ-SES-001 (Session Relay)
//! Implements: REQ-SES-002 (Failure Propagation)
//!
//! One session correlates an accepted stream with an initiated stream and
//! relays frames between them across both logical directions, which gives
//! it four flow-control halves:
//!
//! ```text
//!               initial direction ──────────────▶
//!   accepting ── accept-initial ─┐   ┌─ connect-initial ── far side
//!      side   ── accept-reply  ──┘   └─ connect-reply   ──
//!               ◀────────────── reply direction
//! ```
//!
//! `accept-initial` and `connect-reply` are receiver seats (the session
//! grants credit and validates inbound Data); `connect-initial` and
//! `accept-reply` are sender seats (the session reserves before every frame
//! it emits). The two directions close gracefully independently of each
//! other, but failure on any half fans out to all four: a session never
//! half-relays after an Abort, a Reset, an overrun, or budget exhaustion.
//!
//! All processing for one session happens on the worker that owns its
//! engine; nothing here locks or blocks.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use streamgate_core::budget::BudgetRegistry;
use streamgate_core::error::FlowError;
use streamgate_core::flow::{FlowHalf, HalfState};
use streamgate_core::frame::{
    AbortFrame, BeginFrame, BindingId, BudgetId, DataFrame, EndFrame, Frame, FrameHeader,
    FlushFrame, ResetFrame, StreamId, TraceId, WindowFrame, reply_id,
};

use crate::metrics::get_relay_metrics;
use crate::route::Route;
use crate::sink::FrameSink;
use crate::translator::BeginTranslator;
use crate::with::WithParams;

/// Session-wide condition; `Errored` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Relaying.
    Active,
    /// Cleanup ran; every half is closed and late frames are ignored.
    Errored,
}

/// Everything a session is constructed with.
pub(crate) struct SessionContext {
    pub binding_id: BindingId,
    pub route: Arc<Route>,
    pub with_params: Option<WithParams>,
    pub translator: Arc<dyn BeginTranslator>,
    pub accept_sink: Arc<dyn FrameSink>,
    pub connect_sink: Arc<dyn FrameSink>,
    pub budgets: Arc<BudgetRegistry>,
    pub connect_initial_id: StreamId,
}

/// The relay unit pairing an accepted stream with an initiated stream.
pub struct ProxySession {
    binding_id: BindingId,
    route: Arc<Route>,
    with_params: Option<WithParams>,
    translator: Arc<dyn BeginTranslator>,
    accept_sink: Arc<dyn FrameSink>,
    connect_sink: Arc<dyn FrameSink>,
    budgets: Arc<BudgetRegistry>,

    accept_origin_id: u64,
    accept_routed_id: u64,
    accept_initial_id: StreamId,
    accept_reply_id: StreamId,
    connect_initial_id: StreamId,
    connect_reply_id: StreamId,
    authorization: u64,
    affinity: u64,

    accept_initial: FlowHalf,
    connect_initial: FlowHalf,
    connect_reply: FlowHalf,
    accept_reply: FlowHalf,

    /// Budget units claimed on the initial direction, not yet acknowledged.
    claimed_initial: u64,
    /// Budget units claimed on the reply direction, not yet acknowledged.
    claimed_reply: u64,

    state: SessionState,
}

impl ProxySession {
    /// Open a session for a resolved stream: record the accepted Begin and
    /// emit the translated Begin toward the far side.
    pub(crate) fn open(ctx: SessionContext, begin: &BeginFrame) -> Self {
        let header = begin.header;
        let extension = ctx
            .translator
            .connect_extension(begin, ctx.with_params.as_ref());

        let mut session = Self {
            binding_id: ctx.binding_id,
            route: ctx.route,
            with_params: ctx.with_params,
            translator: ctx.translator,
            accept_sink: ctx.accept_sink,
            connect_sink: ctx.connect_sink,
            budgets: ctx.budgets,

            accept_origin_id: header.origin_id,
            accept_routed_id: header.routed_id,
            accept_initial_id: header.stream_id,
            accept_reply_id: reply_id(header.stream_id),
            connect_initial_id: ctx.connect_initial_id,
            connect_reply_id: reply_id(ctx.connect_initial_id),
            authorization: header.authorization,
            affinity: begin.affinity,

            accept_initial: FlowHalf::new(),
            connect_initial: FlowHalf::new(),
            connect_reply: FlowHalf::new(),
            accept_reply: FlowHalf::new(),

            claimed_initial: 0,
            claimed_reply: 0,

            state: SessionState::Active,
        };

        // Fresh halves; opening cannot fail.
        let _ = session.accept_initial.open(0, 0);
        let _ = session.connect_initial.open(0, 0);

        let frame = Frame::Begin(BeginFrame {
            header: session.connect_header(
                session.connect_initial_id,
                &session.connect_initial,
                header.trace_id,
            ),
            affinity: session.affinity,
            extension,
        });
        session.connect_sink.accept(frame);

        debug!(
            binding_id = session.binding_id,
            route_id = session.route.id(),
            accept_stream = session.accept_initial_id,
            connect_stream = session.connect_initial_id,
            "session opened"
        );
        session
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn with_params(&self) -> Option<&WithParams> {
        self.with_params.as_ref()
    }

    #[inline]
    pub fn accept_initial_id(&self) -> StreamId {
        self.accept_initial_id
    }

    #[inline]
    pub fn connect_initial_id(&self) -> StreamId {
        self.connect_initial_id
    }

    /// True once all four halves are closed; the engine then drops the
    /// session.
    pub fn is_finished(&self) -> bool {
        self.accept_initial.is_closed()
            && self.connect_initial.is_closed()
            && self.connect_reply.is_closed()
            && self.accept_reply.is_closed()
    }

    /// Dispatch one inbound frame to the half it belongs to.
    ///
    /// Frames for a half the session does not expect (late frames after
    /// teardown, duplicate Begins) are ignored, never an error: teardown
    /// already ran or will run from the frame that caused it.
    pub(crate) fn on_frame(&mut self, frame: Frame) {
        let stream_id = frame.stream_id();
        match frame {
            // Accepting side, initial direction.
            Frame::Data(f) if stream_id == self.accept_initial_id => self.on_accept_data(f),
            Frame::Flush(f) if stream_id == self.accept_initial_id => self.on_accept_flush(f),
            Frame::End(f) if stream_id == self.accept_initial_id => self.on_accept_end(f),
            Frame::Abort(f) if stream_id == self.accept_initial_id => self.on_accept_abort(f),

            // Accepting side, reply direction (credit and refusal).
            Frame::Window(f) if stream_id == self.accept_reply_id => {
                self.on_accept_reply_window(f)
            }
            Frame::Reset(f) if stream_id == self.accept_reply_id => self.on_accept_reply_reset(f),

            // Far side, initial direction (credit and refusal).
            Frame::Window(f) if stream_id == self.connect_initial_id => self.on_connect_window(f),
            Frame::Reset(f) if stream_id == self.connect_initial_id => self.on_connect_reset(f),

            // Far side, reply direction.
            Frame::Begin(f) if stream_id == self.connect_reply_id => {
                self.on_connect_reply_begin(f)
            }
            Frame::Data(f) if stream_id == self.connect_reply_id => self.on_connect_reply_data(f),
            Frame::Flush(f) if stream_id == self.connect_reply_id => {
                self.on_connect_reply_flush(f)
            }
            Frame::End(f) if stream_id == self.connect_reply_id => self.on_connect_reply_end(f),
            Frame::Abort(f) if stream_id == self.connect_reply_id => {
                self.on_connect_reply_abort(f)
            }

            other => {
                debug!(
                    stream_id,
                    kind = %other.kind(),
                    "frame for unexpected half ignored"
                );
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Initial direction: accepting side → far side
    // ────────────────────────────────────────────────────────────────────

    /// First Window from the far side opens the initial direction end to
    /// end: credit is translated and forwarded to the accepting side.
    fn on_connect_window(&mut self, frame: WindowFrame) {
        let header = frame.header;
        let prior_acknowledge = self.connect_initial.acknowledge();

        match self.connect_initial.on_window(
            header.acknowledge,
            header.maximum,
            frame.budget_id,
            frame.padding,
        ) {
            Ok(_) => {}
            Err(err) => return self.protocol_error("connect-initial window", err, header.trace_id),
        }
        self.release_initial(self.connect_initial.acknowledge() - prior_acknowledge);
        if self.connect_initial.is_closed() {
            // Window completed a draining close; nothing left to forward.
            return;
        }

        // Translate credit toward the accepting side. Forward the larger
        // padding and shrink the maximum by the delta so a sender computing
        // reserved from either field stays inside the far window.
        let (maximum, padding) = translate_window(
            self.connect_initial.maximum(),
            self.connect_initial.padding(),
            self.translator.accept_padding(),
        );
        let acknowledge = self.connect_initial.acknowledge();

        match self
            .accept_initial
            .credit(acknowledge, maximum, frame.budget_id, padding)
        {
            Ok(_) => {}
            Err(err) => return self.protocol_error("accept-initial credit", err, header.trace_id),
        }

        let window = Frame::Window(WindowFrame {
            header: self.accept_header(
                self.accept_initial_id,
                &self.accept_initial,
                header.trace_id,
            ),
            budget_id: frame.budget_id,
            padding,
        });
        self.accept_sink.accept(window);
    }

    /// Data from the accepting side: validate against the granted window,
    /// reserve on the far half, claim budget, forward.
    fn on_accept_data(&mut self, frame: DataFrame) {
        let header = frame.header;

        if let Err(err) = self.accept_initial.on_data(header.sequence, frame.reserved) {
            return self.protocol_error("accept-initial data", err, header.trace_id);
        }

        let length = frame.payload.len();
        let Some(reserved) = u32::try_from(length)
            .ok()
            .and_then(|len| len.checked_add(self.connect_initial.padding()))
        else {
            let err = FlowError::WindowOverrun {
                sequence: self.connect_initial.sequence(),
                acknowledge: self.connect_initial.acknowledge(),
                maximum: self.connect_initial.maximum(),
                reserved: u32::MAX,
            };
            return self.protocol_error("connect-initial reserve", err, header.trace_id);
        };
        let budget_id = self.connect_initial.budget_id();
        if !self.claim_initial(budget_id, reserved) {
            let err = FlowError::BudgetExhausted {
                budget_id,
                requested: reserved,
            };
            return self.protocol_error("connect-initial budget", err, header.trace_id);
        }

        let sequence = self.connect_initial.sequence();
        match self.connect_initial.reserve(length) {
            Ok(granted) => debug_assert_eq!(granted, reserved),
            Err(err) => {
                self.refund_initial(budget_id, reserved);
                return self.protocol_error("connect-initial reserve", err, header.trace_id);
            }
        }

        if let Some(metrics) = get_relay_metrics() {
            metrics.record_relayed("data", length as u64);
        }

        let mut fwd_header =
            self.connect_header(self.connect_initial_id, &self.connect_initial, header.trace_id);
        fwd_header.sequence = sequence;
        let data = Frame::Data(DataFrame {
            header: fwd_header,
            flags: frame.flags,
            budget_id,
            reserved,
            payload: frame.payload,
            extension: frame.extension,
        });
        self.connect_sink.accept(data);
    }

    /// Flush from the accepting side: progress with no payload beyond
    /// `reserved`, forwarded verbatim.
    fn on_accept_flush(&mut self, frame: FlushFrame) {
        let header = frame.header;

        if let Err(err) = self.accept_initial.on_data(header.sequence, frame.reserved) {
            return self.protocol_error("accept-initial flush", err, header.trace_id);
        }
        let sequence = self.connect_initial.sequence();
        if let Err(err) = self.connect_initial.advance(frame.reserved) {
            return self.protocol_error("connect-initial flush", err, header.trace_id);
        }

        if let Some(metrics) = get_relay_metrics() {
            metrics.record_relayed("flush", 0);
        }

        let mut fwd_header =
            self.connect_header(self.connect_initial_id, &self.connect_initial, header.trace_id);
        fwd_header.sequence = sequence;
        let flush = Frame::Flush(FlushFrame {
            header: fwd_header,
            budget_id: self.connect_initial.budget_id(),
            reserved: frame.reserved,
            extension: frame.extension,
        });
        self.connect_sink.accept(flush);
    }

    /// End from the accepting side: close the receiving half and forward
    /// the End once — nothing is buffered here, so in-flight Data has
    /// already drained. The reply direction is unaffected.
    fn on_accept_end(&mut self, frame: EndFrame) {
        if !self.accept_initial.on_end() {
            return;
        }
        if self.connect_initial.close(true) {
            let end = Frame::End(EndFrame {
                header: self.connect_header(
                    self.connect_initial_id,
                    &self.connect_initial,
                    frame.header.trace_id,
                ),
                extension: frame.extension,
            });
            self.connect_sink.accept(end);
        }
    }

    /// Abort from the accepting side: downstream must treat buffered state
    /// as invalid; the whole session fails.
    fn on_accept_abort(&mut self, frame: AbortFrame) {
        self.accept_initial.close(false);
        self.cleanup(frame.header.trace_id, "abort");
    }

    /// Reset from the far side: it refuses further Data on the initial
    /// direction; the whole session fails.
    fn on_connect_reset(&mut self, frame: ResetFrame) {
        self.connect_initial.close(false);
        self.cleanup(frame.header.trace_id, "reset");
    }

    // ────────────────────────────────────────────────────────────────────
    // Reply direction: far side → accepting side
    // ────────────────────────────────────────────────────────────────────

    /// Reply Begin from the far side opens the reply direction toward the
    /// accepting side with a rebuilt extension.
    fn on_connect_reply_begin(&mut self, frame: BeginFrame) {
        if self.connect_reply.state() != HalfState::Idle {
            debug!(stream_id = frame.header.stream_id, "duplicate reply begin ignored");
            return;
        }
        // Fresh halves; opening cannot fail.
        let _ = self.connect_reply.open(0, 0);
        let _ = self.accept_reply.open(0, 0);

        let extension = self.translator.reply_extension(&frame);
        let begin = Frame::Begin(BeginFrame {
            header: self.accept_header(
                self.accept_reply_id,
                &self.accept_reply,
                frame.header.trace_id,
            ),
            affinity: frame.affinity,
            extension,
        });
        self.accept_sink.accept(begin);
    }

    /// Window from the accepting side grants reply credit; translate and
    /// forward it to the far side.
    fn on_accept_reply_window(&mut self, frame: WindowFrame) {
        let header = frame.header;
        let prior_acknowledge = self.accept_reply.acknowledge();

        match self.accept_reply.on_window(
            header.acknowledge,
            header.maximum,
            frame.budget_id,
            frame.padding,
        ) {
            Ok(_) => {}
            Err(err) => return self.protocol_error("accept-reply window", err, header.trace_id),
        }
        self.release_reply(self.accept_reply.acknowledge() - prior_acknowledge);
        if self.accept_reply.is_closed() {
            return;
        }

        let (maximum, padding) = translate_window(
            self.accept_reply.maximum(),
            self.accept_reply.padding(),
            self.translator.connect_padding(),
        );
        let acknowledge = self.accept_reply.acknowledge();

        match self
            .connect_reply
            .credit(acknowledge, maximum, frame.budget_id, padding)
        {
            Ok(_) => {}
            Err(err) => return self.protocol_error("connect-reply credit", err, header.trace_id),
        }

        let window = Frame::Window(WindowFrame {
            header: self.connect_header(
                self.connect_reply_id,
                &self.connect_reply,
                header.trace_id,
            ),
            budget_id: frame.budget_id,
            padding,
        });
        self.connect_sink.accept(window);
    }

    /// Data from the far side on the reply direction.
    fn on_connect_reply_data(&mut self, frame: DataFrame) {
        let header = frame.header;

        if let Err(err) = self.connect_reply.on_data(header.sequence, frame.reserved) {
            return self.protocol_error("connect-reply data", err, header.trace_id);
        }

        let length = frame.payload.len();
        let Some(reserved) = u32::try_from(length)
            .ok()
            .and_then(|len| len.checked_add(self.accept_reply.padding()))
        else {
            let err = FlowError::WindowOverrun {
                sequence: self.accept_reply.sequence(),
                acknowledge: self.accept_reply.acknowledge(),
                maximum: self.accept_reply.maximum(),
                reserved: u32::MAX,
            };
            return self.protocol_error("accept-reply reserve", err, header.trace_id);
        };
        let budget_id = self.accept_reply.budget_id();
        if !self.claim_reply(budget_id, reserved) {
            let err = FlowError::BudgetExhausted {
                budget_id,
                requested: reserved,
            };
            return self.protocol_error("accept-reply budget", err, header.trace_id);
        }

        let sequence = self.accept_reply.sequence();
        match self.accept_reply.reserve(length) {
            Ok(granted) => debug_assert_eq!(granted, reserved),
            Err(err) => {
                self.refund_reply(budget_id, reserved);
                return self.protocol_error("accept-reply reserve", err, header.trace_id);
            }
        }

        if let Some(metrics) = get_relay_metrics() {
            metrics.record_relayed("data", length as u64);
        }

        let mut fwd_header =
            self.accept_header(self.accept_reply_id, &self.accept_reply, header.trace_id);
        fwd_header.sequence = sequence;
        let data = Frame::Data(DataFrame {
            header: fwd_header,
            flags: frame.flags,
            budget_id,
            reserved,
            payload: frame.payload,
            extension: frame.extension,
        });
        self.accept_sink.accept(data);
    }

    /// Flush from the far side on the reply direction.
    fn on_connect_reply_flush(&mut self, frame: FlushFrame) {
        let header = frame.header;

        if let Err(err) = self.connect_reply.on_data(header.sequence, frame.reserved) {
            return self.protocol_error("connect-reply flush", err, header.trace_id);
        }
        let sequence = self.accept_reply.sequence();
        if let Err(err) = self.accept_reply.advance(frame.reserved) {
            return self.protocol_error("accept-reply flush", err, header.trace_id);
        }

        if let Some(metrics) = get_relay_metrics() {
            metrics.record_relayed("flush", 0);
        }

        let mut fwd_header =
            self.accept_header(self.accept_reply_id, &self.accept_reply, header.trace_id);
        fwd_header.sequence = sequence;
        let flush = Frame::Flush(FlushFrame {
            header: fwd_header,
            budget_id: self.accept_reply.budget_id(),
            reserved: frame.reserved,
            extension: frame.extension,
        });
        self.accept_sink.accept(flush);
    }

    /// End of the reply from the far side.
    fn on_connect_reply_end(&mut self, frame: EndFrame) {
        if !self.connect_reply.on_end() {
            return;
        }
        if self.accept_reply.close(true) {
            let end = Frame::End(EndFrame {
                header: self.accept_header(
                    self.accept_reply_id,
                    &self.accept_reply,
                    frame.header.trace_id,
                ),
                extension: frame.extension,
            });
            self.accept_sink.accept(end);
        }
    }

    /// Abort of the reply from the far side.
    fn on_connect_reply_abort(&mut self, frame: AbortFrame) {
        self.connect_reply.close(false);
        self.cleanup(frame.header.trace_id, "abort");
    }

    /// Reset from the accepting side: it refuses further reply Data.
    fn on_accept_reply_reset(&mut self, frame: ResetFrame) {
        self.accept_reply.close(false);
        self.cleanup(frame.header.trace_id, "reset");
    }

    // ────────────────────────────────────────────────────────────────────
    // Failure propagation
    // ────────────────────────────────────────────────────────────────────

    fn protocol_error(&mut self, context: &'static str, error: FlowError, trace_id: TraceId) {
        warn!(
            binding_id = self.binding_id,
            accept_stream = self.accept_initial_id,
            context,
            %error,
            "protocol error, tearing session down"
        );
        self.cleanup(trace_id, "protocol");
    }

    /// Force every half closed, exactly once per half: Reset toward each
    /// Data sender, Abort toward each Data receiver. Safe to invoke any
    /// number of times; every error path converges here.
    fn cleanup(&mut self, trace_id: TraceId, reason: &'static str) {
        if self.state == SessionState::Errored {
            return;
        }
        self.state = SessionState::Errored;

        if let Some(metrics) = get_relay_metrics() {
            metrics.record_errored(reason);
        }

        // Outstanding budget claims will never be acknowledged now.
        self.release_initial(self.claimed_initial);
        self.release_reply(self.claimed_reply);

        if self.accept_initial.close(false) {
            let reset = Frame::Reset(ResetFrame {
                header: self.accept_header(self.accept_initial_id, &self.accept_initial, trace_id),
                extension: Bytes::new(),
            });
            self.accept_sink.accept(reset);
        }

        let reply_begun = self.accept_reply.state() != HalfState::Idle;
        if self.accept_reply.close(false) && reply_begun {
            let abort = Frame::Abort(AbortFrame {
                header: self.accept_header(self.accept_reply_id, &self.accept_reply, trace_id),
                extension: Bytes::new(),
            });
            self.accept_sink.accept(abort);
        }

        if self.connect_initial.close(false) {
            let abort = Frame::Abort(AbortFrame {
                header: self.connect_header(
                    self.connect_initial_id,
                    &self.connect_initial,
                    trace_id,
                ),
                extension: Bytes::new(),
            });
            self.connect_sink.accept(abort);
        }

        let reply_begun = self.connect_reply.state() != HalfState::Idle;
        if self.connect_reply.close(false) && reply_begun {
            let reset = Frame::Reset(ResetFrame {
                header: self.connect_header(self.connect_reply_id, &self.connect_reply, trace_id),
                extension: Bytes::new(),
            });
            self.connect_sink.accept(reset);
        }

        debug!(
            binding_id = self.binding_id,
            accept_stream = self.accept_initial_id,
            reason,
            "session errored"
        );
    }

    // ────────────────────────────────────────────────────────────────────
    // Budget accounting
    // ────────────────────────────────────────────────────────────────────

    /// Claim units from the pool backing `budget_id`; id 0 and pools the
    /// host never registered are unbudgeted.
    fn claim(&self, budget_id: BudgetId, reserved: u32) -> bool {
        if budget_id == 0 {
            return true;
        }
        match self.budgets.get(budget_id) {
            Some(pool) => pool.claim(reserved),
            None => true,
        }
    }

    fn release(&self, budget_id: BudgetId, amount: u64) {
        if budget_id == 0 || amount == 0 {
            return;
        }
        if let Some(pool) = self.budgets.get(budget_id) {
            // Release is u32-sized like claims; acknowledged spans can
            // cover many claims.
            let mut remaining = amount;
            while remaining > 0 {
                let chunk = remaining.min(u64::from(u32::MAX)) as u32;
                pool.release(chunk);
                remaining -= u64::from(chunk);
            }
        }
    }

    fn claim_initial(&mut self, budget_id: BudgetId, reserved: u32) -> bool {
        if !self.claim(budget_id, reserved) {
            return false;
        }
        if budget_id != 0 {
            self.claimed_initial += u64::from(reserved);
        }
        true
    }

    fn refund_initial(&mut self, budget_id: BudgetId, reserved: u32) {
        if budget_id != 0 {
            self.claimed_initial = self.claimed_initial.saturating_sub(u64::from(reserved));
            self.release(budget_id, u64::from(reserved));
        }
    }

    fn release_initial(&mut self, acknowledged: u64) {
        let amount = acknowledged.min(self.claimed_initial);
        self.claimed_initial -= amount;
        self.release(self.connect_initial.budget_id(), amount);
    }

    fn claim_reply(&mut self, budget_id: BudgetId, reserved: u32) -> bool {
        if !self.claim(budget_id, reserved) {
            return false;
        }
        if budget_id != 0 {
            self.claimed_reply += u64::from(reserved);
        }
        true
    }

    fn refund_reply(&mut self, budget_id: BudgetId, reserved: u32) {
        if budget_id != 0 {
            self.claimed_reply = self.claimed_reply.saturating_sub(u64::from(reserved));
            self.release(budget_id, u64::from(reserved));
        }
    }

    fn release_reply(&mut self, acknowledged: u64) {
        let amount = acknowledged.min(self.claimed_reply);
        self.claimed_reply -= amount;
        self.release(self.accept_reply.budget_id(), amount);
    }

    // ────────────────────────────────────────────────────────────────────
    // Frame headers
    // ────────────────────────────────────────────────────────────────────

    /// Header for frames emitted toward the accepting side, reusing the
    /// accepted stream's origin/routed pair.
    fn accept_header(&self, stream_id: StreamId, half: &FlowHalf, trace_id: TraceId) -> FrameHeader {
        FrameHeader {
            origin_id: self.accept_origin_id,
            routed_id: self.accept_routed_id,
            stream_id,
            sequence: half.sequence(),
            acknowledge: half.acknowledge(),
            maximum: half.maximum(),
            trace_id,
            authorization: self.authorization,
        }
    }

    /// Header for frames emitted toward the far side; the resolved route id
    /// is the routed target.
    fn connect_header(
        &self,
        stream_id: StreamId,
        half: &FlowHalf,
        trace_id: TraceId,
    ) -> FrameHeader {
        FrameHeader {
            origin_id: self.binding_id,
            routed_id: self.route.id(),
            stream_id,
            sequence: half.sequence(),
            acknowledge: half.acknowledge(),
            maximum: half.maximum(),
            trace_id,
            authorization: self.authorization,
        }
    }
}

/// Translate receiver-granted credit across the protocol boundary.
///
/// Forward the larger of the granted and local padding, and shrink the
/// maximum by the delta, so a sender computing `reserved` from either field
/// stays inside the granting side's real window.
fn translate_window(maximum: u32, granted_padding: u32, local_padding: u32) -> (u32, u32) {
    let delta = granted_padding.saturating_sub(local_padding);
    (
        maximum.saturating_sub(delta),
        granted_padding.max(local_padding),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: window translation shrinks maximum by the padding delta and
    /// never forwards the smaller padding.
    #[test]
    fn test_translate_window() {
        // Far side charges 4 per frame, accepting protocol charges none.
        assert_eq!(translate_window(64, 4, 0), (60, 4));
        // Equal paddings translate unchanged.
        assert_eq!(translate_window(64, 4, 4), (64, 4));
        // Local padding above granted: charge the larger, keep maximum.
        assert_eq!(translate_window(64, 0, 8), (64, 8));
        // Degenerate window never underflows.
        assert_eq!(translate_window(2, 4, 0), (0, 4));
    }
}
