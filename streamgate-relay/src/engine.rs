//! Relay engine: per-worker frame dispatch and session ownership.
//!
//! Implements: REQ-SES-001 (Session Relay), REQ-REG-001 (Binding Lifecycle)
//!
//! One engine runs on one worker thread for its whole life; every frame for
//! a session — both halves of both directions — goes through the engine
//! that owns it, so sessions need no interior locking. Hosts pick the
//! worker for a newly accepted stream (conventionally by hashing the
//! accepting stream id) and must keep feeding that session's frames to the
//! same engine. The only cross-worker state is the binding registry
//! (copy-on-write snapshots) and the budget pools (atomics).
//!
//! Accepting a stream and relaying frames are separate entry points:
//! [`RelayEngine::accept_stream`] resolves a route and constructs the
//! session (or emits exactly one rejection Reset), and
//! [`RelayEngine::on_frame`] routes every subsequent frame by stream id.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use streamgate_core::budget::BudgetRegistry;
use streamgate_core::frame::{
    BeginFrame, Frame, FrameHeader, ResetFrame, StreamId, is_initiating, pair_key,
};

use crate::error::RelayError;
use crate::metrics::get_relay_metrics;
use crate::registry::BindingRegistry;
use crate::session::{ProxySession, SessionContext, SessionState};
use crate::sink::FrameSink;

/// Engine-initiated stream ids live in their own high range so they can
/// never collide with ids minted by accepting transports.
const CONNECT_ID_BASE: u64 = 1 << 56;

/// Per-worker relay dispatcher.
pub struct RelayEngine {
    registry: Arc<BindingRegistry>,
    budgets: Arc<BudgetRegistry>,
    /// Sessions keyed by the accepted pair key.
    sessions: HashMap<StreamId, ProxySession>,
    /// Connect-side pair key → accepted pair key.
    aliases: HashMap<StreamId, StreamId>,
    next_initial_id: u64,
}

impl RelayEngine {
    pub fn new(registry: Arc<BindingRegistry>, budgets: Arc<BudgetRegistry>) -> Self {
        Self {
            registry,
            budgets,
            sessions: HashMap::new(),
            aliases: HashMap::new(),
            next_initial_id: CONNECT_ID_BASE | 1,
        }
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    pub fn budgets(&self) -> &Arc<BudgetRegistry> {
        &self.budgets
    }

    /// Sessions currently owned by this engine.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Accept a Begin from a transport: resolve binding and route, then
    /// construct the proxy session that relays between `accept_sink`
    /// (toward the accepting side) and `connect_sink` (toward the far
    /// side).
    ///
    /// On any rejection exactly one Reset is emitted toward the accepting
    /// side — carrying the binding's protocol-appropriate rejection
    /// extension when a translator is available — and no session exists.
    ///
    /// # Errors
    ///
    /// [`RelayError::NotInitiating`], [`RelayError::DuplicateStream`],
    /// [`RelayError::UnknownBinding`], [`RelayError::NoRoute`], or
    /// [`RelayError::With`] for an unresolvable with-template.
    pub fn accept_stream(
        &mut self,
        begin: BeginFrame,
        accept_sink: Arc<dyn FrameSink>,
        connect_sink: Arc<dyn FrameSink>,
    ) -> Result<StreamId, RelayError> {
        let header = begin.header;
        let stream_id = header.stream_id;

        if !is_initiating(stream_id) {
            return Err(RelayError::NotInitiating { stream_id });
        }
        if self.sessions.contains_key(&pair_key(stream_id)) {
            return Err(RelayError::DuplicateStream { stream_id });
        }

        let Some(binding) = self.registry.lookup(header.routed_id) else {
            warn!(routed_id = header.routed_id, "begin for unattached binding");
            self.reject(&accept_sink, &header, bytes::Bytes::new(), "no_binding");
            return Err(RelayError::UnknownBinding {
                routed_id: header.routed_id,
            });
        };

        let translator = Arc::clone(binding.translator());
        let attributes = translator.parse_attributes(&begin);

        let Some(route) = binding.resolve(header.authorization, &attributes) else {
            self.reject(
                &accept_sink,
                &header,
                translator.rejection_extension(),
                "no_route",
            );
            return Err(RelayError::NoRoute {
                binding_id: binding.id(),
            });
        };

        let with_params = match route.with() {
            Some(template) => match template.resolve(&attributes) {
                Ok(params) => Some(params),
                Err(err) => {
                    warn!(
                        binding_id = binding.id(),
                        route_id = route.id(),
                        error = %err,
                        "with-template unresolvable, rejecting stream"
                    );
                    self.reject(
                        &accept_sink,
                        &header,
                        translator.rejection_extension(),
                        "with",
                    );
                    return Err(err.into());
                }
            },
            None => None,
        };

        let connect_initial_id = self.supply_initial_id();
        let session = ProxySession::open(
            SessionContext {
                binding_id: binding.id(),
                route,
                with_params,
                translator,
                accept_sink,
                connect_sink,
                budgets: Arc::clone(&self.budgets),
                connect_initial_id,
            },
            &begin,
        );

        self.aliases
            .insert(pair_key(connect_initial_id), pair_key(stream_id));
        self.sessions.insert(pair_key(stream_id), session);

        if let Some(metrics) = get_relay_metrics() {
            metrics.sessions_opened.add(1, &[]);
        }
        Ok(stream_id)
    }

    /// Route one inbound frame to the session owning its half.
    ///
    /// Returns `false` when no session owns the half — a late frame after
    /// teardown, silently ignored.
    pub fn on_frame(&mut self, frame: Frame) -> bool {
        let key = pair_key(frame.stream_id());
        let session_key = if self.sessions.contains_key(&key) {
            key
        } else if let Some(owner) = self.aliases.get(&key) {
            *owner
        } else {
            trace!(
                stream_id = frame.stream_id(),
                kind = %frame.kind(),
                "frame without a session ignored"
            );
            return false;
        };

        let Some(session) = self.sessions.get_mut(&session_key) else {
            return false;
        };
        session.on_frame(frame);

        if session.is_finished() {
            self.remove(session_key);
        }
        true
    }

    fn remove(&mut self, session_key: StreamId) {
        if let Some(session) = self.sessions.remove(&session_key) {
            self.aliases
                .remove(&pair_key(session.connect_initial_id()));
            if let Some(metrics) = get_relay_metrics() {
                metrics.sessions_closed.add(1, &[]);
            }
            debug!(
                accept_stream = session.accept_initial_id(),
                errored = session.state() == SessionState::Errored,
                "session removed"
            );
        }
    }

    fn supply_initial_id(&mut self) -> StreamId {
        let id = self.next_initial_id;
        self.next_initial_id += 2;
        id
    }

    /// Exactly one rejection frame, zero Data/Window frames.
    fn reject(
        &self,
        sink: &Arc<dyn FrameSink>,
        header: &FrameHeader,
        extension: bytes::Bytes,
        reason: &'static str,
    ) {
        if let Some(metrics) = get_relay_metrics() {
            metrics.record_rejected(reason);
        }
        sink.accept(Frame::Reset(ResetFrame {
            header: FrameHeader {
                origin_id: header.origin_id,
                routed_id: header.routed_id,
                stream_id: header.stream_id,
                sequence: header.sequence,
                acknowledge: header.acknowledge,
                maximum: 0,
                trace_id: header.trace_id,
                authorization: header.authorization,
            },
            extension,
        }));
    }
}

impl std::fmt::Debug for RelayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayEngine")
            .field("sessions", &self.sessions.len())
            .field("bindings", &self.registry.len())
            .finish()
    }
}
