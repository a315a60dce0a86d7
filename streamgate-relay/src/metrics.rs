//! Relay metrics.
//!
//! Implements: REQ-OBS-001 (Observability)
//!
//! Counters only, recorded at session state-machine transitions. Exporters
//! are the host's concern; with no meter provider installed the
//! `opentelemetry` API is a no-op and recording costs a few branches.

use std::sync::OnceLock;

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Meter};

/// Metrics recorded by the relay engine and its sessions.
#[derive(Clone)]
pub struct RelayMetrics {
    /// Sessions opened (route resolved, far side Begin emitted).
    pub sessions_opened: Counter<u64>,
    /// Streams rejected before a session existed, by reason.
    pub sessions_rejected: Counter<u64>,
    /// Sessions torn down by the errored cleanup, by reason.
    pub sessions_errored: Counter<u64>,
    /// Sessions that reached all-halves-closed and were removed.
    pub sessions_closed: Counter<u64>,
    /// Frames forwarded across sessions, by kind.
    pub frames_relayed: Counter<u64>,
    /// Payload bytes forwarded across sessions.
    pub bytes_relayed: Counter<u64>,
}

impl RelayMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            sessions_opened: meter
                .u64_counter("relay_sessions_opened_total")
                .with_description("Sessions opened after route resolution")
                .build(),
            sessions_rejected: meter
                .u64_counter("relay_sessions_rejected_total")
                .with_description("Accepted streams rejected before a session existed")
                .build(),
            sessions_errored: meter
                .u64_counter("relay_sessions_errored_total")
                .with_description("Sessions torn down by errored cleanup")
                .build(),
            sessions_closed: meter
                .u64_counter("relay_sessions_closed_total")
                .with_description("Sessions removed with all four halves closed")
                .build(),
            frames_relayed: meter
                .u64_counter("relay_frames_total")
                .with_description("Frames forwarded between session sides")
                .build(),
            bytes_relayed: meter
                .u64_counter("relay_bytes_total")
                .with_description("Payload bytes forwarded between session sides")
                .build(),
        }
    }

    pub fn record_rejected(&self, reason: &'static str) {
        self.sessions_rejected
            .add(1, &[KeyValue::new("reason", reason)]);
    }

    pub fn record_errored(&self, reason: &'static str) {
        self.sessions_errored
            .add(1, &[KeyValue::new("reason", reason)]);
    }

    pub fn record_relayed(&self, kind: &'static str, bytes: u64) {
        self.frames_relayed.add(1, &[KeyValue::new("kind", kind)]);
        if bytes > 0 {
            self.bytes_relayed.add(bytes, &[]);
        }
    }
}

static RELAY_METRICS: OnceLock<RelayMetrics> = OnceLock::new();

/// Install the global relay metrics once; later calls return the first
/// instance.
pub fn init_relay_metrics(meter: &Meter) -> &'static RelayMetrics {
    RELAY_METRICS.get_or_init(|| RelayMetrics::new(meter))
}

/// The installed metrics, if any. Recording sites treat `None` as "not
/// enabled" and skip.
pub fn get_relay_metrics() -> Option<&'static RelayMetrics> {
    RELAY_METRICS.get()
}
