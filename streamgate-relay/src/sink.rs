//! Outbound frame capability.
//!
//! A [`FrameSink`] is "the next component downstream" for one side of a
//! session: a transport writer, another session, or a test harness. Sinks
//! are handed to the session at construction and never swapped.

use streamgate_core::frame::Frame;

/// Downstream capability accepting relay frames.
///
/// Implementations must not block: the relay performs pure in-memory
/// transitions and real I/O belongs to the transport layer behind the sink.
pub trait FrameSink: Send + Sync {
    /// Accept one frame for downstream delivery.
    fn accept(&self, frame: Frame);
}

/// Sink that drops every frame.
///
/// Useful for hosts wiring up one-directional bindings and for tests that
/// only observe one side.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn accept(&self, _frame: Frame) {}
}
