//! Error handling for the relay layer.
//!
//! Implements: REQ-SES-002 (Failure Propagation)
//!
//! Relay errors split into rejection conditions (no binding, no route,
//! unresolvable with-params — answered with exactly one Reset toward the
//! accepting side) and protocol violations (surfaced from
//! [`streamgate_core::error::FlowError`] — answered by tearing the whole
//! session down). Neither family panics; network-origin conditions are
//! never fatal to the process.

use thiserror::Error;

use streamgate_core::error::FlowError;
use streamgate_core::frame::{BindingId, StreamId};

use crate::with::TemplateError;

/// Errors surfaced by the relay engine and its sessions.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The accepted Begin named a binding that is not attached.
    #[error("no binding attached for routed id {routed_id}")]
    UnknownBinding { routed_id: BindingId },

    /// No configured route was both authorized and matching.
    #[error("no route matched on binding {binding_id}")]
    NoRoute { binding_id: BindingId },

    /// A stream was accepted on a non-initiating id.
    #[error("stream id {stream_id} is not an initiating half")]
    NotInitiating { stream_id: StreamId },

    /// A Begin was accepted for a stream id already owned by a session.
    #[error("stream id {stream_id} already has a session")]
    DuplicateStream { stream_id: StreamId },

    /// The matched route's with-template could not be resolved for this
    /// stream; treated as route-not-found rather than forwarding a
    /// half-expanded value.
    #[error(transparent)]
    With(#[from] TemplateError),

    /// A flow-control violation on one of the session's halves.
    #[error(transparent)]
    Flow(#[from] FlowError),
}
