//! Begin translation: the per-binding strategy behind the generic session.
//!
//! Implements: REQ-SES-001 (Session Relay)
//!
//! The session state machine is written once; everything protocol-specific
//! about opening streams is concentrated here. A binding supplies one
//! [`BeginTranslator`] that parses route-relevant attributes out of an
//! accepted Begin, rebuilds extensions for the far side and for replies,
//! synthesizes the protocol's rejection, and declares the per-frame framing
//! overhead of each side. The relay never looks inside an extension; it
//! forwards or replaces it wholesale with whatever the translator returns.

use bytes::Bytes;

use streamgate_core::frame::BeginFrame;

use crate::route::StreamAttributes;
use crate::with::WithParams;

/// Per-binding translation strategy consumed by the proxy session.
pub trait BeginTranslator: Send + Sync {
    /// Parse the attributes route conditions and with-templates consume.
    fn parse_attributes(&self, begin: &BeginFrame) -> StreamAttributes;

    /// Extension for the far-side Begin, built from the accepted Begin and
    /// the resolved with-parameters.
    fn connect_extension(&self, begin: &BeginFrame, with: Option<&WithParams>) -> Bytes;

    /// Extension for the accepting-side reply Begin, rebuilt from the far
    /// side's reply Begin.
    fn reply_extension(&self, begin: &BeginFrame) -> Bytes;

    /// Protocol-appropriate rejection carried by the Reset answering a
    /// stream no route accepts (e.g. a "not found" status block).
    fn rejection_extension(&self) -> Bytes;

    /// Per-frame framing overhead of the accepting-side protocol.
    fn accept_padding(&self) -> u32 {
        0
    }

    /// Per-frame framing overhead of the far-side protocol.
    fn connect_padding(&self) -> u32 {
        0
    }
}

/// Translator for bindings that relay extensions untouched.
///
/// Attributes come back empty, so only catch-all routes can match — the
/// right behavior for an opaque passthrough.
#[derive(Debug, Clone, Default)]
pub struct OpaqueTranslator {
    rejection: Bytes,
}

impl OpaqueTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `rejection` as the Reset extension for refused streams.
    pub fn with_rejection(rejection: Bytes) -> Self {
        Self { rejection }
    }
}

impl BeginTranslator for OpaqueTranslator {
    fn parse_attributes(&self, _begin: &BeginFrame) -> StreamAttributes {
        StreamAttributes::new()
    }

    fn connect_extension(&self, begin: &BeginFrame, _with: Option<&WithParams>) -> Bytes {
        begin.extension.clone()
    }

    fn reply_extension(&self, begin: &BeginFrame) -> Bytes {
        begin.extension.clone()
    }

    fn rejection_extension(&self) -> Bytes {
        self.rejection.clone()
    }
}
