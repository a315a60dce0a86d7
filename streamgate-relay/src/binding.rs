//! Bindings: the unit of attach/detach and route resolution.
//!
//! Implements: REQ-RTE-001 (Route Resolution), REQ-REG-001 (Binding Lifecycle)

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use streamgate_core::frame::BindingId;

use crate::route::{Route, StreamAttributes};
use crate::translator::BeginTranslator;

/// Role a binding plays for the streams it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    /// Accepts streams from a transport.
    Server,
    /// Initiates streams toward a transport.
    Client,
    /// Accepts on one side and initiates on the other.
    Proxy,
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::Server => f.write_str("server"),
            BindingKind::Client => f.write_str("client"),
            BindingKind::Proxy => f.write_str("proxy"),
        }
    }
}

/// One attached binding: identity, kind, protocol options, ordered routes,
/// and the translation strategy its sessions use.
///
/// Immutable once attached; a configuration reload replaces the whole
/// value. Options are protocol-owned and opaque to the relay.
pub struct Binding {
    id: BindingId,
    kind: BindingKind,
    options: serde_json::Value,
    routes: Vec<Arc<Route>>,
    translator: Arc<dyn BeginTranslator>,
}

impl Binding {
    pub fn new(
        id: BindingId,
        kind: BindingKind,
        options: serde_json::Value,
        routes: Vec<Arc<Route>>,
        translator: Arc<dyn BeginTranslator>,
    ) -> Self {
        Self {
            id,
            kind,
            options,
            routes,
            translator,
        }
    }

    #[inline]
    pub fn id(&self) -> BindingId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Protocol-owned options, uninterpreted by the relay.
    pub fn options(&self) -> &serde_json::Value {
        &self.options
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn translator(&self) -> &Arc<dyn BeginTranslator> {
        &self.translator
    }

    /// First route that is both authorized and matching, in declared order.
    ///
    /// First match wins — resolution short-circuits, it never scores. A
    /// route with no conditions is the catch-all.
    pub fn resolve(
        &self,
        authorization: u64,
        attributes: &StreamAttributes,
    ) -> Option<Arc<Route>> {
        let resolved = self
            .routes
            .iter()
            .find(|route| route.authorized(authorization) && route.matches(attributes))
            .cloned();
        if resolved.is_none() {
            debug!(binding_id = self.id, "no route matched");
        }
        resolved
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("routes", &self.routes.len())
            .finish()
    }
}
