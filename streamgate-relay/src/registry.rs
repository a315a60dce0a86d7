//! Binding registry: copy-on-write route tables with atomic reload.
//!
//! Implements: REQ-REG-001 (Binding Lifecycle)
//!
//! Worker threads look bindings up on every accepted stream, so the table
//! is a lock-free [`ArcSwap`] snapshot: attach and detach build a new map
//! and swap it in whole, and a reader never observes a partially-updated
//! table. Sessions capture their resolved `Arc<Route>` by value, which is
//! what makes detach safe for streams already in flight.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use streamgate_core::frame::BindingId;

use crate::binding::Binding;

type BindingTable = HashMap<BindingId, Arc<Binding>>;

/// The active set of bindings, shared across workers.
#[derive(Default)]
pub struct BindingRegistry {
    bindings: ArcSwap<BindingTable>,
}

impl std::fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("bindings", &self.bindings.load().len())
            .finish()
    }
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the binding for `binding.id()`.
    ///
    /// Effective for streams accepted after the call; sessions already
    /// resolved keep the routes they captured.
    pub fn attach(&self, binding: Arc<Binding>) {
        let id = binding.id();
        self.bindings.rcu(|table| {
            let mut next = BindingTable::clone(table);
            next.insert(id, Arc::clone(&binding));
            next
        });
        info!(binding_id = id, kind = %binding.kind(), "binding attached");
    }

    /// Remove the binding for `id`.
    ///
    /// Subsequent Begins for `id` are rejected; sessions in flight are not
    /// cancelled. Returns `false` if nothing was attached under `id`.
    pub fn detach(&self, id: BindingId) -> bool {
        let mut removed = false;
        self.bindings.rcu(|table| {
            let mut next = BindingTable::clone(table);
            removed = next.remove(&id).is_some();
            next
        });
        if removed {
            info!(binding_id = id, "binding detached");
        }
        removed
    }

    /// The binding a frame's `routed_id` targets, if attached.
    pub fn lookup(&self, id: BindingId) -> Option<Arc<Binding>> {
        self.bindings.load().get(&id).cloned()
    }

    /// Number of attached bindings.
    pub fn len(&self) -> usize {
        self.bindings.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.load().is_empty()
    }
}
