//! StreamGate Relay — the shared stream-relay engine under every binding.
//!
//! Protocol bindings (HTTP↔Kafka, HTTP↔filesystem, TCP, AMQP, …) differ in
//! wire formats and extensions, but they all open, relay, window, and tear
//! down pairs of flow-controlled streams the same way. This library
//! implements that mechanism once:
//!
//! - **Routes** (`route`, `with`, `binding`, `config`) — ordered conditions
//!   plus an authorization guard select a route first-match-wins; the
//!   matched route's with-template parametrizes the far-side Begin.
//! - **Registry** (`registry`) — copy-on-write attach/detach of bindings;
//!   in-flight sessions keep the routes they resolved.
//! - **Sessions** (`session`, `translator`, `sink`) — the four-half proxy
//!   state machine, generic over a per-binding [`translator::BeginTranslator`].
//! - **Engine** (`engine`) — per-worker dispatch of inbound frames by
//!   stream id.
//!
//! # Traceability
//! - Implements: REQ-RTE-001 (Route Resolution)
//! - Implements: REQ-RTE-002 (With Resolution)
//! - Implements: REQ-SES-001 (Session Relay)
//! - Implements: REQ-SES-002 (Failure Propagation)
//! - Implements: REQ-REG-001 (Binding Lifecycle)
//! - Implements: REQ-CFG-001 (Configuration Surface)
//! - Implements: REQ-OBS-001 (Observability)

pub mod binding;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod route;
pub mod session;
pub mod sink;
pub mod translator;
pub mod with;
