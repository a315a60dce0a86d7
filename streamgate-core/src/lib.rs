//! StreamGate Core — transport-agnostic relay primitives.
//!
//! This library provides the frame vocabulary, per-direction flow-control
//! accounting, shared budget pools, and the wire codec used by the relay
//! layer (`streamgate-relay`) and by every protocol binding built on it.
//!
//! Nothing in this crate performs I/O: frames are in-memory values, windows
//! are pure arithmetic, and the only cross-thread state is the budget pool
//! registry. Transports feed frames in and carry frames out.
//!
//! # Traceability
//! - Implements: REQ-FRM-001 (Frame Vocabulary)
//! - Implements: REQ-FRM-002 (Wire Codec)
//! - Implements: REQ-FLW-001 (Window Accounting)
//! - Implements: REQ-FLW-002 (Half Lifecycle)
//! - Implements: REQ-BGT-001 (Shared Budget Pools)

pub mod budget;
pub mod error;
pub mod flow;
pub mod frame;
pub mod wire;
