//! Frame model: the seven message kinds every relay component builds on.
//!
//! Implements: REQ-FRM-001 (Frame Vocabulary)
//!
//! A logical stream is a pair of directional halves. The initiating half
//! carries `Begin`/`Data`/`End`/`Abort`/`Flush` from sender to receiver;
//! `Window` and `Reset` travel the opposite way on the same half. Frames are
//! immutable once constructed; payload and extension bytes are shared
//! zero-copy via [`bytes::Bytes`].
//!
//! The `extension` field is opaque to the relay: only the binding that
//! produced it may interpret it, the relay forwards or replaces it wholesale.

use bytes::Bytes;

/// Identifies one half of one logical stream.
pub type StreamId = u64;

/// Identifies a binding (the `routed` target of a frame).
pub type BindingId = u64;

/// Correlates frames across components for diagnostics.
pub type TraceId = u64;

/// Identifies a shared credit pool; `0` means unbudgeted.
pub type BudgetId = u64;

/// Fragmentation flags carried by `Data` frames.
///
/// A payload split across multiple frames is marked `INIT` on the first
/// fragment, `FIN` on the last, both on a complete (unfragmented) payload,
/// and neither on a continuation.
pub mod flags {
    /// Final fragment of a payload.
    pub const FIN: u8 = 0x01;
    /// First fragment of a payload.
    pub const INIT: u8 = 0x02;
    /// Complete payload in a single frame.
    pub const COMPLETE: u8 = INIT | FIN;

    /// True if `flags` marks the first fragment.
    #[inline]
    pub fn is_init(flags: u8) -> bool {
        flags & INIT != 0
    }

    /// True if `flags` marks the final fragment.
    #[inline]
    pub fn is_fin(flags: u8) -> bool {
        flags & FIN != 0
    }

    /// True if `flags` marks a complete, unfragmented payload.
    #[inline]
    pub fn is_complete(flags: u8) -> bool {
        flags & COMPLETE == COMPLETE
    }

    /// True if `flags` marks a middle fragment.
    #[inline]
    pub fn is_continuation(flags: u8) -> bool {
        flags & COMPLETE == 0
    }
}

/// Initiating halves carry an odd stream id; the paired reply half flips
/// the low bit.
#[inline]
pub fn reply_id(initial_id: StreamId) -> StreamId {
    initial_id ^ 1
}

/// True if `stream_id` names an initiating half.
#[inline]
pub fn is_initiating(stream_id: StreamId) -> bool {
    stream_id & 1 == 1
}

/// Canonical key shared by both halves of one id pair.
#[inline]
pub fn pair_key(stream_id: StreamId) -> StreamId {
    stream_id & !1
}

/// Header fields common to every frame kind.
///
/// `sequence` is the cumulative units offered so far on this half;
/// `acknowledge` is the cumulative units the other end has consumed;
/// `maximum` is the window the sender may use beyond `acknowledge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Id of the protocol/namespace sending the frame.
    pub origin_id: u64,
    /// Id of the target binding.
    pub routed_id: BindingId,
    /// The half this frame belongs to.
    pub stream_id: StreamId,
    /// Cumulative units offered so far on this half.
    pub sequence: u64,
    /// Cumulative units the other end has consumed.
    pub acknowledge: u64,
    /// Window beyond `acknowledge` the sender may currently use.
    pub maximum: u32,
    /// Diagnostic correlation id, propagated unchanged.
    pub trace_id: TraceId,
    /// Authorization token carried by the accepted stream.
    pub authorization: u64,
}

/// Opens a half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginFrame {
    pub header: FrameHeader,
    /// Transport affinity hint (e.g. worker selection), forwarded unchanged.
    pub affinity: u64,
    /// Protocol-owned opaque trailer.
    pub extension: Bytes,
}

/// Carries payload; advances `sequence` by `reserved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    pub header: FrameHeader,
    /// Fragment position, see [`flags`].
    pub flags: u8,
    /// Credit pool the reserved units were claimed from; `0` = unbudgeted.
    pub budget_id: BudgetId,
    /// Window units consumed by this frame: payload length plus padding.
    pub reserved: u32,
    pub payload: Bytes,
    pub extension: Bytes,
}

/// Graceful half-close; no more Data will follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndFrame {
    pub header: FrameHeader,
    pub extension: Bytes,
}

/// Ungraceful half-close; buffered downstream state is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortFrame {
    pub header: FrameHeader,
    pub extension: Bytes,
}

/// Progress signal with no payload advance beyond `reserved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushFrame {
    pub header: FrameHeader,
    pub budget_id: BudgetId,
    pub reserved: u32,
    pub extension: Bytes,
}

/// Receiver-granted credit; travels opposite to Data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFrame {
    pub header: FrameHeader,
    pub budget_id: BudgetId,
    /// Framing overhead the sender must add to `reserved` beyond payload
    /// length.
    pub padding: u32,
}

/// Receiver refusal; ends the half abnormally, travels opposite to Data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetFrame {
    pub header: FrameHeader,
    pub extension: Bytes,
}

/// The relay frame vocabulary as a tagged union.
///
/// Dispatch is exhaustive pattern matching; adding a kind is a compile
/// error at every dispatch site rather than a silently ignored type id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Begin(BeginFrame),
    Data(DataFrame),
    End(EndFrame),
    Abort(AbortFrame),
    Flush(FlushFrame),
    Window(WindowFrame),
    Reset(ResetFrame),
}

/// Discriminant of a [`Frame`], for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Begin,
    Data,
    End,
    Abort,
    Flush,
    Window,
    Reset,
}

impl FrameKind {
    /// Stable lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Begin => "begin",
            FrameKind::Data => "data",
            FrameKind::End => "end",
            FrameKind::Abort => "abort",
            FrameKind::Flush => "flush",
            FrameKind::Window => "window",
            FrameKind::Reset => "reset",
        }
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Frame {
    /// The shared header of any frame kind.
    pub fn header(&self) -> &FrameHeader {
        match self {
            Frame::Begin(f) => &f.header,
            Frame::Data(f) => &f.header,
            Frame::End(f) => &f.header,
            Frame::Abort(f) => &f.header,
            Frame::Flush(f) => &f.header,
            Frame::Window(f) => &f.header,
            Frame::Reset(f) => &f.header,
        }
    }

    /// The half this frame belongs to.
    #[inline]
    pub fn stream_id(&self) -> StreamId {
        self.header().stream_id
    }

    #[inline]
    pub fn trace_id(&self) -> TraceId {
        self.header().trace_id
    }

    /// Discriminant for logging and metrics.
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Begin(_) => FrameKind::Begin,
            Frame::Data(_) => FrameKind::Data,
            Frame::End(_) => FrameKind::End,
            Frame::Abort(_) => FrameKind::Abort,
            Frame::Flush(_) => FrameKind::Flush,
            Frame::Window(_) => FrameKind::Window,
            Frame::Reset(_) => FrameKind::Reset,
        }
    }

    /// True for kinds that travel in the Data direction
    /// (sender toward receiver).
    pub fn is_toward_receiver(&self) -> bool {
        matches!(
            self,
            Frame::Begin(_) | Frame::Data(_) | Frame::End(_) | Frame::Abort(_) | Frame::Flush(_)
        )
    }

    /// True for kinds that travel opposite to Data
    /// (receiver toward sender).
    pub fn is_toward_sender(&self) -> bool {
        !self.is_toward_receiver()
    }
}
