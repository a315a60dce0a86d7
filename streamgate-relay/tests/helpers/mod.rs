//! Shared fixtures for relay integration tests.

use std::sync::{Arc, Mutex};

use bytes::Bytes;

use streamgate_core::frame::{
    AbortFrame, BeginFrame, DataFrame, EndFrame, Frame, FrameHeader, ResetFrame, StreamId,
    WindowFrame,
};
use streamgate_relay::route::StreamAttributes;
use streamgate_relay::sink::FrameSink;
use streamgate_relay::translator::BeginTranslator;
use streamgate_relay::with::WithParams;

/// Install a test subscriber once so `RUST_LOG` surfaces relay tracing
/// during test runs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Sink capturing every frame for assertions.
#[derive(Debug, Default)]
pub struct TestSink {
    frames: Mutex<Vec<Frame>>,
}

impl TestSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything captured so far.
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    /// Drain captured frames.
    pub fn take(&self) -> Vec<Frame> {
        std::mem::take(&mut *self.frames.lock().unwrap())
    }

    pub fn count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}

impl FrameSink for TestSink {
    fn accept(&self, frame: Frame) {
        self.frames.lock().unwrap().push(frame);
    }
}

/// Translator speaking a line-based text extension (`name=value` per line)
/// so route conditions and with-templates have attributes to work with.
#[derive(Debug, Default)]
pub struct TextTranslator {
    pub accept_padding: u32,
    pub connect_padding: u32,
}

impl TextTranslator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl BeginTranslator for TextTranslator {
    fn parse_attributes(&self, begin: &BeginFrame) -> StreamAttributes {
        let text = std::str::from_utf8(&begin.extension).unwrap_or("");
        StreamAttributes::from_pairs(
            text.lines()
                .filter_map(|line| line.split_once('='))
                .map(|(name, value)| (name.to_string(), value.to_string())),
        )
    }

    fn connect_extension(&self, begin: &BeginFrame, with: Option<&WithParams>) -> Bytes {
        match with {
            Some(params) => {
                let mut text = String::new();
                for (name, value) in params.iter() {
                    text.push_str(name);
                    text.push('=');
                    text.push_str(value);
                    text.push('\n');
                }
                Bytes::from(text)
            }
            None => begin.extension.clone(),
        }
    }

    fn reply_extension(&self, begin: &BeginFrame) -> Bytes {
        begin.extension.clone()
    }

    fn rejection_extension(&self) -> Bytes {
        Bytes::from_static(b"status=404\n")
    }

    fn accept_padding(&self) -> u32 {
        self.accept_padding
    }

    fn connect_padding(&self) -> u32 {
        self.connect_padding
    }
}

pub fn header(stream_id: StreamId) -> FrameHeader {
    FrameHeader {
        origin_id: 0xA0,
        routed_id: 1,
        stream_id,
        sequence: 0,
        acknowledge: 0,
        maximum: 0,
        trace_id: 0x7ACE,
        authorization: 0,
    }
}

pub fn begin(stream_id: StreamId, extension: &'static str) -> BeginFrame {
    BeginFrame {
        header: header(stream_id),
        affinity: 0,
        extension: Bytes::from_static(extension.as_bytes()),
    }
}

pub fn window(stream_id: StreamId, acknowledge: u64, maximum: u32, padding: u32) -> Frame {
    let mut header = header(stream_id);
    header.acknowledge = acknowledge;
    header.maximum = maximum;
    Frame::Window(WindowFrame {
        header,
        budget_id: 0,
        padding,
    })
}

pub fn budget_window(
    stream_id: StreamId,
    acknowledge: u64,
    maximum: u32,
    budget_id: u64,
) -> Frame {
    let mut header = header(stream_id);
    header.acknowledge = acknowledge;
    header.maximum = maximum;
    Frame::Window(WindowFrame {
        header,
        budget_id,
        padding: 0,
    })
}

pub fn data(stream_id: StreamId, sequence: u64, reserved: u32, payload: &'static [u8]) -> Frame {
    let mut header = header(stream_id);
    header.sequence = sequence;
    Frame::Data(DataFrame {
        header,
        flags: streamgate_core::frame::flags::COMPLETE,
        budget_id: 0,
        reserved,
        payload: Bytes::from_static(payload),
        extension: Bytes::new(),
    })
}

pub fn flush(stream_id: StreamId, sequence: u64, reserved: u32) -> Frame {
    let mut header = header(stream_id);
    header.sequence = sequence;
    Frame::Flush(streamgate_core::frame::FlushFrame {
        header,
        budget_id: 0,
        reserved,
        extension: Bytes::from_static(b"marker"),
    })
}

pub fn end(stream_id: StreamId, sequence: u64) -> Frame {
    let mut header = header(stream_id);
    header.sequence = sequence;
    Frame::End(EndFrame {
        header,
        extension: Bytes::new(),
    })
}

pub fn abort(stream_id: StreamId) -> Frame {
    Frame::Abort(AbortFrame {
        header: header(stream_id),
        extension: Bytes::new(),
    })
}

pub fn reset(stream_id: StreamId) -> Frame {
    Frame::Reset(ResetFrame {
        header: header(stream_id),
        extension: Bytes::new(),
    })
}

/// Kinds only, for compact emission assertions.
pub fn kinds(frames: &[Frame]) -> Vec<&'static str> {
    frames.iter().map(|frame| frame.kind().as_str()).collect()
}
