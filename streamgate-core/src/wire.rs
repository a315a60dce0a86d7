//! Wire codec: fixed little-endian header plus kind-specific trailer.
//!
//! Implements: REQ-FRM-002 (Wire Codec)
//!
//! Encoding appends into a caller-owned scratch buffer so a worker reuses
//! one allocation across frames; decoding is zero-copy, slicing payload and
//! extension out of the shared input [`Bytes`] with bounds-checked reads.
//! Malformed input is a [`FrameError`], never a panic.
//!
//! Layout:
//!
//! ```text
//! kind:u8 | origin:u64 routed:u64 stream:u64 sequence:u64 acknowledge:u64
//!           maximum:u32 trace:u64 authorization:u64 | kind-specific trailer
//! ```
//!
//! Variable-length ranges (payload, extension) are u32-length-prefixed.

use bytes::Bytes;

use crate::error::FrameError;
use crate::frame::{
    AbortFrame, BeginFrame, DataFrame, EndFrame, Frame, FrameHeader, FlushFrame, ResetFrame,
    WindowFrame,
};

const KIND_BEGIN: u8 = 0x01;
const KIND_DATA: u8 = 0x02;
const KIND_END: u8 = 0x03;
const KIND_ABORT: u8 = 0x04;
const KIND_FLUSH: u8 = 0x05;
const KIND_WINDOW: u8 = 0x06;
const KIND_RESET: u8 = 0x07;

/// Append the encoding of `frame` to `buf`.
///
/// `buf` is the caller's scratch arena; the caller clears or drains it
/// between frames. Returns the number of bytes appended.
pub fn encode_frame(frame: &Frame, buf: &mut Vec<u8>) -> usize {
    let start = buf.len();
    match frame {
        Frame::Begin(f) => {
            buf.push(KIND_BEGIN);
            put_header(&f.header, buf);
            buf.extend_from_slice(&f.affinity.to_le_bytes());
            put_bytes(&f.extension, buf);
        }
        Frame::Data(f) => {
            buf.push(KIND_DATA);
            put_header(&f.header, buf);
            buf.push(f.flags);
            buf.extend_from_slice(&f.budget_id.to_le_bytes());
            buf.extend_from_slice(&f.reserved.to_le_bytes());
            put_bytes(&f.payload, buf);
            put_bytes(&f.extension, buf);
        }
        Frame::End(f) => {
            buf.push(KIND_END);
            put_header(&f.header, buf);
            put_bytes(&f.extension, buf);
        }
        Frame::Abort(f) => {
            buf.push(KIND_ABORT);
            put_header(&f.header, buf);
            put_bytes(&f.extension, buf);
        }
        Frame::Flush(f) => {
            buf.push(KIND_FLUSH);
            put_header(&f.header, buf);
            buf.extend_from_slice(&f.budget_id.to_le_bytes());
            buf.extend_from_slice(&f.reserved.to_le_bytes());
            put_bytes(&f.extension, buf);
        }
        Frame::Window(f) => {
            buf.push(KIND_WINDOW);
            put_header(&f.header, buf);
            buf.extend_from_slice(&f.budget_id.to_le_bytes());
            buf.extend_from_slice(&f.padding.to_le_bytes());
        }
        Frame::Reset(f) => {
            buf.push(KIND_RESET);
            put_header(&f.header, buf);
            put_bytes(&f.extension, buf);
        }
    }
    buf.len() - start
}

/// Decode one frame from the front of `buf`.
///
/// Returns the frame and the number of bytes consumed; payload and
/// extension alias `buf` without copying.
///
/// # Errors
///
/// [`FrameError::Truncated`] when `buf` ends before the frame does,
/// [`FrameError::UnknownKind`] for an unrecognized kind tag.
pub fn decode_frame(buf: &Bytes) -> Result<(Frame, usize), FrameError> {
    let mut reader = Reader { buf, pos: 0 };

    let kind = reader.u8()?;
    let header = reader.header()?;

    let frame = match kind {
        KIND_BEGIN => {
            let affinity = reader.u64()?;
            let extension = reader.bytes()?;
            Frame::Begin(BeginFrame {
                header,
                affinity,
                extension,
            })
        }
        KIND_DATA => {
            let flags = reader.u8()?;
            let budget_id = reader.u64()?;
            let reserved = reader.u32()?;
            let payload = reader.bytes()?;
            let extension = reader.bytes()?;
            Frame::Data(DataFrame {
                header,
                flags,
                budget_id,
                reserved,
                payload,
                extension,
            })
        }
        KIND_END => Frame::End(EndFrame {
            header,
            extension: reader.bytes()?,
        }),
        KIND_ABORT => Frame::Abort(AbortFrame {
            header,
            extension: reader.bytes()?,
        }),
        KIND_FLUSH => {
            let budget_id = reader.u64()?;
            let reserved = reader.u32()?;
            let extension = reader.bytes()?;
            Frame::Flush(FlushFrame {
                header,
                budget_id,
                reserved,
                extension,
            })
        }
        KIND_WINDOW => {
            let budget_id = reader.u64()?;
            let padding = reader.u32()?;
            Frame::Window(WindowFrame {
                header,
                budget_id,
                padding,
            })
        }
        KIND_RESET => Frame::Reset(ResetFrame {
            header,
            extension: reader.bytes()?,
        }),
        other => return Err(FrameError::UnknownKind { kind: other }),
    };

    Ok((frame, reader.pos))
}

fn put_header(header: &FrameHeader, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&header.origin_id.to_le_bytes());
    buf.extend_from_slice(&header.routed_id.to_le_bytes());
    buf.extend_from_slice(&header.stream_id.to_le_bytes());
    buf.extend_from_slice(&header.sequence.to_le_bytes());
    buf.extend_from_slice(&header.acknowledge.to_le_bytes());
    buf.extend_from_slice(&header.maximum.to_le_bytes());
    buf.extend_from_slice(&header.trace_id.to_le_bytes());
    buf.extend_from_slice(&header.authorization.to_le_bytes());
}

fn put_bytes(bytes: &Bytes, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

/// Bounds-checked cursor over the shared input buffer.
struct Reader<'a> {
    buf: &'a Bytes,
    pos: usize,
}

impl Reader<'_> {
    fn need(&self, needed: usize) -> Result<(), FrameError> {
        let available = self.buf.len() - self.pos;
        if available < needed {
            return Err(FrameError::Truncated { needed, available });
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, FrameError> {
        self.need(1)?;
        let value = self.buf[self.pos];
        self.pos += 1;
        Ok(value)
    }

    fn u32(&mut self) -> Result<u32, FrameError> {
        self.need(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(u32::from_le_bytes(raw))
    }

    fn u64(&mut self) -> Result<u64, FrameError> {
        self.need(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(u64::from_le_bytes(raw))
    }

    /// u32-length-prefixed range, sliced zero-copy out of the input.
    fn bytes(&mut self) -> Result<Bytes, FrameError> {
        let len = self.u32()? as usize;
        self.need(len)?;
        let range = self.buf.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(range)
    }

    fn header(&mut self) -> Result<FrameHeader, FrameError> {
        Ok(FrameHeader {
            origin_id: self.u64()?,
            routed_id: self.u64()?,
            stream_id: self.u64()?,
            sequence: self.u64()?,
            acknowledge: self.u64()?,
            maximum: self.u32()?,
            trace_id: self.u64()?,
            authorization: self.u64()?,
        })
    }
}
