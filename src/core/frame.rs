//! Length-prefixed sub-frame splitting.
//!
//! A decompressed batch is a sequence of `[varint length][length bytes]` records.
//! [`FrameSplitter`] walks such a buffer and hands out each record as a `Bytes`
//! view into the same allocation, so no payload is copied.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::core::varint::{encoded_len, read_unsigned_varint, write_unsigned_varint};
use crate::error::{ProtocolError, Result};

/// Iterator over the sub-frames of a decompressed batch.
///
/// Yields `Err` at most once: a malformed length prefix, a length that runs past
/// the end of the buffer, or an empty frame. After that the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct FrameSplitter {
    buf: Bytes,
    failed: bool,
}

impl FrameSplitter {
    pub fn new(buf: Bytes) -> Self {
        Self { buf, failed: false }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn next_frame(&mut self) -> Result<Bytes> {
        let declared = read_unsigned_varint(&mut self.buf)? as usize;
        let remaining = self.buf.remaining();
        if declared > remaining {
            return Err(ProtocolError::FrameOverrun {
                declared,
                remaining,
            });
        }

        let frame = self.buf.split_to(declared);
        if frame.is_empty() {
            return Err(ProtocolError::EmptyFrame);
        }
        Ok(frame)
    }
}

impl Iterator for FrameSplitter {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.buf.has_remaining() {
            return None;
        }
        let frame = self.next_frame();
        if frame.is_err() {
            self.failed = true;
        }
        Some(frame)
    }
}

/// Write each frame with its varint length prefix.
pub fn encode_frames<I, F>(frames: I) -> BytesMut
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut out = BytesMut::new();
    for frame in frames {
        let frame = frame.as_ref();
        let len = frame.len() as u32;
        out.reserve(encoded_len(len) + frame.len());
        write_unsigned_varint(&mut out, len);
        out.put_slice(frame);
    }
    out
}
