//! # Error Types
//!
//! Error handling for the downstream ingestion pipeline.
//!
//! This module defines every error variant that can occur while a batch received
//! from a backend server is decompressed, split into frames and decoded.
//!
//! ## Error Categories
//! - **Recoverable per frame**: a single sub-frame could not be turned into a packet
//!   (`PacketSerialize`, `UnknownPacket`). The frame is dropped, the batch continues.
//! - **Fatal per batch**: decompression failures, size ceiling violations, malformed
//!   length prefixes, empty frames, truncated varints. The whole batch is abandoned.
//! - **Connection**: transport I/O failures and remote closure.
//! - **Configuration**: invalid or unreadable configuration.
//!
//! ## Example Usage
//! ```rust
//! use proxy_transport::error::ProtocolError;
//!
//! let err = ProtocolError::UnknownPacket { id: 999, protocol_version: 589 };
//! assert!(err.is_frame_recoverable());
//! assert!(!ProtocolError::EmptyFrame.is_frame_recoverable());
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Decompression errors
    pub const ERR_CORRUPT_DEFLATE: &str = "Corrupt deflate stream";
    pub const ERR_CORRUPT_SNAPPY: &str = "Corrupt snappy block";

    /// Framing errors
    pub const ERR_EMPTY_FRAME: &str = "Packet cannot be empty";

    /// Batch errors
    pub const ERR_BATCH_DECODE: &str = "Unable to inflate buffer data";

    /// Dispatch errors
    pub const ERR_FORWARDER_CLOSED: &str = "Batch forwarder channel closed";
}

// ProtocolError is the primary error type for all pipeline operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Decompression failed: {0}")]
    DecompressionFailure(String),

    #[error("Unknown compression provided: {0}")]
    UnknownCompression(u16),

    #[error("Decompressed payload too large: {size} bytes (max {max})")]
    OversizedPayload { size: usize, max: usize },

    #[error("VarInt truncated at end of buffer")]
    VarIntTruncated,

    #[error("VarInt was too large")]
    VarIntTooLong,

    #[error("Frame length {declared} exceeds remaining {remaining} bytes")]
    FrameOverrun { declared: usize, remaining: usize },

    #[error("Packet cannot be empty")]
    EmptyFrame,

    #[error("Unknown packet id {id} for protocol version {protocol_version}")]
    UnknownPacket { id: u16, protocol_version: u32 },

    #[error("Failed to decode packet {id}: {reason}")]
    PacketSerialize { id: u16, reason: String },

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Unable to inflate buffer data: {source}")]
    BatchDecode {
        #[source]
        source: Box<ProtocolError>,
    },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ProtocolError {
    /// Whether this error only invalidates the sub-frame it came from.
    ///
    /// Everything else aborts the whole batch.
    pub fn is_frame_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::PacketSerialize { .. } | ProtocolError::UnknownPacket { .. }
        )
    }

    /// Wrap a fatal batch error the way it is surfaced to the connection layer.
    pub fn batch(source: ProtocolError) -> Self {
        ProtocolError::BatchDecode {
            source: Box::new(source),
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
