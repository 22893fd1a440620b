use std::io::Read;

use bytes::{BufMut, BytesMut};
use flate2::read::{DeflateDecoder, DeflateEncoder};
use flate2::Compression;

use crate::error::{constants, ProtocolError, Result};

/// Negotiated id meaning "no compression negotiated yet"
pub const COMPRESSION_NONE_ID: u16 = 0xFFFF;

/// Compression algorithm negotiated for a backend session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMode {
    /// Raw deflate stream (no zlib header)
    Zlib,
    /// Raw Snappy block
    Snappy,
    /// An id this transport does not support
    Unknown(u16),
}

impl CompressionMode {
    /// Map a negotiated algorithm id. `COMPRESSION_NONE_ID` yields `None`.
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0 => Some(CompressionMode::Zlib),
            1 => Some(CompressionMode::Snappy),
            COMPRESSION_NONE_ID => None,
            other => Some(CompressionMode::Unknown(other)),
        }
    }

    pub fn id(self) -> u16 {
        match self {
            CompressionMode::Zlib => 0,
            CompressionMode::Snappy => 1,
            CompressionMode::Unknown(id) => id,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionMode::Zlib => "zlib",
            CompressionMode::Snappy => "snappy",
            CompressionMode::Unknown(_) => "unknown",
        }
    }

    /// The algorithm used for a session, raw inflate until one is negotiated
    pub fn resolve(negotiated: Option<Self>) -> Self {
        negotiated.unwrap_or(CompressionMode::Zlib)
    }
}

/// Decompresses `data` into `out` with the session's negotiated algorithm.
///
/// Nothing negotiated means raw inflate. The output never grows past `max_size`:
/// exceeding it fails the call instead of truncating.
///
/// # Errors
/// - `UnknownCompression` for an unsupported negotiated id
/// - `OversizedPayload` if the output would exceed `max_size`
/// - `DecompressionFailure` on a corrupt stream
pub fn decompress_into(
    data: &[u8],
    negotiated: Option<CompressionMode>,
    out: &mut BytesMut,
    max_size: usize,
) -> Result<CompressionMode> {
    let mode = CompressionMode::resolve(negotiated);
    match mode {
        CompressionMode::Zlib => inflate_raw(data, out, max_size)?,
        CompressionMode::Snappy => snappy_decompress(data, out, max_size)?,
        CompressionMode::Unknown(id) => return Err(ProtocolError::UnknownCompression(id)),
    }
    Ok(mode)
}

fn inflate_raw(data: &[u8], out: &mut BytesMut, max_size: usize) -> Result<()> {
    let mut reader = DeflateDecoder::new(data);

    // Read in chunks to enforce size limit
    let mut buffer = [0u8; 8192];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break, // EOF
            Ok(n) => {
                let size = out.len() + n;
                if size > max_size {
                    return Err(ProtocolError::OversizedPayload {
                        size,
                        max: max_size,
                    });
                }
                out.put_slice(&buffer[..n]);
            }
            Err(e) => {
                return Err(ProtocolError::DecompressionFailure(format!(
                    "{}: {e}",
                    constants::ERR_CORRUPT_DEFLATE
                )))
            }
        }
    }
    Ok(())
}

fn snappy_decompress(data: &[u8], out: &mut BytesMut, max_size: usize) -> Result<()> {
    // Validate the claimed size before allocating anything
    let claimed = snap::raw::decompress_len(data).map_err(|e| {
        ProtocolError::DecompressionFailure(format!("{}: {e}", constants::ERR_CORRUPT_SNAPPY))
    })?;
    let size = out.len() + claimed;
    if size > max_size {
        return Err(ProtocolError::OversizedPayload {
            size,
            max: max_size,
        });
    }

    let start = out.len();
    out.resize(start + claimed, 0);
    let written = snap::raw::Decoder::new()
        .decompress(data, &mut out[start..])
        .map_err(|e| {
            ProtocolError::DecompressionFailure(format!(
                "{}: {e}",
                constants::ERR_CORRUPT_SNAPPY
            ))
        })?;
    out.truncate(start + written);
    Ok(())
}

/// Compresses data with the given algorithm
///
/// # Errors
/// Returns `UnknownCompression` for unsupported modes, `Io` if the encoder fails
pub fn compress(data: &[u8], mode: CompressionMode) -> Result<Vec<u8>> {
    match mode {
        CompressionMode::Zlib => {
            let mut out = Vec::new();
            DeflateEncoder::new(data, Compression::default()).read_to_end(&mut out)?;
            Ok(out)
        }
        CompressionMode::Snappy => snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|e| ProtocolError::Custom(format!("Snappy compression failed: {e}"))),
        CompressionMode::Unknown(id) => Err(ProtocolError::UnknownCompression(id)),
    }
}
