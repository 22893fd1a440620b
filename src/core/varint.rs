//! Unsigned variable-length integers (LEB128) as used for frame lengths and
//! packet headers.
//!
//! Seven payload bits per byte, least significant group first; the high bit marks
//! continuation. A 32-bit value occupies at most five bytes.

use bytes::{Buf, BufMut};

use crate::error::{ProtocolError, Result};

/// Longest encoding of a 32-bit value
pub const MAX_VARINT_LEN: usize = 5;

const CONTINUATION_BIT: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7F;

/// Read an unsigned 32-bit varint, advancing `buf` past it.
///
/// # Errors
/// - `VarIntTruncated` if the buffer ends mid-value
/// - `VarIntTooLong` if the value does not fit in 32 bits
pub fn read_unsigned_varint<B: Buf>(buf: &mut B) -> Result<u32> {
    let mut value: u32 = 0;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(ProtocolError::VarIntTruncated);
        }
        let byte = buf.get_u8();
        let shift = 7 * i as u32;
        let bits = u32::from(byte & PAYLOAD_MASK);

        // The fifth byte only has room for four bits.
        if i == MAX_VARINT_LEN - 1 && bits > 0x0F {
            return Err(ProtocolError::VarIntTooLong);
        }
        value |= bits << shift;

        if byte & CONTINUATION_BIT == 0 {
            return Ok(value);
        }
    }
    Err(ProtocolError::VarIntTooLong)
}

/// Write an unsigned 32-bit varint.
pub fn write_unsigned_varint<B: BufMut>(buf: &mut B, mut value: u32) {
    while value >= u32::from(CONTINUATION_BIT) {
        buf.put_u8((value as u8 & PAYLOAD_MASK) | CONTINUATION_BIT);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Number of bytes `value` occupies when encoded
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}
