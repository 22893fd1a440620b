//! Packed packet header.
//!
//! The first varint of every sub-frame carries three fields:
//!
//! ```text
//!  bits 13..12   11..10    9..0
//! [client id ][sender id][packet id]
//! ```

use bytes::{Buf, BufMut};

use crate::core::varint::{read_unsigned_varint, write_unsigned_varint};
use crate::error::Result;

/// Width mask of the packet id (10 bits)
pub const PACKET_ID_MASK: u32 = 0x3FF;
/// Width mask shared by the sender and client ids (2 bits each)
pub const SUB_CLIENT_MASK: u32 = 0x3;
/// Bit offset of the sender id
pub const SENDER_ID_SHIFT: u32 = 10;
/// Bit offset of the client id
pub const CLIENT_ID_SHIFT: u32 = 12;

/// Routing metadata packed into the leading varint of a sub-frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PacketHeader {
    pub packet_id: u16,
    pub sender_id: u8,
    pub client_id: u8,
}

impl PacketHeader {
    /// Build a header, truncating each field to its bit width
    pub fn new(packet_id: u16, sender_id: u8, client_id: u8) -> Self {
        Self {
            packet_id: (u32::from(packet_id) & PACKET_ID_MASK) as u16,
            sender_id: (u32::from(sender_id) & SUB_CLIENT_MASK) as u8,
            client_id: (u32::from(client_id) & SUB_CLIENT_MASK) as u8,
        }
    }

    /// Unpack the three fields from a raw header value. Bits above 13 are ignored.
    pub fn from_raw(value: u32) -> Self {
        Self {
            packet_id: (value & PACKET_ID_MASK) as u16,
            sender_id: ((value >> SENDER_ID_SHIFT) & SUB_CLIENT_MASK) as u8,
            client_id: ((value >> CLIENT_ID_SHIFT) & SUB_CLIENT_MASK) as u8,
        }
    }

    /// Pack the three fields back into one value
    pub fn to_raw(self) -> u32 {
        (u32::from(self.packet_id) & PACKET_ID_MASK)
            | ((u32::from(self.sender_id) & SUB_CLIENT_MASK) << SENDER_ID_SHIFT)
            | ((u32::from(self.client_id) & SUB_CLIENT_MASK) << CLIENT_ID_SHIFT)
    }

    /// Read a header varint from the front of a sub-frame
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        read_unsigned_varint(buf).map(Self::from_raw)
    }

    pub fn encode<B: BufMut>(self, buf: &mut B) {
        write_unsigned_varint(buf, self.to_raw());
    }
}
