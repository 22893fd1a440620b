//! Decoded packet representation.
//!
//! A [`DecodedPacket`] is the kind-specific body produced by the active codec plus
//! the routing metadata unpacked from the frame header.

use bytes::Bytes;

use crate::core::header::PacketHeader;

/// Well-known packet ids
pub mod ids {
    /// Round-trips a timestamp for latency probing
    pub const NETWORK_STACK_LATENCY: u16 = 115;
    /// Item component definitions, sent once per session
    pub const ITEM_COMPONENT: u16 = 162;
}

/// Latency probe. A zero timestamp is a request, anything else an echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStackLatency {
    pub timestamp: u64,
    pub from_server: bool,
}

impl NetworkStackLatency {
    /// Whether this is a probe the session has to answer
    pub fn is_probe(&self) -> bool {
        self.timestamp == 0
    }
}

/// Item component table. The layout is not interpreted by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemComponent {
    pub payload: Bytes,
}

/// Kind-specific body of a decoded packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketBody {
    NetworkStackLatency(NetworkStackLatency),
    ItemComponent(ItemComponent),
    /// A kind the codec recognises but forwards without interpretation
    Raw(Bytes),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    pub header: PacketHeader,
    pub body: PacketBody,
}

impl DecodedPacket {
    pub fn new(header: PacketHeader, body: PacketBody) -> Self {
        Self { header, body }
    }

    pub fn packet_id(&self) -> u16 {
        self.header.packet_id
    }

    pub fn sender_id(&self) -> u8 {
        self.header.sender_id
    }

    pub fn client_id(&self) -> u8 {
        self.header.client_id
    }

    /// The latency body if this packet is a latency probe request
    pub fn latency_probe(&self) -> Option<&NetworkStackLatency> {
        match &self.body {
            PacketBody::NetworkStackLatency(latency) if latency.is_probe() => Some(latency),
            _ => None,
        }
    }
}
