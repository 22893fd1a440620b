use crate::protocol::packet::{DecodedPacket, PacketBody};

/// Outcome of handing one packet to a [`PacketHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketAction {
    /// Keep processing and forward the packet
    Forward,
    /// Stop processing this packet only
    Cancel,
}

/// Per-session hook run on every packet travelling from the backend to the client
pub trait PacketHandler: Send {
    fn handle(&mut self, packet: &DecodedPacket) -> PacketAction;
}

/// Handler for a connected backend session.
///
/// Lets the first item component packet of the session through and cancels
/// every later one. The flag is never reset.
#[derive(Debug, Default)]
pub struct DownstreamPacketHandler {
    item_component_sent: bool,
}

impl DownstreamPacketHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_component_sent(&self) -> bool {
        self.item_component_sent
    }
}

impl PacketHandler for DownstreamPacketHandler {
    fn handle(&mut self, packet: &DecodedPacket) -> PacketAction {
        match packet.body {
            PacketBody::ItemComponent(_) if self.item_component_sent => PacketAction::Cancel,
            PacketBody::ItemComponent(_) => {
                self.item_component_sent = true;
                PacketAction::Forward
            }
            _ => PacketAction::Forward,
        }
    }
}
