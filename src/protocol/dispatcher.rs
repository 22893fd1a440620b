use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{constants, ProtocolError, Result};
use crate::protocol::handler::{PacketAction, PacketHandler};
use crate::protocol::packet::DecodedPacket;
use crate::utils::compression::CompressionMode;

/// A decoded batch on its way to the client-facing side.
///
/// `raw` is the untouched compressed buffer, so the receiver may re-emit it
/// verbatim instead of re-encoding `packets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedBatch {
    pub raw: Bytes,
    pub packets: Vec<DecodedPacket>,
    /// Packets cancelled by the session's handler
    pub cancelled: usize,
    pub compression: CompressionMode,
}

impl ForwardedBatch {
    /// Whether the raw buffer still matches `packets` and may be sent as is
    pub fn is_verbatim(&self) -> bool {
        self.cancelled == 0
    }
}

/// Receives decoded batches from a backend session
pub trait BatchDispatcher: Send {
    fn dispatch(
        &mut self,
        handler: &mut dyn PacketHandler,
        raw: Bytes,
        packets: Vec<DecodedPacket>,
        compression: CompressionMode,
    ) -> Result<()>;
}

/// Runs each packet through the session handler and sends the survivors over a channel
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<ForwardedBatch>,
}

impl ChannelDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<ForwardedBatch>) -> Self {
        Self { tx }
    }

    /// Dispatcher plus the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ForwardedBatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl BatchDispatcher for ChannelDispatcher {
    fn dispatch(
        &mut self,
        handler: &mut dyn PacketHandler,
        raw: Bytes,
        packets: Vec<DecodedPacket>,
        compression: CompressionMode,
    ) -> Result<()> {
        let total = packets.len();
        let packets: Vec<DecodedPacket> = packets
            .into_iter()
            .filter(|packet| match handler.handle(packet) {
                PacketAction::Forward => true,
                PacketAction::Cancel => {
                    trace!(packet_id = packet.packet_id(), "Packet cancelled by handler");
                    false
                }
            })
            .collect();
        let cancelled = total - packets.len();

        self.tx
            .send(ForwardedBatch {
                raw,
                packets,
                cancelled,
                compression,
            })
            .map_err(|_| ProtocolError::Dispatch(constants::ERR_FORWARDER_CLOSED.to_string()))
    }
}
