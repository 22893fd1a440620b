//! Backend session boundary.
//!
//! [`DownstreamSession`] is everything the ingestion pipeline needs from the
//! session that owns a backend connection. [`TransportSession`] is the concrete
//! session used by [`DownstreamConnection`](crate::transport::downstream::DownstreamConnection).

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::Result;
use crate::protocol::codec::PacketCodec;
use crate::protocol::dispatcher::BatchDispatcher;
use crate::protocol::handler::DownstreamPacketHandler;
use crate::protocol::packet::DecodedPacket;
use crate::utils::compression::CompressionMode;

/// Why a backend session was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    ClosedByRemotePeer,
    BadPacket,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::ClosedByRemotePeer => f.write_str("closed by remote peer"),
            DisconnectReason::BadPacket => f.write_str("bad packet"),
        }
    }
}

/// Session state the pipeline reads and the hooks it calls
pub trait DownstreamSession {
    fn player_name(&self) -> &str;

    /// Protocol version the player connected with
    fn protocol_version(&self) -> u32;

    /// Codec table for the active protocol version
    fn codec(&self) -> Arc<PacketCodec>;

    /// Negotiated compression, `None` until negotiation happened
    fn compression(&self) -> Option<CompressionMode>;

    /// Called once per latency probe request seen in a batch
    fn handle_network_stack_packet(&mut self);

    /// Hand a decoded batch and its raw buffer to the batch forwarder
    fn dispatch_batch(
        &mut self,
        raw: Bytes,
        packets: Vec<DecodedPacket>,
        compression: CompressionMode,
    ) -> Result<()>;

    fn disconnect(&mut self, reason: DisconnectReason);
}

/// Session of one player's backend connection
pub struct TransportSession<D> {
    player_name: String,
    protocol_version: u32,
    codec: Arc<PacketCodec>,
    compression: Option<CompressionMode>,
    handler: DownstreamPacketHandler,
    dispatcher: D,
    latency_probes: u64,
    disconnect_reason: Option<DisconnectReason>,
}

impl<D: BatchDispatcher> TransportSession<D> {
    pub fn new(
        player_name: impl Into<String>,
        protocol_version: u32,
        codec: Arc<PacketCodec>,
        dispatcher: D,
    ) -> Self {
        Self {
            player_name: player_name.into(),
            protocol_version,
            codec,
            compression: None,
            handler: DownstreamPacketHandler::new(),
            dispatcher,
            latency_probes: 0,
            disconnect_reason: None,
        }
    }

    /// Record the outcome of compression negotiation
    pub fn set_compression(&mut self, compression: Option<CompressionMode>) {
        debug!(player = %self.player_name, compression = ?compression, "Compression negotiated");
        self.compression = compression;
    }

    /// Probe requests observed since the last call
    pub fn take_latency_probes(&mut self) -> u64 {
        std::mem::take(&mut self.latency_probes)
    }

    pub fn handler(&self) -> &DownstreamPacketHandler {
        &self.handler
    }

    pub fn is_connected(&self) -> bool {
        self.disconnect_reason.is_none()
    }

    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        self.disconnect_reason
    }
}

impl<D: BatchDispatcher> DownstreamSession for TransportSession<D> {
    fn player_name(&self) -> &str {
        &self.player_name
    }

    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn codec(&self) -> Arc<PacketCodec> {
        Arc::clone(&self.codec)
    }

    fn compression(&self) -> Option<CompressionMode> {
        self.compression
    }

    fn handle_network_stack_packet(&mut self) {
        self.latency_probes += 1;
    }

    fn dispatch_batch(
        &mut self,
        raw: Bytes,
        packets: Vec<DecodedPacket>,
        compression: CompressionMode,
    ) -> Result<()> {
        self.dispatcher
            .dispatch(&mut self.handler, raw, packets, compression)
    }

    fn disconnect(&mut self, reason: DisconnectReason) {
        if self.disconnect_reason.is_some() {
            return;
        }
        info!(player = %self.player_name, reason = %reason, "Disconnecting downstream session");
        self.disconnect_reason = Some(reason);
    }
}
