//! Shared fixtures for integration tests
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use proxy_transport::config::ProxyConfig;
use proxy_transport::core::header::PacketHeader;
use proxy_transport::error::Result;
use proxy_transport::protocol::codec::PacketCodec;
use proxy_transport::protocol::decoder::PacketDecoder;
use proxy_transport::protocol::packet::{ids, DecodedPacket};
use proxy_transport::transport::session::{DisconnectReason, DownstreamSession};
use proxy_transport::utils::compression::{compress, CompressionMode};
use proxy_transport::utils::diagnostics::MemorySink;
use proxy_transport::utils::metrics::Metrics;

pub const PROTOCOL_VERSION: u32 = 589;

/// Pass-through packet id registered in the test codec
pub const RAW_ID: u16 = 9;

/// Packet id the test codec does not know
pub const UNKNOWN_ID: u16 = 999;

pub fn test_codec() -> Arc<PacketCodec> {
    PacketCodec::standard(PROTOCOL_VERSION)
        .register_raw(RAW_ID)
        .build()
}

/// Session that records every call made by the pipeline
pub struct RecordingSession {
    pub codec: Arc<PacketCodec>,
    pub compression: Option<CompressionMode>,
    pub latency_calls: usize,
    pub batches: Vec<(Bytes, Vec<DecodedPacket>, CompressionMode)>,
    pub disconnects: Vec<DisconnectReason>,
}

impl RecordingSession {
    pub fn new(compression: Option<CompressionMode>) -> Self {
        Self {
            codec: test_codec(),
            compression,
            latency_calls: 0,
            batches: Vec::new(),
            disconnects: Vec::new(),
        }
    }
}

impl DownstreamSession for RecordingSession {
    fn player_name(&self) -> &str {
        "Steve"
    }

    fn protocol_version(&self) -> u32 {
        PROTOCOL_VERSION
    }

    fn codec(&self) -> Arc<PacketCodec> {
        Arc::clone(&self.codec)
    }

    fn compression(&self) -> Option<CompressionMode> {
        self.compression
    }

    fn handle_network_stack_packet(&mut self) {
        self.latency_calls += 1;
    }

    fn dispatch_batch(
        &mut self,
        raw: Bytes,
        packets: Vec<DecodedPacket>,
        compression: CompressionMode,
    ) -> Result<()> {
        self.batches.push((raw, packets, compression));
        Ok(())
    }

    fn disconnect(&mut self, reason: DisconnectReason) {
        self.disconnects.push(reason);
    }
}

pub struct Harness {
    pub sink: Arc<MemorySink>,
    pub metrics: Arc<Metrics>,
    pub decoder: PacketDecoder,
}

pub fn harness() -> Harness {
    harness_with(ProxyConfig::default())
}

pub fn harness_with(config: ProxyConfig) -> Harness {
    let sink = Arc::new(MemorySink::default());
    let metrics = Arc::new(Metrics::new());
    let decoder = PacketDecoder::new("Steve", &config, sink.clone(), metrics.clone());
    Harness {
        sink,
        metrics,
        decoder,
    }
}

/// Header followed by an opaque payload
pub fn frame(packet_id: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    PacketHeader::new(packet_id, 0, 0).encode(&mut buf);
    buf.put_slice(payload);
    buf.to_vec()
}

pub fn latency_frame(timestamp: u64) -> Vec<u8> {
    let mut payload = Vec::with_capacity(9);
    payload.extend_from_slice(&timestamp.to_le_bytes());
    payload.push(1);
    frame(ids::NETWORK_STACK_LATENCY, &payload)
}

pub fn item_component_frame() -> Vec<u8> {
    frame(ids::ITEM_COMPONENT, b"components")
}

/// Length-prefix the frames and compress the result
pub fn batch(frames: &[Vec<u8>], mode: CompressionMode) -> Bytes {
    let plain = proxy_transport::core::frame::encode_frames(frames);
    Bytes::from(compress(&plain, mode).expect("compress"))
}
