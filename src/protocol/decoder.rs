//! # Downstream Batch Decoder
//!
//! Turns one compressed batch received from a backend server into decoded packets
//! and hands them, together with the untouched raw buffer, to the session's
//! batch forwarder.
//!
//! ## Pipeline
//! 1. Decompress with the session's negotiated algorithm, bounded by the size ceiling
//! 2. Split into length-prefixed sub-frames
//! 3. Decode each sub-frame: header varint, then the codec routine for its packet id
//! 4. Notify the session of latency probe requests as they are decoded
//! 5. Dispatch the batch
//!
//! ## Failure Isolation
//! A sub-frame the codec rejects (`PacketSerialize`, `UnknownPacket`) is reported to
//! the diagnostics sink and dropped; its siblings are kept in order. Any other error
//! abandons the batch: the raw buffer is dumped, and the error is returned wrapped in
//! `ProtocolError::BatchDecode` so the connection layer can tear the session down.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::{error, info_span, warn, Span};

use crate::config::{DecoderConfig, ProxyConfig};
use crate::core::frame::FrameSplitter;
use crate::core::header::PacketHeader;
use crate::error::{ProtocolError, Result};
use crate::protocol::codec::PacketCodec;
use crate::protocol::packet::DecodedPacket;
use crate::transport::session::DownstreamSession;
use crate::utils::compression::decompress_into;
use crate::utils::diagnostics::{DiagnosticsSink, FailureRecorder, DEBUG_TARGET};
use crate::utils::metrics::{Metrics, Timer};

pub struct PacketDecoder {
    config: DecoderConfig,
    dump_on_failure: bool,
    recorder: FailureRecorder,
    metrics: Arc<Metrics>,
    span: Span,
}

impl PacketDecoder {
    /// Decoder for one backend connection. Log output is scoped to `player_name`.
    pub fn new(
        player_name: &str,
        config: &ProxyConfig,
        sink: Arc<dyn DiagnosticsSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config: config.decoder.clone(),
            dump_on_failure: config.diagnostics.dump_on_failure,
            recorder: FailureRecorder::new(sink, config.diagnostics.include_base64),
            metrics,
            span: info_span!("downstream", player = %player_name),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticsSink> {
        self.recorder.sink()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Decode one compressed batch and dispatch it through `session`.
    ///
    /// # Errors
    /// `ProtocolError::BatchDecode` wrapping the cause if the batch as a whole could
    /// not be decompressed, split, decoded or dispatched.
    pub fn decode<S: DownstreamSession>(&self, session: &mut S, compressed: Bytes) -> Result<()> {
        let _entered = self.span.enter();
        let _timer = Timer::start("decode_batch");
        self.metrics.batch_received(compressed.len() as u64);

        let codec = session.codec();
        self.decode_batch(session, &codec, &compressed)
            .map_err(|e| self.fail_batch(session, &codec, &compressed, e))
    }

    fn decode_batch<S: DownstreamSession>(
        &self,
        session: &mut S,
        codec: &PacketCodec,
        compressed: &Bytes,
    ) -> Result<()> {
        let mut decompressed = BytesMut::new();
        let mode = decompress_into(
            compressed,
            session.compression(),
            &mut decompressed,
            self.config.max_decompressed_size,
        )?;
        let decompressed = decompressed.freeze();
        let decompressed_len = decompressed.len() as u64;

        let outcomes = FrameSplitter::new(decompressed)
            .map(|frame| {
                let frame = frame?;
                match decode_frame(codec, &frame) {
                    Ok(packet) => {
                        if packet.latency_probe().is_some() {
                            self.metrics.latency_probe();
                            session.handle_network_stack_packet();
                        }
                        Ok(Some(packet))
                    }
                    Err(e) if e.is_frame_recoverable() => {
                        self.drop_frame(session.player_name(), &e, &frame);
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let packets: Vec<DecodedPacket> = outcomes.into_iter().flatten().collect();

        self.metrics
            .batch_decoded(decompressed_len, packets.len() as u64);
        session.dispatch_batch(compressed.clone(), packets, mode)
    }

    fn drop_frame(&self, player: &str, err: &ProtocolError, frame: &[u8]) {
        self.metrics.packet_dropped();
        self.recorder.sink().notify(player, err, Some(frame));
        error!(player, error = %err, "Error while decoding a packet for {player}");
    }

    fn fail_batch<S: DownstreamSession>(
        &self,
        session: &S,
        codec: &PacketCodec,
        compressed: &Bytes,
        err: ProtocolError,
    ) -> ProtocolError {
        let player = session.player_name();
        self.metrics.batch_failed();
        self.recorder.sink().notify(player, &err, None);

        warn!(
            target: DEBUG_TARGET,
            player,
            player_version = session.protocol_version(),
            codec_version = codec.protocol_version(),
            total_frame_size_compressed = compressed.len(),
            "Debug data for {player}"
        );
        error!(player, error = %err, "Error while decoding a packet for {player}");

        if self.dump_on_failure && self.recorder.record(player, compressed).stored {
            self.metrics.dump_recorded();
        }

        ProtocolError::batch(err)
    }
}

/// Decode one non-empty sub-frame.
///
/// A malformed header varint is not recoverable; codec rejections are.
fn decode_frame(codec: &PacketCodec, frame: &Bytes) -> Result<DecodedPacket> {
    let mut buf = frame.clone();
    let header = PacketHeader::decode(&mut buf)?;
    let body = codec.try_decode(&mut buf, header)?;
    Ok(DecodedPacket::new(header, body))
}
