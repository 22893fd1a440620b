#![allow(clippy::unwrap_used, clippy::uninlined_format_args)]

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use proxy_transport::config::{ProxyConfig, MAX_DECOMPRESSED_SIZE};
use proxy_transport::core::frame::encode_frames;
use proxy_transport::core::header::PacketHeader;
use proxy_transport::error::Result;
use proxy_transport::protocol::codec::PacketCodec;
use proxy_transport::protocol::decoder::PacketDecoder;
use proxy_transport::protocol::packet::DecodedPacket;
use proxy_transport::transport::session::{DisconnectReason, DownstreamSession};
use proxy_transport::utils::compression::{compress, decompress_into, CompressionMode};
use proxy_transport::utils::diagnostics::LogSink;
use proxy_transport::utils::metrics::Metrics;

const RAW_ID: u16 = 9;

/// Session that discards every batch
struct NullSession {
    codec: Arc<PacketCodec>,
    compression: Option<CompressionMode>,
}

impl DownstreamSession for NullSession {
    fn player_name(&self) -> &str {
        "bench"
    }

    fn protocol_version(&self) -> u32 {
        589
    }

    fn codec(&self) -> Arc<PacketCodec> {
        Arc::clone(&self.codec)
    }

    fn compression(&self) -> Option<CompressionMode> {
        self.compression
    }

    fn handle_network_stack_packet(&mut self) {}

    fn dispatch_batch(
        &mut self,
        _raw: Bytes,
        packets: Vec<DecodedPacket>,
        _compression: CompressionMode,
    ) -> Result<()> {
        criterion::black_box(packets);
        Ok(())
    }

    fn disconnect(&mut self, _reason: DisconnectReason) {}
}

fn plain_batch(frames: usize, payload: usize) -> BytesMut {
    let frames = (0..frames).map(|_| {
        let mut frame = BytesMut::with_capacity(payload + 2);
        PacketHeader::new(RAW_ID, 0, 0).encode(&mut frame);
        frame.put_bytes(0x5A, payload);
        frame
    });
    encode_frames(frames)
}

fn bench_decompression(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompression");
    let sizes = [512usize, 4096, 65536, 1024 * 1024];

    for &size in &sizes {
        let data = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        for mode in [CompressionMode::Zlib, CompressionMode::Snappy] {
            let compressed = compress(&data, mode).unwrap();
            group.bench_function(format!("{}_{}b", mode.name(), size), |b| {
                b.iter(|| {
                    let mut out = BytesMut::new();
                    decompress_into(&compressed, Some(mode), &mut out, MAX_DECOMPRESSED_SIZE)
                        .unwrap();
                    assert_eq!(out.len(), size);
                })
            });
        }
    }

    group.finish();
}

fn bench_decode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_batch");
    let codec = PacketCodec::standard(589).register_raw(RAW_ID).build();
    let decoder = PacketDecoder::new(
        "bench",
        &ProxyConfig::default(),
        Arc::new(LogSink),
        Arc::new(Metrics::new()),
    );

    for &(frames, payload) in &[(1usize, 64usize), (32, 64), (256, 128), (1024, 512)] {
        let plain = plain_batch(frames, payload);
        group.throughput(Throughput::Bytes(plain.len() as u64));
        for mode in [CompressionMode::Zlib, CompressionMode::Snappy] {
            let raw = Bytes::from(compress(&plain, mode).unwrap());
            let mut session = NullSession {
                codec: Arc::clone(&codec),
                compression: Some(mode),
            };
            group.bench_function(format!("{}_{}x{}b", mode.name(), frames, payload), |b| {
                b.iter(|| decoder.decode(&mut session, raw.clone()).unwrap())
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_decompression, bench_decode_batch);
criterion_main!(benches);
