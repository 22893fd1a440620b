#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! End-to-end tests of the batch decoder against a recording session
//! Covers per-frame isolation, fatal batch failures, and diagnostics output

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};
use common::*;
use proxy_transport::config::{ProxyConfig, MAX_DECOMPRESSED_SIZE};
use proxy_transport::core::varint::write_unsigned_varint;
use proxy_transport::error::ProtocolError;
use proxy_transport::protocol::packet::{ids, PacketBody};
use proxy_transport::utils::compression::{compress, CompressionMode};
use proxy_transport::utils::diagnostics::BASE64_MARKER;
use std::error::Error as _;
use uuid::Uuid;

fn fatal_source(err: &ProtocolError) -> &ProtocolError {
    match err {
        ProtocolError::BatchDecode { source } => source,
        other => panic!("expected BatchDecode, got {other:?}"),
    }
}

// ============================================================================
// PER-FRAME ISOLATION
// ============================================================================

#[test]
fn test_unknown_packet_dropped_sibling_kept() {
    let h = harness();
    let mut session = RecordingSession::new(Some(CompressionMode::Zlib));
    let raw = batch(
        &[frame(RAW_ID, b"hello"), frame(UNKNOWN_ID, b"???")],
        CompressionMode::Zlib,
    );

    h.decoder.decode(&mut session, raw.clone()).expect("batch decodes");

    assert_eq!(session.batches.len(), 1);
    let (forwarded_raw, packets, mode) = &session.batches[0];
    assert_eq!(forwarded_raw, &raw);
    assert_eq!(*mode, CompressionMode::Zlib);
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].packet_id(), RAW_ID);
    assert_eq!(packets[0].body, PacketBody::Raw(Bytes::from_static(b"hello")));

    let notifications = h.sink.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].player, "Steve");
    assert_eq!(notifications[0].slice.as_deref(), Some(&frame(UNKNOWN_ID, b"???")[..]));
    assert!(h.sink.records().is_empty(), "no dump for a recoverable error");

    let snapshot = h.metrics.snapshot();
    assert_eq!(snapshot.packets_decoded, 1);
    assert_eq!(snapshot.packets_dropped, 1);
    assert_eq!(snapshot.batches_failed, 0);
}

#[test]
fn test_malformed_payload_dropped_order_preserved() {
    let h = harness();
    let mut session = RecordingSession::new(None);
    let raw = batch(
        &[
            frame(RAW_ID, b"first"),
            frame(ids::NETWORK_STACK_LATENCY, &[1, 2]), // too short
            frame(RAW_ID, b"second"),
            frame(RAW_ID, b"third"),
        ],
        CompressionMode::Zlib,
    );

    h.decoder.decode(&mut session, raw).unwrap();

    let payloads: Vec<_> = session.batches[0]
        .1
        .iter()
        .map(|p| match &p.body {
            PacketBody::Raw(b) => b.clone(),
            other => panic!("unexpected body {other:?}"),
        })
        .collect();
    assert_eq!(payloads, vec!["first", "second", "third"]);
    assert_eq!(h.sink.notifications().len(), 1);
}

#[test]
fn test_header_routing_metadata() {
    let h = harness();
    let mut session = RecordingSession::new(None);
    let mut tagged = BytesMut::new();
    proxy_transport::core::header::PacketHeader::new(RAW_ID, 2, 1).encode(&mut tagged);
    tagged.put_slice(b"x");

    h.decoder
        .decode(&mut session, batch(&[tagged.to_vec()], CompressionMode::Zlib))
        .unwrap();

    let packet = &session.batches[0].1[0];
    assert_eq!(packet.packet_id(), RAW_ID);
    assert_eq!(packet.sender_id(), 2);
    assert_eq!(packet.client_id(), 1);
}

// ============================================================================
// LATENCY OBSERVER
// ============================================================================

#[test]
fn test_latency_probe_notifies_session_once() {
    let h = harness();
    let mut session = RecordingSession::new(None);

    h.decoder
        .decode(&mut session, batch(&[latency_frame(0)], CompressionMode::Zlib))
        .unwrap();

    assert_eq!(session.batches[0].1.len(), 1);
    assert_eq!(session.latency_calls, 1);
    assert_eq!(h.metrics.snapshot().latency_probes, 1);
}

#[test]
fn test_latency_echo_does_not_notify() {
    let h = harness();
    let mut session = RecordingSession::new(None);

    h.decoder
        .decode(
            &mut session,
            batch(&[latency_frame(123_456), latency_frame(0), latency_frame(0)], CompressionMode::Zlib),
        )
        .unwrap();

    assert_eq!(session.batches[0].1.len(), 3, "all latency packets are forwarded");
    assert_eq!(session.latency_calls, 2);
}

// ============================================================================
// COMPRESSION
// ============================================================================

#[test]
fn test_snappy_batch_forwards_negotiated_mode() {
    let h = harness();
    let mut session = RecordingSession::new(Some(CompressionMode::Snappy));

    h.decoder
        .decode(&mut session, batch(&[frame(RAW_ID, b"snappy")], CompressionMode::Snappy))
        .unwrap();

    assert_eq!(session.batches[0].2, CompressionMode::Snappy);
    assert_eq!(session.batches[0].1.len(), 1);
}

#[test]
fn test_unknown_compression_is_fatal() {
    let h = harness();
    let mut session = RecordingSession::new(Some(CompressionMode::Unknown(7)));
    let raw = batch(&[frame(RAW_ID, b"never")], CompressionMode::Zlib);

    let err = h.decoder.decode(&mut session, raw).unwrap_err();

    assert!(matches!(fatal_source(&err), ProtocolError::UnknownCompression(7)));
    assert!(session.batches.is_empty());
    assert_eq!(h.sink.records().len(), 1);
}

#[test]
fn test_decompression_bomb_rejected_before_splitting() {
    let h = harness();
    let mut session = RecordingSession::new(None);
    let oversized = compress(&vec![0u8; MAX_DECOMPRESSED_SIZE + 1], CompressionMode::Zlib).unwrap();

    let err = h.decoder.decode(&mut session, Bytes::from(oversized)).unwrap_err();

    assert!(matches!(
        fatal_source(&err),
        ProtocolError::OversizedPayload { max, .. } if *max == MAX_DECOMPRESSED_SIZE
    ));
    assert!(session.batches.is_empty());
    assert_eq!(h.metrics.snapshot().packets_dropped, 0);
}

#[test]
fn test_exactly_at_ceiling_is_accepted() {
    let h = harness();
    let mut session = RecordingSession::new(None);

    // One raw frame padded so the whole batch is exactly the ceiling
    let prefix_len = 4; // varint of a length just under 4 MiB
    let header_len = 1;
    let payload = vec![0x41u8; MAX_DECOMPRESSED_SIZE - prefix_len - header_len];
    let raw = batch(&[frame(RAW_ID, &payload)], CompressionMode::Zlib);

    h.decoder.decode(&mut session, raw).unwrap();
    assert_eq!(session.batches[0].1.len(), 1);
    assert_eq!(h.metrics.snapshot().bytes_decompressed, MAX_DECOMPRESSED_SIZE as u64);
}

#[test]
fn test_corrupt_stream_is_fatal() {
    let h = harness();
    let mut session = RecordingSession::new(None);

    let err = h
        .decoder
        .decode(&mut session, Bytes::from_static(&[0xFF; 32]))
        .unwrap_err();

    assert!(matches!(fatal_source(&err), ProtocolError::DecompressionFailure(_)));
}

// ============================================================================
// FRAMING FAILURES
// ============================================================================

#[test]
fn test_frame_overrun_records_dump_and_reraises() {
    let h = harness();
    let mut session = RecordingSession::new(None);

    let mut plain = BytesMut::new();
    write_unsigned_varint(&mut plain, 10);
    plain.put_slice(b"short");
    let raw = Bytes::from(compress(&plain, CompressionMode::Zlib).unwrap());

    let err = h.decoder.decode(&mut session, raw.clone()).unwrap_err();

    assert!(matches!(
        fatal_source(&err),
        ProtocolError::FrameOverrun { declared: 10, remaining: 5 }
    ));
    assert!(err.source().is_some());
    assert!(session.batches.is_empty());

    let records = h.sink.records();
    assert_eq!(records.len(), 1, "recorder runs exactly once");
    let (id, dump) = &records[0];
    assert!(Uuid::parse_str(id).is_ok());

    // The dump covers the untouched compressed input
    let (_, b64) = dump.split_once(BASE64_MARKER).expect("base64 section");
    assert_eq!(b64, STANDARD.encode(&raw));

    // One notification without a slice for the fatal error
    let notifications = h.sink.notifications();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].slice.is_none());

    let snapshot = h.metrics.snapshot();
    assert_eq!(snapshot.batches_failed, 1);
    assert_eq!(snapshot.dumps_recorded, 1);
}

#[test]
fn test_empty_frame_is_fatal() {
    let h = harness();
    let mut session = RecordingSession::new(None);

    let mut plain = proxy_transport::core::frame::encode_frames([frame(RAW_ID, b"ok")]);
    plain.put_u8(0);
    let raw = Bytes::from(compress(&plain, CompressionMode::Zlib).unwrap());

    let err = h.decoder.decode(&mut session, raw).unwrap_err();
    assert!(matches!(fatal_source(&err), ProtocolError::EmptyFrame));
    assert!(session.batches.is_empty(), "decoded siblings are not forwarded");
}

#[test]
fn test_truncated_header_is_fatal() {
    let h = harness();
    let mut session = RecordingSession::new(None);

    let raw = batch(&[frame(RAW_ID, b"ok"), vec![0x80]], CompressionMode::Zlib);
    let err = h.decoder.decode(&mut session, raw).unwrap_err();
    assert!(matches!(fatal_source(&err), ProtocolError::VarIntTruncated));
}

#[test]
fn test_dump_disabled() {
    let config = ProxyConfig::default_with_overrides(|c| c.diagnostics.dump_on_failure = false);
    let h = harness_with(config);
    let mut session = RecordingSession::new(None);

    assert!(h
        .decoder
        .decode(&mut session, Bytes::from_static(&[0xFF; 4]))
        .is_err());
    assert!(h.sink.records().is_empty());
    assert_eq!(h.sink.notifications().len(), 1);
}

#[test]
fn test_empty_batch_dispatches_nothing() {
    let h = harness();
    let mut session = RecordingSession::new(None);

    h.decoder
        .decode(&mut session, batch(&[], CompressionMode::Zlib))
        .unwrap();
    assert_eq!(session.batches.len(), 1);
    assert!(session.batches[0].1.is_empty());
}
