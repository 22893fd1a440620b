#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use proxy_transport::config::MAX_DECOMPRESSED_SIZE;
use proxy_transport::utils::compression::{decompress_into, CompressionMode};

fuzz_target!(|data: &[u8]| {
    // Malformed input must fail cleanly and never grow past the ceiling
    for mode in [None, Some(CompressionMode::Zlib), Some(CompressionMode::Snappy)] {
        let mut out = BytesMut::new();
        if decompress_into(data, mode, &mut out, MAX_DECOMPRESSED_SIZE).is_ok() {
            assert!(out.len() <= MAX_DECOMPRESSED_SIZE);
        }
    }
});
