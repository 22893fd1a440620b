#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use proxy_transport::core::frame::FrameSplitter;
use proxy_transport::core::header::PacketHeader;
use proxy_transport::protocol::codec::PacketCodec;

fuzz_target!(|data: &[u8]| {
    // Splitting and decoding arbitrary plaintext batches must not panic
    let codec = PacketCodec::standard(589).build();
    for frame in FrameSplitter::new(Bytes::copy_from_slice(data)) {
        let Ok(mut frame) = frame else { break };
        if let Ok(header) = PacketHeader::decode(&mut frame) {
            let _ = codec.try_decode(&mut frame, header);
        }
    }
});
