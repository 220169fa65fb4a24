//! Fuzz testing harnesses for slogwire.
//!
//! These targets can be driven by cargo-fuzz or by proptest. Each one must
//! return normally for every input: malformed bytes are expected to produce
//! errors, never panics.

use slogwire_codec::{
    decode_payload, decode_record, encode_record, FrameReader, RecordCollector,
};

/// Fuzz target for frame decoding.
///
/// Tests that arbitrary byte sequences either decode or return an error.
pub fn fuzz_frame_decode(data: &[u8]) {
    let _ = decode_record(data);
}

/// Fuzz target for payload decoding without a header.
pub fn fuzz_payload_decode(data: &[u8]) {
    let mut collector = RecordCollector::new();
    let _ = decode_payload(data, &mut collector);
    let _ = collector.finish();
}

/// Fuzz target for reading a stream of frames.
///
/// The reader must stop after the first error.
pub fn fuzz_frame_stream(data: &[u8]) {
    let mut reader = FrameReader::new(data);
    let mut failed = false;
    for frame in reader.by_ref() {
        assert!(!failed, "reader yielded after an error");
        match frame {
            Ok(frame) => {
                let _ = frame.to_attrs();
            }
            Err(_) => failed = true,
        }
    }
    assert!(reader.position() <= data.len() as u64);
}

/// Fuzz target for decode/encode roundtrip.
///
/// Any frame that decodes must re-encode to the same payload. Lossy string
/// conversion can change invalid UTF-8, so only payloads whose strings are
/// valid are compared.
pub fn fuzz_roundtrip(data: &[u8]) {
    if let Ok(attrs) = decode_record(data) {
        let encoded = encode_record(&attrs).expect("decoded records re-encode");
        if let Ok(again) = decode_record(&encoded) {
            assert_eq!(
                format!("{:?}", attrs),
                format!("{:?}", again),
                "Roundtrip mismatch"
            );
        }
    }
}
