//! Wire format test vectors.
//!
//! Each vector pairs a record with the exact frame bytes it must encode to.
//! They pin the byte layout so other implementations can check against it.

use serde::{Deserialize, Serialize};
use slogwire_codec::{Attr, Value};

/// A test vector that can be shared across implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Expected frame bytes (hex-encoded, header included).
    pub frame_hex: String,
    /// Expected error message when decoding (if this should fail).
    pub expected_error: Option<String>,
}

impl TestVector {
    fn ok(id: &str, description: &str, frame_hex: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            frame_hex: frame_hex.into(),
            expected_error: None,
        }
    }

    fn err(id: &str, description: &str, frame_hex: &str, error: &str) -> Self {
        Self {
            expected_error: Some(error.into()),
            ..Self::ok(id, description, frame_hex)
        }
    }
}

/// Records matching the successful entries of [`encoding_vectors`], by id.
pub fn vector_record(id: &str) -> Option<Vec<Attr>> {
    let record = match id {
        "empty" => vec![],
        "small_int" => vec![Attr::new("n", 5i64)],
        "varint_int" => vec![Attr::new("big", 1000i64)],
        "negative_int" => vec![Attr::new("n", -1i64)],
        "uint" => vec![Attr::new("u", 5u64)],
        "bools" => vec![Attr::new("t", true), Attr::new("f", false)],
        "string" => vec![Attr::new("s", "hi")],
        "bytes" => vec![Attr::new("b", vec![0xCAu8, 0xFE])],
        "float" => vec![Attr::new("x", 1.0f64)],
        "group" => vec![Attr::new("g", Value::group([("a", 1i64)]))],
        _ => return None,
    };
    Some(record)
}

/// Encoding vectors: records and the frames they produce.
pub fn encoding_vectors() -> Vec<TestVector> {
    vec![
        TestVector::ok("empty", "record with no attributes", "01dcfeba00000000"),
        TestVector::ok("small_int", "n=5 uses the small-int byte", "01dcfeba04000000cd016e05"),
        TestVector::ok(
            "varint_int",
            "big=1000 uses the int opcode and a zig-zag varint",
            "01dcfeba08000000cd03626967c8d00f",
        ),
        TestVector::ok("negative_int", "n=-1 zig-zags to 1", "01dcfeba05000000cd016ec801"),
        TestVector::ok("uint", "unsigned values never use the small-int byte", "01dcfeba05000000cd0175c905"),
        TestVector::ok("bools", "booleans are bare opcodes", "01dcfeba08000000cd0174cbcd0166cc"),
        TestVector::ok("string", "strings carry a small-int length", "01dcfeba07000000cd0173cd026869"),
        TestVector::ok("bytes", "bytes carry a small-int length", "01dcfeba07000000cd0162ce02cafe"),
        TestVector::ok(
            "float",
            "floats are 8 little-endian bytes",
            "01dcfeba0c000000cd0178ca000000000000f03f",
        ),
        TestVector::ok(
            "group",
            "groups count flattened items",
            "01dcfeba09000000cd0167d102cd016101",
        ),
    ]
}

/// Decoding vectors that must be rejected.
pub fn rejection_vectors() -> Vec<TestVector> {
    vec![
        TestVector::err("bad_magic", "magic mismatch", "02dcfeba00000000", "invalid magic"),
        TestVector::err("key_not_string", "key must be a string", "01dcfeba020000000505", "key is not a string"),
        TestVector::err("unknown_opcode", "bytes above the last opcode", "01dcfeba04000000cd016efa", "unknown opcode"),
        TestVector::err("short_payload", "payload shorter than declared", "01dcfeba05000000cd016e05", "i/o error"),
        TestVector::err("odd_group", "group counts are even", "01dcfeba05000000cd0167d101", "invalid group count"),
        TestVector::err(
            "open_group",
            "group children missing",
            "01dcfeba05000000cd0167d102",
            "group entries missing",
        ),
    ]
}

/// Generate all test vectors as JSON.
pub fn all_vectors_json() -> String {
    let vectors = AllTestVectors {
        encoding: encoding_vectors(),
        rejection: rejection_vectors(),
    };

    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    encoding: Vec<TestVector>,
    rejection: Vec<TestVector>,
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hex, ignoring whitespace.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slogwire_codec::{decode_record, encode_record};

    #[test]
    fn test_encoding_vectors() {
        for vector in encoding_vectors() {
            let record = vector_record(&vector.id).expect("every vector has a record");
            let encoded = encode_record(&record).unwrap();
            assert_eq!(
                hex_encode(&encoded),
                vector.frame_hex,
                "Vector {} failed: {}",
                vector.id,
                vector.description
            );
            assert_eq!(decode_record(&encoded).unwrap(), record);
        }
    }

    #[test]
    fn test_rejection_vectors() {
        for vector in rejection_vectors() {
            let input = hex_decode(&vector.frame_hex);
            let err = decode_record(&input).expect_err(&vector.id);
            let expected = vector.expected_error.as_deref().unwrap();
            assert!(
                err.to_string().contains(expected),
                "Vector {}: {} does not mention {}",
                vector.id,
                err,
                expected
            );
        }
    }

    #[test]
    fn test_all_vectors_json() {
        let json = all_vectors_json();
        assert!(json.contains("encoding"));
        assert!(json.contains("rejection"));
        assert!(json.contains("small_int"));
    }
}
