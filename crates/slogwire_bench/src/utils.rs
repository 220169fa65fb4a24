//! Benchmark utilities.

use chrono::{FixedOffset, TimeDelta, TimeZone};
use rand::Rng;
use slogwire_codec::{Attr, Value};

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// A typical request log line: message, level, a few numbers and a group.
pub fn request_record() -> Vec<Attr> {
    let utc = FixedOffset::east_opt(0).expect("valid offset");
    vec![
        Attr::new("time", utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp")),
        Attr::new("level", "INFO"),
        Attr::new("msg", "request served"),
        Attr::new(
            "req",
            Value::group([
                ("method", Value::from("GET")),
                ("path", Value::from("/api/v1/items")),
                ("status", Value::Int(200)),
            ]),
        ),
        Attr::new("latency", TimeDelta::microseconds(1_734)),
        Attr::new("bytes", 5_312u64),
    ]
}

/// Generate records of `width` random integer attributes.
pub fn random_int_record(width: usize) -> Vec<Attr> {
    let mut rng = rand::thread_rng();
    (0..width)
        .map(|i| Attr::new(format!("k{}", i), rng.gen::<i64>()))
        .collect()
}

/// A group nested `depth` levels deep with `width` leaves per level.
pub fn nested_record(depth: usize, width: usize) -> Vec<Attr> {
    fn level(depth: usize, width: usize) -> Value {
        if depth == 0 {
            Value::from("leaf")
        } else {
            Value::Group(
                (0..width)
                    .map(|i| Attr::new(format!("key_{}", i), level(depth - 1, width)))
                    .collect(),
            )
        }
    }
    vec![Attr::new("root", level(depth, width))]
}
