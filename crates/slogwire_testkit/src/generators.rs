//! Property-based test generators using proptest.
//!
//! Provides strategies for generating log records whose values cover every
//! wire kind, including nested groups.

use chrono::{DateTime, FixedOffset, TimeDelta};
use proptest::prelude::*;
use slogwire_codec::{Attr, Value};

/// Strategy for generating attribute keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::string::string_regex("[a-z][a-z0-9_.]{0,15}").expect("Invalid regex"),
        1 => any::<String>(),
        1 => Just(String::new()),
    ]
}

/// Strategy for signed integers, weighted toward the small-int boundary.
pub fn int_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        2 => 0i64..200,
        1 => 195i64..205,
        1 => -10i64..0,
        1 => Just(i64::MIN),
        1 => Just(i64::MAX),
        2 => any::<i64>(),
    ]
}

/// Strategy for durations representable in `i64` nanoseconds.
pub fn duration_strategy() -> impl Strategy<Value = TimeDelta> {
    (i64::MIN + 1..=i64::MAX).prop_map(TimeDelta::nanoseconds)
}

/// Strategy for timestamps with arbitrary whole-second UTC offsets.
pub fn time_strategy() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (
        -62_135_596_800i64..253_402_300_799,
        0u32..1_000_000_000,
        -86_399i32..86_400,
    )
        .prop_map(|(secs, nanos, offset)| {
            let zone = FixedOffset::east_opt(offset).expect("offset in range");
            DateTime::from_timestamp(secs, nanos)
                .expect("timestamp in range")
                .with_timezone(&zone)
        })
}

/// Strategy for non-group values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        int_strategy().prop_map(Value::Int),
        any::<u64>().prop_map(Value::Uint),
        any::<f64>().prop_map(Value::Float),
        any::<bool>().prop_map(Value::Bool),
        any::<String>().prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bytes),
        duration_strategy().prop_map(Value::Duration),
        time_strategy().prop_map(Value::Time),
    ]
}

/// Strategy for values, including groups nested up to `depth` levels.
pub fn value_strategy(depth: u32) -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(depth, 64, 6, |inner| {
        prop::collection::vec((key_strategy(), inner), 0..6).prop_map(|pairs| {
            Value::Group(pairs.into_iter().map(|(k, v)| Attr::new(k, v)).collect())
        })
    })
}

/// Strategy for a single attribute.
pub fn attr_strategy() -> impl Strategy<Value = Attr> {
    (key_strategy(), value_strategy(3)).prop_map(|(key, value)| Attr::new(key, value))
}

/// Strategy for a whole record.
pub fn record_strategy(max_attrs: usize) -> impl Strategy<Value = Vec<Attr>> {
    prop::collection::vec(attr_strategy(), 0..max_attrs)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
