//! Conversion between records and JSON.
//!
//! A record is written as an array of `[key, value]` pairs, so repeated keys
//! and attribute order both survive. Groups use the same pair form. Scalars
//! map to their natural JSON form. Kinds JSON has no type for are written as
//! single-key tagged objects, which [`record_from_json`] accepts back:
//!
//! - bytes: `{"$bytes": "<hex>"}`
//! - duration: `{"$duration_ns": <i64>}`
//! - time: `{"$time": "<RFC 3339>"}`
//!
//! On input a record or group may also be a plain object, which is easier to
//! write by hand but cannot repeat a key.

use chrono::{DateTime, TimeDelta};
use serde_json::{Map, Number, Value as Json};
use slogwire_codec::{Attr, Value};

use super::{CliError, CliResult};

const BYTES_TAG: &str = "$bytes";
const DURATION_TAG: &str = "$duration_ns";
const TIME_TAG: &str = "$time";

/// Convert a decoded record into an array of `[key, value]` pairs.
pub fn record_to_json(attrs: &[Attr]) -> Json {
    Json::Array(
        attrs
            .iter()
            .map(|attr| Json::Array(vec![Json::String(attr.key.clone()), value_to_json(&attr.value)]))
            .collect(),
    )
}

/// Convert one value into JSON.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Int(n) => Json::from(*n),
        Value::Uint(n) => Json::from(*n),
        // NaN and the infinities have no JSON number form.
        Value::Float(f) => Number::from_f64(*f).map_or_else(|| Json::String(f.to_string()), Json::Number),
        Value::Bool(b) => Json::Bool(*b),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => tagged(BYTES_TAG, Json::String(hex_encode(b))),
        Value::Duration(d) => match d.num_nanoseconds() {
            Some(nanos) => tagged(DURATION_TAG, Json::from(nanos)),
            None => tagged(DURATION_TAG, Json::Null),
        },
        Value::Time(t) => tagged(TIME_TAG, Json::String(t.to_rfc3339())),
        Value::Group(attrs) => record_to_json(attrs),
        Value::Any(any) => Json::String(any.to_string()),
    }
}

/// Parse a JSON document into records.
///
/// A top-level object is one record. A top-level array always holds records,
/// each an object or an array of `[key, value]` pairs.
pub fn records_from_json(doc: &Json) -> CliResult<Vec<Vec<Attr>>> {
    match doc {
        Json::Object(_) => Ok(vec![record_from_json(doc)?]),
        Json::Array(items) => items.iter().map(record_from_json).collect(),
        other => Err(CliError::Input(format!(
            "expected a record or an array of records, found {}",
            json_type(other)
        ))),
    }
}

/// Parse one record, given as an array of `[key, value]` pairs or an object.
pub fn record_from_json(doc: &Json) -> CliResult<Vec<Attr>> {
    match doc {
        Json::Array(pairs) => pairs.iter().map(pair_from_json).collect(),
        Json::Object(map) => map
            .iter()
            .map(|(key, value)| Ok(Attr::new(key.as_str(), value_from_json(key, value)?)))
            .collect(),
        other => Err(CliError::Input(format!(
            "record must be an array of pairs or an object, found {}",
            json_type(other)
        ))),
    }
}

fn pair_from_json(pair: &Json) -> CliResult<Attr> {
    match pair.as_array().map(Vec::as_slice) {
        Some([Json::String(key), value]) => Ok(Attr::new(key.as_str(), value_from_json(key, value)?)),
        _ => Err(CliError::Input(format!(
            "expected a [key, value] pair, found {pair}"
        ))),
    }
}

fn value_from_json(key: &str, json: &Json) -> CliResult<Value> {
    match json {
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Uint(u))
            } else {
                n.as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| CliError::Input(format!("{key}: unsupported number {n}")))
            }
        }
        Json::Object(map) => match tagged_value(key, map)? {
            Some(value) => Ok(value),
            None => record_from_json(json).map(Value::Group),
        },
        Json::Array(_) => record_from_json(json).map(Value::Group),
        Json::Null => Err(CliError::Input(format!(
            "{key}: {} values are not supported",
            json_type(json)
        ))),
    }
}

fn tagged_value(key: &str, map: &Map<String, Json>) -> CliResult<Option<Value>> {
    if map.len() != 1 {
        return Ok(None);
    }
    let invalid = |what: &str| CliError::Input(format!("{key}: invalid {what}"));
    if let Some(hex) = map.get(BYTES_TAG) {
        let bytes = hex.as_str().and_then(hex_decode).ok_or_else(|| invalid("hex bytes"))?;
        return Ok(Some(Value::Bytes(bytes)));
    }
    if let Some(nanos) = map.get(DURATION_TAG) {
        let nanos = nanos.as_i64().ok_or_else(|| invalid("duration"))?;
        return Ok(Some(Value::Duration(TimeDelta::nanoseconds(nanos))));
    }
    if let Some(time) = map.get(TIME_TAG) {
        let time = time
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .ok_or_else(|| invalid("RFC 3339 time"))?;
        return Ok(Some(Value::Time(time)));
    }
    Ok(None)
}

fn tagged(tag: &str, value: Json) -> Json {
    let mut map = Map::with_capacity(1);
    map.insert(tag.to_string(), value);
    Json::Object(map)
}

fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slogwire_testkit::sample_record;

    #[test]
    fn sample_record_survives_json() {
        let record = sample_record();
        let json = record_to_json(&record);
        assert_eq!(record_from_json(&json).unwrap(), record);
    }

    #[test]
    fn repeated_keys_survive_json() {
        let record = vec![Attr::new("a", 1i64), Attr::new("a", 2i64)];
        let json = record_to_json(&record);
        assert_eq!(json, json!([["a", 1], ["a", 2]]));
        assert_eq!(record_from_json(&json).unwrap(), record);
    }

    #[test]
    fn groups_are_written_as_pairs() {
        let record = vec![Attr::new("g", Value::group([("x", 1i64), ("x", 2i64)]))];
        assert_eq!(record_to_json(&record), json!([["g", [["x", 1], ["x", 2]]]]));
    }

    #[test]
    fn top_level_array_holds_records() {
        let records = records_from_json(&json!([
            [["a", 1], ["a", 2]],
            {"b": true},
            [],
        ]))
        .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[1], vec![Attr::new("b", true)]);
        assert!(records[2].is_empty());
    }

    #[test]
    fn numbers_pick_the_narrowest_kind() {
        let record = record_from_json(&json!({
            "a": 5,
            "b": -5,
            "c": u64::MAX,
            "d": 1.5,
        }))
        .unwrap();
        assert_eq!(record[0].value, Value::Int(5));
        assert_eq!(record[1].value, Value::Int(-5));
        assert_eq!(record[2].value, Value::Uint(u64::MAX));
        assert_eq!(record[3].value, Value::Float(1.5));
    }

    #[test]
    fn objects_keep_attribute_order() {
        let record = record_from_json(&json!({"z": 1, "a": 2, "m": {"y": true, "b": false}})).unwrap();
        let keys: Vec<_> = record.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(
            record[2].value,
            Value::group([("y", true), ("b", false)])
        );
    }

    #[test]
    fn tagged_objects_with_extra_keys_are_groups() {
        let record = record_from_json(&json!({"g": {"$bytes": "00", "x": 1}})).unwrap();
        assert!(record[0].value.as_group().is_some());
    }

    #[test]
    fn rejects_unsupported_shapes() {
        assert!(records_from_json(&json!(5)).is_err());
        assert!(records_from_json(&json!([1, 2])).is_err());
        assert!(records_from_json(&json!([["a", 1]])).is_err());
        assert!(record_from_json(&json!({"a": null})).is_err());
        assert!(record_from_json(&json!({"a": [1]})).is_err());
        assert!(record_from_json(&json!([["a", 1, 2]])).is_err());
        assert!(record_from_json(&json!([[1, "a"]])).is_err());
        assert!(record_from_json(&json!({"a": {"$bytes": "zz"}})).is_err());
        assert!(record_from_json(&json!({"a": {"$time": "yesterday"}})).is_err());
    }

    #[test]
    fn non_finite_floats_become_strings() {
        assert_eq!(value_to_json(&Value::Float(f64::NAN)), json!("NaN"));
    }
}
