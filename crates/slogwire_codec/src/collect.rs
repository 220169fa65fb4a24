//! A visitor that rebuilds owned attributes.

use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::decoder::{decode_with, DecoderConfig};
use crate::error::CodecResult;
use crate::value::{Attr, Value};
use crate::visitor::Visitor;

/// Decode one frame from `bytes` into owned attributes.
///
/// # Errors
///
/// Returns an error if the frame is truncated, malformed, or nests groups
/// deeper than the default limit.
pub fn decode_record(bytes: &[u8]) -> CodecResult<Vec<Attr>> {
    decode_record_with(bytes, &DecoderConfig::default())
}

/// Like [`decode_record`], with an explicit configuration.
///
/// # Errors
///
/// See [`decode_record`].
pub fn decode_record_with(bytes: &[u8], config: &DecoderConfig) -> CodecResult<Vec<Attr>> {
    let mut collector = RecordCollector::new();
    decode_with(bytes, &mut collector, config)?;
    Ok(collector.finish())
}

struct Level {
    key: String,
    attrs: Vec<Attr>,
    remaining: usize,
}

/// Collects decode callbacks into a tree of [`Attr`]s.
///
/// Group counts announced by [`Visitor::group`] decide which of the
/// following entries are children, so the output nests exactly as the
/// encoder's input did. String values that are not valid UTF-8 are
/// converted lossily.
#[derive(Default)]
pub struct RecordCollector {
    root: Vec<Attr>,
    open: Vec<Level>,
}

impl RecordCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the collected attributes, closing any group left open.
    pub fn finish(mut self) -> Vec<Attr> {
        while let Some(level) = self.open.pop() {
            self.attach(Attr::new(level.key, Value::Group(level.attrs)));
        }
        self.root
    }

    fn push(&mut self, key: &[u8], value: Value) {
        self.attach(Attr::new(String::from_utf8_lossy(key), value));
        self.close_complete();
    }

    fn attach(&mut self, attr: Attr) {
        match self.open.last_mut() {
            Some(level) => {
                level.attrs.push(attr);
                level.remaining = level.remaining.saturating_sub(1);
            }
            None => self.root.push(attr),
        }
    }

    fn close_complete(&mut self) {
        while self.open.last().is_some_and(|level| level.remaining == 0) {
            if let Some(level) = self.open.pop() {
                let group = Attr::new(level.key, Value::Group(level.attrs));
                match self.open.last_mut() {
                    Some(parent) => parent.attrs.push(group),
                    None => self.root.push(group),
                }
            }
        }
    }
}

impl Visitor for RecordCollector {
    fn int(&mut self, key: &[u8], value: i64) {
        self.push(key, Value::Int(value));
    }

    fn uint(&mut self, key: &[u8], value: u64) {
        self.push(key, Value::Uint(value));
    }

    fn string(&mut self, key: &[u8], value: &[u8]) {
        self.push(key, Value::String(String::from_utf8_lossy(value).into_owned()));
    }

    fn bytes(&mut self, key: &[u8], value: &[u8]) {
        self.push(key, Value::Bytes(value.to_vec()));
    }

    fn bool(&mut self, key: &[u8], value: bool) {
        self.push(key, Value::Bool(value));
    }

    fn float(&mut self, key: &[u8], value: f64) {
        self.push(key, Value::Float(value));
    }

    fn duration(&mut self, key: &[u8], value: TimeDelta) {
        self.push(key, Value::Duration(value));
    }

    fn time(&mut self, key: &[u8], value: DateTime<FixedOffset>) {
        self.push(key, Value::Time(value));
    }

    fn group(&mut self, key: &[u8], count: usize) {
        // The group occupies one slot in its parent; the slot is filled
        // when the group closes.
        if let Some(parent) = self.open.last_mut() {
            parent.remaining = parent.remaining.saturating_sub(1);
        }
        self.open.push(Level {
            key: String::from_utf8_lossy(key).into_owned(),
            attrs: Vec::new(),
            remaining: count / 2,
        });
        self.close_complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_record;
    use crate::error::CodecError;
    use crate::frame::Frame;
    use crate::wire::Opcode;

    #[test]
    fn rebuilds_nested_groups() {
        let attrs = vec![
            Attr::new("msg", "started"),
            Attr::new(
                "req",
                Value::group([
                    ("method", Value::from("GET")),
                    ("meta", Value::group([("a", 1i64), ("b", 2i64)])),
                    ("empty", Value::Group(vec![])),
                    ("status", Value::from(200i64)),
                ]),
            ),
            Attr::new("after", true),
        ];
        let bytes = encode_record(&attrs).unwrap();
        assert_eq!(decode_record(&bytes).unwrap(), attrs);
    }

    #[test]
    fn trailing_empty_group() {
        let attrs = vec![Attr::new("g", Value::Group(vec![]))];
        let bytes = encode_record(&attrs).unwrap();
        assert_eq!(decode_record(&bytes).unwrap(), attrs);
    }

    #[test]
    fn lossy_strings() {
        let mut collector = RecordCollector::new();
        collector.string(b"k", &[0xff, b'a']);
        let attrs = collector.finish();
        assert_eq!(attrs[0].value, Value::from("\u{fffd}a"));
    }

    #[test]
    fn finish_closes_open_groups() {
        let mut collector = RecordCollector::new();
        collector.group(b"g", 4);
        collector.int(b"a", 1);
        let attrs = collector.finish();
        assert_eq!(attrs, vec![Attr::new("g", Value::group([("a", 1i64)]))]);
    }

    #[test]
    fn deep_frames_fail_instead_of_building_a_tree() {
        let mut payload = Vec::new();
        for _ in 0..100_000 {
            payload.extend_from_slice(&[Opcode::String as u8, 0, Opcode::Group as u8, 2]);
        }
        payload.extend_from_slice(&[Opcode::String as u8, 0, 1]);
        let frame = Frame::from_payload(payload).unwrap().to_bytes();

        assert!(matches!(
            decode_record(&frame),
            Err(CodecError::NestingTooDeep { .. })
        ));
        assert!(matches!(
            Frame::read_from(&frame[..]).unwrap().to_attrs(),
            Err(CodecError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn depth_limit_is_configurable() {
        let attrs = vec![Attr::new(
            "a",
            Value::group([("b", Value::group([("c", 1i64)]))]),
        )];
        let bytes = encode_record(&attrs).unwrap();
        assert_eq!(decode_record(&bytes).unwrap(), attrs);
        assert!(matches!(
            decode_record_with(&bytes, &DecoderConfig::new().max_depth(1)),
            Err(CodecError::NestingTooDeep { depth: 2, .. })
        ));
    }
}
