//! # slogwire codec
//!
//! Compact, self-describing binary encoding for structured log records.
//!
//! A record is an ordered list of key/value attributes. Each value carries
//! its own type tag, and the whole record is framed with a magic number and
//! a payload length, so a reader needs no shared schema to validate and
//! decode it.
//!
//! ## Wire Format
//!
//! - Header: `MAGIC` (`u32` LE) then payload length (`u32` LE)
//! - Payload: key/value entries; keys are always strings
//! - Value bytes below 200 are the integer itself, everything else is an
//!   opcode followed by that kind's payload
//! - Groups carry a child item count and nest their entries inline
//!
//! ## Usage
//!
//! ```
//! use slogwire_codec::{decode_record, EncoderPool, Value};
//!
//! let pool = EncoderPool::new();
//! let mut encoder = pool.acquire();
//! encoder.append_key("msg");
//! encoder.append_value(&Value::from("request served"));
//! encoder.append_key("status");
//! encoder.append_value(&Value::Int(200));
//!
//! let mut frame = Vec::new();
//! encoder.finish(&mut frame).unwrap();
//! pool.release(encoder);
//!
//! let attrs = decode_record(&frame).unwrap();
//! assert_eq!(attrs[1].value, Value::Int(200));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod collect;
mod decoder;
mod encoder;
mod error;
mod frame;
mod pool;
mod value;
mod visitor;
pub mod wire;

pub use buffer::{RecordBuffer, INLINE_CAPACITY};
pub use collect::{decode_record, decode_record_with, RecordCollector};
pub use decoder::{
    decode, decode_payload, decode_payload_with, decode_with, DecoderConfig, PayloadDecoder,
    DEFAULT_MAX_DEPTH,
};
pub use encoder::{encode_record, Encoder};
pub use error::{CodecError, CodecResult};
pub use frame::{Frame, FrameReader};
pub use pool::{EncoderPool, PoolConfig, PoolStats};
pub use value::{AnyValue, Attr, Value, ValueKind};
pub use visitor::Visitor;
pub use wire::{Opcode, HEADER_LEN, MAGIC, SMALL_INT_END};
