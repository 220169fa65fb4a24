//! Streaming record decoder.

use std::io::Read;

use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::error::{CodecError, CodecResult};
use crate::frame::read_frame;
use crate::visitor::Visitor;
use crate::wire::{self, Opcode, Varint, SMALL_INT_END, TIME_LEN};

/// Configuration for reading frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Largest payload length accepted from a header.
    ///
    /// Defaults to `u32::MAX`, which accepts every frame the format can
    /// express. Lower it when reading from untrusted sources.
    pub max_payload_len: u32,

    /// Deepest group nesting accepted in a payload.
    ///
    /// Owned attribute trees are recursive, so unbounded nesting from an
    /// untrusted frame could exhaust the stack when such a tree is built,
    /// compared or dropped.
    pub max_depth: usize,
}

/// Default group nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 128;

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_payload_len: u32::MAX,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecoderConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the largest accepted payload length.
    #[must_use]
    pub const fn max_payload_len(mut self, len: u32) -> Self {
        self.max_payload_len = len;
        self
    }

    /// Sets the deepest accepted group nesting.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Read one frame from `source` and stream its entries to `visitor`.
///
/// Callbacks that fired before an error are not undone.
///
/// # Errors
///
/// Returns [`CodecError::Io`] on short reads and a format error for a bad
/// magic number or a malformed payload.
pub fn decode<R, V>(source: R, visitor: &mut V) -> CodecResult<()>
where
    R: Read,
    V: Visitor + ?Sized,
{
    decode_with(source, visitor, &DecoderConfig::default())
}

/// Like [`decode`], with an explicit configuration.
///
/// # Errors
///
/// See [`decode`]; additionally fails with [`CodecError::PayloadTooLarge`]
/// when the header exceeds `config.max_payload_len`.
pub fn decode_with<R, V>(mut source: R, visitor: &mut V, config: &DecoderConfig) -> CodecResult<()>
where
    R: Read,
    V: Visitor + ?Sized,
{
    match read_frame(&mut source, config)? {
        Some(frame) => frame.visit_with(visitor, config),
        None => Err(CodecError::io(
            std::io::ErrorKind::UnexpectedEof.into(),
            0,
        )),
    }
}

/// Stream the entries of an already materialized payload to `visitor`.
///
/// # Errors
///
/// Returns a format error if the payload is malformed or nests groups
/// deeper than [`DEFAULT_MAX_DEPTH`].
pub fn decode_payload<V: Visitor + ?Sized>(payload: &[u8], visitor: &mut V) -> CodecResult<()> {
    decode_payload_with(payload, visitor, &DecoderConfig::default())
}

/// Like [`decode_payload`], with an explicit configuration.
///
/// # Errors
///
/// Returns a format error if the payload is malformed or nests groups
/// deeper than `config.max_depth`.
pub fn decode_payload_with<V: Visitor + ?Sized>(
    payload: &[u8],
    visitor: &mut V,
    config: &DecoderConfig,
) -> CodecResult<()> {
    let mut decoder = PayloadDecoder::with_max_depth(payload, config.max_depth);
    while !decoder.is_empty() {
        decoder.decode_entry(visitor)?;
    }
    decoder.finish()
}

/// Cursor over a payload.
///
/// Every read is bounds-checked, so malformed input produces an error
/// rather than a panic.
pub struct PayloadDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    /// Child entries announced by open groups that have not been seen yet.
    owed: usize,
    /// Remaining child entries of each open group, innermost last.
    open: Vec<usize>,
    max_depth: usize,
}

impl<'a> PayloadDecoder<'a> {
    /// Create a decoder for the given payload with the default nesting limit.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_depth(data, DEFAULT_MAX_DEPTH)
    }

    /// Create a decoder that rejects groups nested deeper than `max_depth`.
    pub fn with_max_depth(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            data,
            pos: 0,
            owed: 0,
            open: Vec::new(),
            max_depth,
        }
    }

    /// Number of groups still waiting for children.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Current offset into the payload.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Decode one key/value entry and report it to `visitor`.
    ///
    /// # Errors
    ///
    /// Returns a format error if the entry is malformed.
    pub fn decode_entry<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> CodecResult<()> {
        let offset = self.pos;
        let op = self.read_byte()?;
        if op != Opcode::String.as_byte() {
            return Err(CodecError::KeyNotString { opcode: op, offset });
        }
        let key = self.read_len_prefixed()?;
        self.owed = self.owed.saturating_sub(1);
        if let Some(remaining) = self.open.last_mut() {
            *remaining = remaining.saturating_sub(1);
        }

        let offset = self.pos;
        let byte = self.read_byte()?;
        if byte < SMALL_INT_END {
            visitor.int(key, i64::from(byte));
            self.close_complete();
            return Ok(());
        }

        match Opcode::from_byte(byte) {
            Some(Opcode::Int) => {
                let n = self.read_varint()?;
                visitor.int(key, wire::unzigzag(n));
            }
            Some(Opcode::Uint) => {
                let n = self.read_varint()?;
                visitor.uint(key, n);
            }
            Some(Opcode::Float) => {
                let bits = u64::from_le_bytes(self.read_array()?);
                visitor.float(key, f64::from_bits(bits));
            }
            Some(Opcode::True) => visitor.bool(key, true),
            Some(Opcode::False) => visitor.bool(key, false),
            Some(Opcode::String) => {
                let value = self.read_len_prefixed()?;
                visitor.string(key, value);
            }
            Some(Opcode::Bytes) => {
                let value = self.read_len_prefixed()?;
                visitor.bytes(key, value);
            }
            Some(Opcode::Duration) => {
                let nanos = self.read_int()?;
                visitor.duration(key, TimeDelta::nanoseconds(nanos));
            }
            Some(Opcode::Time) => {
                let time = self.read_time()?;
                visitor.time(key, time);
            }
            Some(Opcode::Group) => {
                let count = self.read_group_count()?;
                visitor.group(key, count);
            }
            None => return Err(CodecError::UnknownOpcode { opcode: byte, offset }),
        }
        self.close_complete();
        Ok(())
    }

    fn close_complete(&mut self) {
        while self.open.last() == Some(&0) {
            self.open.pop();
        }
    }

    /// Check that no group is left waiting for children.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnterminatedGroup`] if a group announced more
    /// entries than the payload contained.
    pub fn finish(&self) -> CodecResult<()> {
        if self.owed > 0 {
            return Err(CodecError::UnterminatedGroup { missing: self.owed });
        }
        Ok(())
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::Truncated {
            offset: self.pos,
            needed: 1,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let remaining = self.data.len() - self.pos;
        if len > remaining {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: len - remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_varint(&mut self) -> CodecResult<u64> {
        match wire::read_uvarint(&self.data[self.pos..]) {
            Varint::Value(value, used) => {
                self.pos += used;
                Ok(value)
            }
            Varint::Incomplete => Err(CodecError::Truncated {
                offset: self.data.len(),
                needed: 1,
            }),
            Varint::Overflow => Err(CodecError::VarintOverflow { offset: self.pos }),
        }
    }

    /// Reads a value encoded with the small-int / `Int` opcode rule.
    fn read_int(&mut self) -> CodecResult<i64> {
        let offset = self.pos;
        let byte = self.read_byte()?;
        if byte < SMALL_INT_END {
            Ok(i64::from(byte))
        } else if byte == Opcode::Int.as_byte() {
            Ok(wire::unzigzag(self.read_varint()?))
        } else {
            Err(CodecError::ExpectedInteger {
                opcode: byte,
                offset,
            })
        }
    }

    fn read_len_prefixed(&mut self) -> CodecResult<&'a [u8]> {
        let offset = self.pos;
        let length = self.read_int()?;
        let len = usize::try_from(length)
            .map_err(|_| CodecError::InvalidLength { length, offset })?;
        self.read_bytes(len)
    }

    fn read_group_count(&mut self) -> CodecResult<usize> {
        let offset = self.pos;
        let count = self.read_int()?;
        let invalid = || CodecError::InvalidGroupCount { count, offset };
        if count % 2 != 0 {
            return Err(invalid());
        }
        let items = usize::try_from(count).map_err(|_| invalid())?;
        let depth = self.open.len() + 1;
        if depth > self.max_depth {
            return Err(CodecError::NestingTooDeep { depth, offset });
        }
        self.owed = self.owed.checked_add(items / 2).ok_or_else(invalid)?;
        if items > 0 {
            self.open.push(items / 2);
        }
        Ok(items)
    }

    fn read_time(&mut self) -> CodecResult<DateTime<FixedOffset>> {
        let offset = self.pos;
        let block: [u8; TIME_LEN] = self.read_array()?;
        let secs = i64::from_le_bytes([
            block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
        ]);
        let nanos = u32::from_le_bytes([block[8], block[9], block[10], block[11]]);
        let utc_offset = i32::from_le_bytes([block[12], block[13], block[14], block[15]]);

        let zone = FixedOffset::east_opt(utc_offset)
            .ok_or_else(|| CodecError::invalid_time(offset, format!("offset {utc_offset}s")))?;
        let instant = DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
            CodecError::invalid_time(offset, format!("{secs}s + {nanos}ns out of range"))
        })?;
        Ok(instant.with_timezone(&zone))
    }
}
