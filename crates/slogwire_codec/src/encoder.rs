//! Record encoder.

use std::io::{self, Write};

use chrono::{DateTime, FixedOffset};

use crate::buffer::RecordBuffer;
use crate::error::{CodecError, CodecResult};
use crate::value::{Attr, Value};
use crate::wire::{self, Opcode, MAX_VARINT_LEN, TIME_LEN};

/// Encode a whole record into a freshly allocated frame.
///
/// # Errors
///
/// Returns an error if a value fails to marshal or the record is too large
/// for the 32-bit length field.
pub fn encode_record<'a, I>(attrs: I) -> CodecResult<Vec<u8>>
where
    I: IntoIterator<Item = &'a Attr>,
{
    let mut encoder = Encoder::new();
    encoder.append_attrs(attrs);
    let mut out = Vec::with_capacity(wire::HEADER_LEN + encoder.len());
    encoder.finish(&mut out)?;
    Ok(out)
}

/// Builds one framed record.
///
/// Keys and values are appended in pairs; [`finish`](Self::finish) then
/// writes the header and payload to a sink. Marshaling failures are sticky:
/// they are remembered and reported by `finish` instead of by each append.
///
/// Encoders are normally obtained from an [`EncoderPool`](crate::EncoderPool)
/// so their buffers are recycled between records.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: RecordBuffer,
    error: Option<String>,
}

impl Encoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard any appended data and clear the error flag.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.error = None;
    }

    /// Number of payload bytes appended so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The payload bytes appended so far, without the frame header.
    pub fn payload(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// The sticky marshaling error, if one has been recorded.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Append an attribute key.
    pub fn append_key(&mut self, key: &str) {
        self.encode_str(key);
    }

    /// Append one value. Must follow exactly one [`append_key`](Self::append_key).
    pub fn append_value(&mut self, value: &Value) {
        match value {
            Value::Int(n) => self.encode_int(*n),
            Value::Uint(n) => self.encode_uint(*n),
            Value::Float(f) => self.encode_float(*f),
            Value::Bool(b) => self.encode_bool(*b),
            Value::String(s) => self.encode_str(s),
            Value::Bytes(b) => self.encode_bytes(b),
            Value::Duration(d) => match d.num_nanoseconds() {
                Some(nanos) => {
                    self.encode_op(Opcode::Duration);
                    self.encode_int(nanos);
                }
                None => self.fail(format!("duration {d} overflows i64 nanoseconds")),
            },
            Value::Time(t) => self.encode_time(t),
            Value::Group(attrs) => {
                self.encode_op(Opcode::Group);
                self.encode_len(attrs.len() * 2);
                self.append_attrs(attrs);
            }
            Value::Any(any) => match any.marshal_text() {
                Some(Ok(text)) => self.encode_str(&text),
                Some(Err(CodecError::Marshal { message })) => self.fail(message),
                Some(Err(err)) => self.fail(err.to_string()),
                None => self.encode_str(&any.to_string()),
            },
        }
    }

    /// Append a key followed by its value.
    pub fn append_attr(&mut self, attr: &Attr) {
        self.append_key(&attr.key);
        self.append_value(&attr.value);
    }

    /// Append every attribute in order.
    pub fn append_attrs<'a, I>(&mut self, attrs: I)
    where
        I: IntoIterator<Item = &'a Attr>,
    {
        for attr in attrs {
            self.append_attr(attr);
        }
    }

    /// Write the framed record to `sink`, returning the total bytes written.
    ///
    /// Nothing is written if a marshaling error was recorded or the payload
    /// exceeds `u32::MAX` bytes. The header and the payload are written as two
    /// pieces; a failed or zero-length write stops immediately and the error
    /// carries the number of bytes already written. Failed writes are not
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Marshal`], [`CodecError::FrameTooLarge`] or
    /// [`CodecError::Io`].
    pub fn finish<W: Write + ?Sized>(&self, sink: &mut W) -> CodecResult<usize> {
        if let Some(message) = &self.error {
            return Err(CodecError::marshal(message.clone()));
        }
        let payload = self.buf.as_slice();
        let length = payload_length(payload.len())?;

        let header = wire::encode_header(length);
        let mut written = 0;
        write_piece(sink, &header, &mut written)?;
        write_piece(sink, payload, &mut written)?;
        Ok(written)
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }

    fn encode_op(&mut self, op: Opcode) {
        self.buf.push(op.as_byte());
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn encode_int(&mut self, n: i64) {
        if wire::is_small_int(n) {
            self.buf.push(n as u8);
        } else {
            self.encode_op(Opcode::Int);
            self.encode_varint(wire::zigzag(n));
        }
    }

    fn encode_len(&mut self, len: usize) {
        // usize lengths above i64::MAX cannot exist in memory.
        self.encode_int(i64::try_from(len).unwrap_or(i64::MAX));
    }

    fn encode_uint(&mut self, n: u64) {
        self.encode_op(Opcode::Uint);
        self.encode_varint(n);
    }

    fn encode_varint(&mut self, n: u64) {
        let mut scratch = [0u8; MAX_VARINT_LEN];
        let used = wire::put_uvarint(&mut scratch, n);
        self.buf.extend_from_slice(&scratch[..used]);
    }

    fn encode_float(&mut self, f: f64) {
        self.encode_op(Opcode::Float);
        self.buf.extend_from_slice(&f.to_bits().to_le_bytes());
    }

    fn encode_bool(&mut self, b: bool) {
        self.encode_op(if b { Opcode::True } else { Opcode::False });
    }

    fn encode_str(&mut self, s: &str) {
        self.encode_op(Opcode::String);
        self.encode_len(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn encode_bytes(&mut self, b: &[u8]) {
        self.encode_op(Opcode::Bytes);
        self.encode_len(b.len());
        self.buf.extend_from_slice(b);
    }

    fn encode_time(&mut self, t: &DateTime<FixedOffset>) {
        self.encode_op(Opcode::Time);
        self.buf.extend_from_slice(&encode_time_block(t));
    }
}

/// Lays out a timestamp as seconds, nanoseconds and offset seconds.
fn encode_time_block(t: &DateTime<FixedOffset>) -> [u8; TIME_LEN] {
    let mut block = [0u8; TIME_LEN];
    block[..8].copy_from_slice(&t.timestamp().to_le_bytes());
    block[8..12].copy_from_slice(&t.timestamp_subsec_nanos().to_le_bytes());
    block[12..].copy_from_slice(&t.offset().local_minus_utc().to_le_bytes());
    block
}

/// Checks that a payload fits the header's length field.
pub(crate) fn payload_length(len: usize) -> CodecResult<u32> {
    u32::try_from(len).map_err(|_| CodecError::FrameTooLarge { size: len })
}

fn write_piece<W: Write + ?Sized>(
    sink: &mut W,
    mut data: &[u8],
    written: &mut usize,
) -> CodecResult<()> {
    while !data.is_empty() {
        match sink.write(data) {
            Ok(0) => {
                return Err(CodecError::io(
                    io::Error::new(io::ErrorKind::WriteZero, "sink accepted no bytes"),
                    *written,
                ))
            }
            Ok(n) => {
                *written += n;
                data = &data[n..];
            }
            Err(err) => return Err(CodecError::io(err, *written)),
        }
    }
    Ok(())
}
