//! Owned frames and sequential frame reading.
//!
//! Log files and pipes usually carry frames back to back. [`FrameReader`]
//! walks such a stream one frame at a time, and [`Frame`] keeps the payload
//! alive so decoded keys and values can be borrowed from it for as long as
//! the caller holds on to the frame.

use std::io::{self, Read};

use crate::collect::RecordCollector;
use crate::decoder::{decode_payload_with, DecoderConfig};
use crate::encoder::payload_length;
use crate::error::{CodecError, CodecResult};
use crate::value::Attr;
use crate::visitor::Visitor;
use crate::wire::{self, HEADER_LEN, MAGIC};

/// Upper bound on the buffer reserved from a header's length field before
/// any payload bytes have arrived.
const PREALLOC_LIMIT: usize = 64 * 1024;

/// A validated frame header together with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    length: u32,
    payload: Vec<u8>,
}

impl Frame {
    /// Wrap an encoded payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::FrameTooLarge`] if the payload does not fit the
    /// 32-bit length field.
    pub fn from_payload(payload: Vec<u8>) -> CodecResult<Self> {
        let length = payload_length(payload.len())?;
        Ok(Self { length, payload })
    }

    /// Read exactly one frame from `source`.
    ///
    /// # Errors
    ///
    /// Fails on short reads (including an empty source) and on a bad magic
    /// number.
    pub fn read_from<R: Read>(source: R) -> CodecResult<Self> {
        Self::read_from_with(source, &DecoderConfig::default())
    }

    /// Like [`read_from`](Self::read_from), with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`read_from`](Self::read_from).
    pub fn read_from_with<R: Read>(mut source: R, config: &DecoderConfig) -> CodecResult<Self> {
        read_frame(&mut source, config)?
            .ok_or_else(|| CodecError::io(io::ErrorKind::UnexpectedEof.into(), 0))
    }

    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the frame, returning its payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Payload length as recorded in the header.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the frame carries no entries.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Size of the frame on the wire, header included.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Stream the payload's entries to `visitor`.
    ///
    /// # Errors
    ///
    /// Returns a format error if the payload is malformed.
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) -> CodecResult<()> {
        self.visit_with(visitor, &DecoderConfig::default())
    }

    /// Like [`visit`](Self::visit), with an explicit nesting limit.
    ///
    /// # Errors
    ///
    /// Returns a format error if the payload is malformed.
    pub fn visit_with<V: Visitor + ?Sized>(
        &self,
        visitor: &mut V,
        config: &DecoderConfig,
    ) -> CodecResult<()> {
        decode_payload_with(&self.payload, visitor, config)
    }

    /// Decode the payload into owned attributes.
    ///
    /// # Errors
    ///
    /// Returns a format error if the payload is malformed.
    pub fn to_attrs(&self) -> CodecResult<Vec<Attr>> {
        self.to_attrs_with(&DecoderConfig::default())
    }

    /// Like [`to_attrs`](Self::to_attrs), with an explicit nesting limit.
    ///
    /// # Errors
    ///
    /// Returns a format error if the payload is malformed.
    pub fn to_attrs_with(&self, config: &DecoderConfig) -> CodecResult<Vec<Attr>> {
        let mut collector = RecordCollector::new();
        self.visit_with(&mut collector, config)?;
        Ok(collector.finish())
    }

    /// The frame as it appears on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&wire::encode_header(self.length));
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Iterates over back-to-back frames in a byte stream.
///
/// Ends cleanly when the stream is exhausted exactly at a frame boundary.
/// A stream that stops inside a header or payload yields an error, after
/// which the reader is exhausted.
pub struct FrameReader<R> {
    source: R,
    config: DecoderConfig,
    position: u64,
    frames: u64,
    done: bool,
}

impl<R: Read> FrameReader<R> {
    /// Create a reader with the default configuration.
    pub fn new(source: R) -> Self {
        Self::with_config(source, DecoderConfig::default())
    }

    /// Create a reader with an explicit configuration.
    pub fn with_config(source: R, config: DecoderConfig) -> Self {
        Self {
            source,
            config,
            position: 0,
            frames: 0,
            done: false,
        }
    }

    /// Bytes consumed by successfully read frames.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames
    }

    /// Read the next frame, or `None` at a clean end of stream.
    ///
    /// # Errors
    ///
    /// Fails on a partial frame or a bad header.
    pub fn read_frame(&mut self) -> CodecResult<Option<Frame>> {
        if self.done {
            return Ok(None);
        }
        match read_frame(&mut self.source, &self.config) {
            Ok(Some(frame)) => {
                self.position += frame.encoded_len() as u64;
                self.frames += 1;
                Ok(Some(frame))
            }
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(err) => {
                self.done = true;
                Err(err)
            }
        }
    }

    /// Recover the underlying source.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = CodecResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Reads one frame. `Ok(None)` means the source was already at end of stream.
pub(crate) fn read_frame<R: Read + ?Sized>(
    source: &mut R,
    config: &DecoderConfig,
) -> CodecResult<Option<Frame>> {
    let mut header = [0u8; HEADER_LEN];
    let filled = fill(source, &mut header)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < HEADER_LEN {
        return Err(CodecError::io(
            io::Error::new(io::ErrorKind::UnexpectedEof, "frame header truncated"),
            filled,
        ));
    }

    let (magic, length) = wire::decode_header(&header);
    if magic != MAGIC {
        return Err(CodecError::InvalidMagic {
            expected: MAGIC,
            actual: magic,
        });
    }
    if length > config.max_payload_len {
        return Err(CodecError::PayloadTooLarge {
            size: length,
            max: config.max_payload_len,
        });
    }

    let len = length as usize;
    let mut payload = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    let result = Read::take(&mut *source, u64::from(length)).read_to_end(&mut payload);
    let transferred = HEADER_LEN + payload.len();
    match result {
        Err(err) => Err(CodecError::io(err, transferred)),
        Ok(_) if payload.len() < len => Err(CodecError::io(
            io::Error::new(io::ErrorKind::UnexpectedEof, "frame payload truncated"),
            transferred,
        )),
        Ok(_) => Ok(Some(Frame { length, payload })),
    }
}

/// Reads until `buf` is full or the source ends, returning the bytes read.
fn fill<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> CodecResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(CodecError::io(err, filled)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_record;
    use crate::value::Value;

    fn sample(n: i64) -> Vec<u8> {
        encode_record(&[Attr::new("n", n), Attr::new("msg", "hello")]).unwrap()
    }

    #[test]
    fn read_single_frame() {
        let bytes = sample(5);
        let frame = Frame::read_from(&bytes[..]).unwrap();
        assert_eq!(frame.encoded_len(), bytes.len());
        assert_eq!(frame.to_bytes(), bytes);
        assert_eq!(
            frame.to_attrs().unwrap(),
            vec![Attr::new("n", 5i64), Attr::new("msg", Value::from("hello"))]
        );
    }

    #[test]
    fn reader_walks_back_to_back_frames() {
        let mut stream = sample(1);
        stream.extend(sample(2));
        stream.extend(sample(300));

        let mut reader = FrameReader::new(&stream[..]);
        let values: Vec<i64> = reader
            .by_ref()
            .map(|frame| frame.unwrap().to_attrs().unwrap()[0].value.as_int().unwrap())
            .collect();
        assert_eq!(values, vec![1, 2, 300]);
        assert_eq!(reader.frames_read(), 3);
        assert_eq!(reader.position(), stream.len() as u64);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let mut reader = FrameReader::new(&[0u8; 0][..]);
        assert!(reader.next().is_none());
        assert!(matches!(
            Frame::read_from(&[0u8; 0][..]),
            Err(CodecError::Io { transferred: 0, .. })
        ));
    }

    #[test]
    fn truncated_header_is_an_error() {
        let bytes = sample(1);
        let mut reader = FrameReader::new(&bytes[..5]);
        assert!(matches!(
            reader.next(),
            Some(Err(CodecError::Io { transferred: 5, .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let bytes = sample(1);
        let cut = &bytes[..bytes.len() - 1];
        let err = Frame::read_from(cut).unwrap_err();
        assert_eq!(err.transferred(), Some(bytes.len() - 1));
    }

    #[test]
    fn bad_magic_is_a_format_error() {
        let mut bytes = sample(1);
        bytes[0] ^= 0xFF;
        let err = Frame::read_from(&bytes[..]).unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, CodecError::InvalidMagic { expected: MAGIC, .. }));
    }

    #[test]
    fn payload_limit_is_enforced() {
        let bytes = sample(1);
        let config = DecoderConfig::new().max_payload_len(4);
        assert!(matches!(
            Frame::read_from_with(&bytes[..], &config),
            Err(CodecError::PayloadTooLarge { max: 4, .. })
        ));
    }

    #[test]
    fn lying_header_does_not_preallocate() {
        let mut bytes = wire::encode_header(u32::MAX).to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        let err = Frame::read_from(&bytes[..]).unwrap_err();
        assert_eq!(err.transferred(), Some(HEADER_LEN + 16));
    }
}
