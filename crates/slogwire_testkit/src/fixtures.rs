//! Test fixtures: sample records, misbehaving I/O, and temporary log files.

use chrono::{FixedOffset, TimeDelta, TimeZone};
use slogwire_codec::{encode_record, Attr, Value};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tempfile::TempDir;

/// A record holding one value of every kind, with a nested group.
pub fn sample_record() -> Vec<Attr> {
    let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
    vec![
        Attr::new("msg", "request served"),
        Attr::new("status", 200i64),
        Attr::new("small", 7i64),
        Attr::new("neg", -3i64),
        Attr::new("trace_id", 0xFEED_BEEF_CAFE_F00Du64),
        Attr::new("ratio", 0.25f64),
        Attr::new("cached", false),
        Attr::new("ok", true),
        Attr::new("digest", vec![0xDEu8, 0xAD, 0xBE, 0xEF]),
        Attr::new("latency", TimeDelta::microseconds(1_250)),
        Attr::new(
            "at",
            offset
                .timestamp_opt(1_700_000_000, 5)
                .single()
                .expect("valid timestamp"),
        ),
        Attr::new(
            "req",
            Value::group([
                ("method", Value::from("GET")),
                ("path", Value::from("/health")),
                ("headers", Value::group([("accept", "*/*")])),
            ]),
        ),
    ]
}

/// A writer that accepts a fixed number of bytes and then fails.
#[derive(Debug, Default)]
pub struct FailingWriter {
    /// Bytes accepted so far.
    pub written: Vec<u8>,
    limit: usize,
}

impl FailingWriter {
    /// Creates a writer that fails once `limit` bytes have been accepted.
    pub fn crash_after(limit: usize) -> Self {
        Self {
            written: Vec::new(),
            limit,
        }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.limit.saturating_sub(self.written.len());
        if room == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A writer that accepts at most `chunk` bytes per call.
#[derive(Debug)]
pub struct ShortWriter {
    /// Bytes accepted so far.
    pub written: Vec<u8>,
    chunk: usize,
}

impl ShortWriter {
    /// Creates a writer with the given per-call limit.
    pub fn new(chunk: usize) -> Self {
        Self {
            written: Vec::new(),
            chunk: chunk.max(1),
        }
    }
}

impl Write for ShortWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A reader that hands out one byte per call and interrupts every other call.
#[derive(Debug)]
pub struct TrickleReader<'a> {
    data: &'a [u8],
    interrupt: bool,
}

impl<'a> TrickleReader<'a> {
    /// Wraps `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            interrupt: true,
        }
    }
}

impl Read for TrickleReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupt = !self.interrupt;
        if self.interrupt {
            return Err(io::ErrorKind::Interrupted.into());
        }
        match (self.data.split_first(), buf.first_mut()) {
            (Some((&byte, rest)), Some(slot)) => {
                *slot = byte;
                self.data = rest;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

/// A log file of back-to-back frames with automatic cleanup.
pub struct TempLog {
    /// Path of the log file.
    pub path: PathBuf,
    _temp_dir: TempDir,
}

impl TempLog {
    /// Writes `records` as consecutive frames into a fresh temporary file.
    pub fn with_records(records: &[Vec<Attr>]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("records.slog");
        let mut bytes = Vec::new();
        for record in records {
            bytes.extend(encode_record(record).expect("Failed to encode record"));
        }
        std::fs::write(&path, bytes).expect("Failed to write log file");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slogwire_codec::{decode, decode_record, CodecError, FrameReader, RecordCollector, HEADER_LEN};

    #[test]
    fn sample_record_roundtrips() {
        let record = sample_record();
        let bytes = encode_record(&record).unwrap();
        assert_eq!(decode_record(&bytes).unwrap(), record);
    }

    #[test]
    fn failing_writer_reports_transferred_bytes() {
        let mut encoder = slogwire_codec::Encoder::new();
        encoder.append_attrs(&sample_record());
        let mut sink = FailingWriter::crash_after(HEADER_LEN + 3);
        let err = encoder.finish(&mut sink).unwrap_err();
        assert!(err.is_io_error());
        assert_eq!(err.transferred(), Some(HEADER_LEN + 3));
        assert_eq!(sink.written.len(), HEADER_LEN + 3);
    }

    #[test]
    fn short_writes_are_continued() {
        let mut encoder = slogwire_codec::Encoder::new();
        encoder.append_attrs(&sample_record());
        let mut sink = ShortWriter::new(3);
        let n = encoder.finish(&mut sink).unwrap();
        assert_eq!(n, sink.written.len());
        assert_eq!(decode_record(&sink.written).unwrap(), sample_record());
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let bytes = encode_record(&sample_record()).unwrap();
        let mut collector = RecordCollector::new();
        decode(TrickleReader::new(&bytes), &mut collector).unwrap();
        assert_eq!(collector.finish(), sample_record());
    }

    #[test]
    fn truncated_trickle_is_an_io_error() {
        let bytes = encode_record(&sample_record()).unwrap();
        let cut = &bytes[..bytes.len() - 2];
        let mut collector = RecordCollector::new();
        let err = decode(TrickleReader::new(cut), &mut collector).unwrap_err();
        assert!(matches!(err, CodecError::Io { .. }));
    }

    #[test]
    fn temp_log_holds_frames() {
        let records = vec![sample_record(), vec![Attr::new("n", 1i64)]];
        let log = TempLog::with_records(&records);
        let file = std::fs::File::open(&log.path).unwrap();
        let read: Vec<_> = FrameReader::new(file)
            .map(|frame| frame.unwrap().to_attrs().unwrap())
            .collect();
        assert_eq!(read, records);
    }
}
