//! End-to-end tests across the encoder pool, frame reader and decoder.

use slogwire_codec::{
    decode_record, AnyValue, Attr, CodecError, CodecResult, EncoderPool, FrameReader, PoolConfig,
    Value, HEADER_LEN,
};
use slogwire_testkit::{sample_record, FailingWriter};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread;

/// A log sink shared between threads; each write lands whole.
#[derive(Clone, Default)]
struct SharedLog(Arc<Mutex<Vec<u8>>>);

impl Write for SharedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut log = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned"))?;
        log.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct UserId(u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{}", self.0)
    }
}

impl AnyValue for UserId {}

#[derive(Debug)]
struct Secret;

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("hunter2")
    }
}

impl AnyValue for Secret {
    fn marshal_text(&self) -> Option<CodecResult<String>> {
        Some(Err(CodecError::marshal("secrets are not logged")))
    }
}

#[test]
fn threads_share_a_pool_and_a_log() {
    let pool = Arc::new(EncoderPool::with_config(PoolConfig::new().max_idle(4)));
    let log = SharedLog::default();

    let handles: Vec<_> = (0..4i64)
        .map(|worker| {
            let pool = Arc::clone(&pool);
            let mut log = log.clone();
            thread::spawn(move || {
                for seq in 0..50i64 {
                    let mut encoder = pool.acquire();
                    encoder.append_attrs(&[
                        Attr::new("worker", worker),
                        Attr::new("seq", seq),
                    ]);
                    // Frame into a local buffer first so each frame is one write.
                    let mut frame = Vec::new();
                    encoder.finish(&mut frame).unwrap();
                    pool.release(encoder);
                    log.write_all(&frame).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let bytes = log.0.lock().unwrap().clone();
    let mut seen = vec![0i64; 4];
    for frame in FrameReader::new(&bytes[..]) {
        let attrs = frame.unwrap().to_attrs().unwrap();
        let worker = attrs[0].value.as_int().unwrap() as usize;
        assert_eq!(attrs[1].value.as_int(), Some(seen[worker]));
        seen[worker] += 1;
    }
    assert_eq!(seen, vec![50; 4]);
    assert!(pool.idle_count() <= 4);
}

#[test]
fn any_values_encode_as_strings() {
    let record = vec![Attr::new("user", Value::any(UserId(7)))];
    let bytes = slogwire_codec::encode_record(&record).unwrap();
    assert_eq!(
        decode_record(&bytes).unwrap(),
        vec![Attr::new("user", "user-7")]
    );
}

#[test]
fn marshal_failure_is_sticky_until_reset() {
    let pool = EncoderPool::new();
    let mut encoder = pool.acquire();
    encoder.append_key("secret");
    encoder.append_value(&Value::any(Secret));
    encoder.append_attrs(&sample_record());

    let mut out = Vec::new();
    let err = encoder.finish(&mut out).unwrap_err();
    assert!(matches!(err, CodecError::Marshal { .. }));
    assert!(out.is_empty());
    pool.release(encoder);

    let mut encoder = pool.acquire();
    encoder.append_attrs(&sample_record());
    encoder.finish(&mut out).unwrap();
    assert_eq!(decode_record(&out).unwrap(), sample_record());
}

#[test]
fn failed_write_leaves_a_detectable_partial_frame() {
    let mut encoder = slogwire_codec::Encoder::new();
    encoder.append_attrs(&sample_record());
    let mut sink = FailingWriter::crash_after(HEADER_LEN + 10);
    let err = encoder.finish(&mut sink).unwrap_err();
    assert_eq!(err.transferred(), Some(HEADER_LEN + 10));

    let mut reader = FrameReader::new(&sink.written[..]);
    assert!(matches!(reader.next(), Some(Err(CodecError::Io { .. }))));
    assert!(reader.next().is_none());
}
