//! Stress tests for the encoder pool and codec.
//!
//! These run many encode/decode cycles, optionally across threads sharing a
//! single [`EncoderPool`], and check every frame that comes back out.

use slogwire_codec::{decode_record, Attr, EncoderPool, FrameReader, PoolConfig, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of records to encode.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Length of the string value in each record.
    pub message_len: usize,
    /// Idle encoders kept by the pool.
    pub max_idle: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            message_len: 64,
            max_idle: 8,
        }
    }
}

/// The record written for operation `seq`.
pub fn stress_record(seq: usize, message_len: usize) -> Vec<Attr> {
    vec![
        Attr::new("seq", seq as u64),
        Attr::new("msg", "m".repeat(message_len)),
        Attr::new(
            "ctx",
            Value::group([("worker", Value::Int((seq % 7) as i64)), ("ok", Value::Bool(true))]),
        ),
    ]
}

fn encode_with_pool(pool: &EncoderPool, record: &[Attr]) -> Option<Vec<u8>> {
    let mut encoder = pool.acquire();
    encoder.append_attrs(record);
    let mut out = Vec::new();
    let result = encoder.finish(&mut out);
    pool.release(encoder);
    result.ok().map(|_| out)
}

/// Encode and decode records one at a time through a pool.
pub fn stress_sequential_roundtrips(config: &StressConfig) -> StressTestResult {
    let pool = EncoderPool::with_config(PoolConfig::new().max_idle(config.max_idle));

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for seq in 0..config.operations {
        let record = stress_record(seq, config.message_len);
        let ok = encode_with_pool(&pool, &record)
            .and_then(|bytes| decode_record(&bytes).ok())
            .is_some_and(|decoded| decoded == record);
        if ok {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Encode into one stream, then read every frame back with a [`FrameReader`].
pub fn stress_frame_stream(config: &StressConfig) -> StressTestResult {
    let pool = EncoderPool::new();
    let mut stream = Vec::new();
    for seq in 0..config.operations {
        if let Some(bytes) = encode_with_pool(&pool, &stress_record(seq, config.message_len)) {
            stream.extend_from_slice(&bytes);
        }
    }

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for (seq, frame) in FrameReader::new(&stream[..]).enumerate() {
        let ok = frame
            .and_then(|frame| frame.to_attrs())
            .is_ok_and(|attrs| attrs == stress_record(seq, config.message_len));
        if ok {
            successful += 1;
        } else {
            failed += 1;
        }
    }
    failed += config.operations.saturating_sub(successful + failed);

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Share one pool between threads, each encoding and checking its own records.
pub fn stress_concurrent_pool(config: &StressConfig) -> StressTestResult {
    let pool = Arc::new(EncoderPool::with_config(
        PoolConfig::new().max_idle(config.max_idle),
    ));
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let message_len = config.message_len;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let record = stress_record(t * ops_per_thread + i, message_len);
                    let ok = encode_with_pool(&pool, &record)
                        .and_then(|bytes| decode_record(&bytes).ok())
                        .is_some_and(|decoded| decoded == record);
                    if ok {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Encode records large enough to spill the encoder's inline buffer.
pub fn stress_large_records(config: &StressConfig) -> StressTestResult {
    let large = StressConfig {
        message_len: slogwire_codec::INLINE_CAPACITY * 4,
        ..config.clone()
    };
    stress_sequential_roundtrips(&large)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_roundtrips() {
        let config = StressConfig {
            operations: 1_000,
            ..Default::default()
        };

        let result = stress_sequential_roundtrips(&config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 1_000);
    }

    #[test]
    fn test_frame_stream() {
        let config = StressConfig {
            operations: 500,
            ..Default::default()
        };

        let result = stress_frame_stream(&config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 500);
    }

    #[test]
    fn test_concurrent_pool() {
        let config = StressConfig {
            operations: 2_000,
            threads: 8,
            max_idle: 2,
            ..Default::default()
        };

        let result = stress_concurrent_pool(&config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 2_000);
    }

    #[test]
    fn test_large_records() {
        let config = StressConfig {
            operations: 100,
            ..Default::default()
        };

        let result = stress_large_records(&config);
        assert_eq!(result.failed_ops, 0);
    }
}
