//! Recycling store for encoders.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::encoder::Encoder;

/// Configuration for an [`EncoderPool`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of idle encoders kept for reuse. `None` keeps all.
    pub max_idle: Option<usize>,

    /// Number of encoders created up front.
    pub prefill: usize,
}

impl PoolConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the number of idle encoders.
    #[must_use]
    pub const fn max_idle(mut self, max: usize) -> Self {
        self.max_idle = Some(max);
        self
    }

    /// Sets how many encoders to create up front.
    #[must_use]
    pub const fn prefill(mut self, count: usize) -> Self {
        self.prefill = count;
        self
    }
}

/// Pool counters.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct PoolStats {
    created: AtomicU64,
    reused: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
}

impl PoolStats {
    /// Encoders allocated because the pool was empty (including prefill).
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Acquisitions served from an idle encoder.
    pub fn reused(&self) -> u64 {
        self.reused.load(Ordering::Relaxed)
    }

    /// Encoders handed back through [`EncoderPool::release`].
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Released encoders dropped because the pool was full.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

/// A thread-safe pool of reusable [`Encoder`]s.
///
/// Acquisition and release may happen from any thread. An acquired encoder
/// belongs to its caller until it is released; releasing moves it back into
/// the pool, so it cannot be used afterwards.
///
/// ```
/// use slogwire_codec::{EncoderPool, Value};
///
/// let pool = EncoderPool::new();
/// let mut encoder = pool.acquire();
/// encoder.append_key("n");
/// encoder.append_value(&Value::Int(5));
/// let mut out = Vec::new();
/// encoder.finish(&mut out).unwrap();
/// pool.release(encoder);
/// assert_eq!(pool.idle_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct EncoderPool {
    idle: Mutex<Vec<Box<Encoder>>>,
    config: PoolConfig,
    stats: PoolStats,
}

impl EncoderPool {
    /// Create an unbounded pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool with an explicit configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        let pool = Self {
            idle: Mutex::new(Vec::with_capacity(config.prefill)),
            stats: PoolStats::default(),
            config,
        };
        {
            let mut idle = pool.idle.lock();
            for _ in 0..pool.config.prefill {
                pool.stats.created.fetch_add(1, Ordering::Relaxed);
                idle.push(Box::default());
            }
        }
        pool
    }

    /// Take an encoder with an empty buffer and no recorded error.
    pub fn acquire(&self) -> Box<Encoder> {
        let recycled = self.idle.lock().pop();
        match recycled {
            Some(mut encoder) => {
                self.stats.reused.fetch_add(1, Ordering::Relaxed);
                encoder.reset();
                encoder
            }
            None => {
                self.stats.created.fetch_add(1, Ordering::Relaxed);
                Box::default()
            }
        }
    }

    /// Return an encoder for reuse.
    pub fn release(&self, encoder: Box<Encoder>) {
        self.stats.released.fetch_add(1, Ordering::Relaxed);
        let mut idle = self.idle.lock();
        if self.config.max_idle.is_some_and(|max| idle.len() >= max) {
            drop(idle);
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }
        idle.push(encoder);
    }

    /// Number of encoders waiting to be reused.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// The pool's counters.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// The pool's configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}
