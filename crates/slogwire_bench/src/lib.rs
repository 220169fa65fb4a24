//! Shared helpers for the slogwire benchmarks.

pub mod utils;
