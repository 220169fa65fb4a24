//! # slogwire testkit
//!
//! Test utilities for slogwire.
//!
//! This crate provides:
//! - Sample records, misbehaving readers and writers, and temporary log files
//! - Property-based test generators using proptest
//! - Fuzz testing harnesses
//! - Stress testing utilities for the encoder pool
//! - Wire format test vectors
//!
//! ## Usage
//!
//! ```rust
//! use slogwire_testkit::prelude::*;
//! use slogwire_codec::{decode_record, encode_record};
//!
//! let record = sample_record();
//! let bytes = encode_record(&record).unwrap();
//! assert_eq!(decode_record(&bytes).unwrap(), record);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use stress::*;
pub use vectors::*;
