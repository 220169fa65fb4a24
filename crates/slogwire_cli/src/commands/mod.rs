//! CLI command implementations.

pub mod dump;
pub mod encode;
pub mod json;
pub mod stats;
pub mod verify;

use slogwire_codec::{CodecError, DecoderConfig, FrameReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a file failed.
    #[error("{path}: {source}")]
    File {
        /// The file involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing command output failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    /// A frame failed to decode.
    #[error("frame {index} at offset {offset}: {source}")]
    Frame {
        /// Zero-based frame index.
        index: u64,
        /// Byte offset of the frame in the file.
        offset: u64,
        /// Underlying error.
        #[source]
        source: CodecError,
    },

    /// Encoding a record failed.
    #[error("record {index}: {source}")]
    Encode {
        /// Zero-based record index.
        index: usize,
        /// Underlying error.
        #[source]
        source: CodecError,
    },

    /// JSON input or output failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON input had a shape that cannot become a record.
    #[error("invalid input: {0}")]
    Input(String),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Output format for commands that print data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Open a frame file for sequential reading.
pub(crate) fn open_frames(
    path: &Path,
    config: &DecoderConfig,
) -> CliResult<FrameReader<BufReader<File>>> {
    let file = File::open(path).map_err(|source| CliError::File {
        path: path.display().to_string(),
        source,
    })?;
    Ok(FrameReader::with_config(BufReader::new(file), config.clone()))
}
