//! Verify command implementation.

use chrono::{DateTime, FixedOffset, TimeDelta};
use slogwire_codec::{DecoderConfig, Visitor};
use std::io::Write;
use std::path::Path;

use super::{open_frames, CliError, CliResult};

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of frames that decoded cleanly.
    pub valid_frames: u64,
    /// Bytes covered by valid frames.
    pub valid_bytes: u64,
    /// Entries seen across all valid frames.
    pub entries: u64,
}

/// Counts entries without keeping them.
#[derive(Default)]
struct EntryCounter {
    entries: u64,
}

impl Visitor for EntryCounter {
    fn int(&mut self, _key: &[u8], _value: i64) {
        self.entries += 1;
    }

    fn uint(&mut self, _key: &[u8], _value: u64) {
        self.entries += 1;
    }

    fn string(&mut self, _key: &[u8], _value: &[u8]) {
        self.entries += 1;
    }

    fn bytes(&mut self, _key: &[u8], _value: &[u8]) {
        self.entries += 1;
    }

    fn bool(&mut self, _key: &[u8], _value: bool) {
        self.entries += 1;
    }

    fn float(&mut self, _key: &[u8], _value: f64) {
        self.entries += 1;
    }

    fn duration(&mut self, _key: &[u8], _value: TimeDelta) {
        self.entries += 1;
    }

    fn time(&mut self, _key: &[u8], _value: DateTime<FixedOffset>) {
        self.entries += 1;
    }

    fn group(&mut self, _key: &[u8], _count: usize) {
        self.entries += 1;
    }
}

/// Decode every frame, stopping at the first failure.
pub fn verify_frames(path: &Path, config: &DecoderConfig) -> CliResult<VerifyResult> {
    let mut reader = open_frames(path, config)?;
    let mut result = VerifyResult::default();

    loop {
        let offset = reader.position();
        let frame = match reader.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(source) => {
                return Err(CliError::Frame {
                    index: result.valid_frames,
                    offset,
                    source,
                })
            }
        };
        let mut counter = EntryCounter::default();
        frame.visit_with(&mut counter, config).map_err(|source| CliError::Frame {
            index: result.valid_frames,
            offset,
            source,
        })?;
        result.valid_frames += 1;
        result.valid_bytes += frame.encoded_len() as u64;
        result.entries += counter.entries;
    }

    Ok(result)
}

/// Runs the verify command.
pub fn run(path: &Path, config: &DecoderConfig, out: &mut dyn Write) -> CliResult<()> {
    writeln!(out, "Verifying {:?}", path)?;

    match verify_frames(path, config) {
        Ok(result) => {
            writeln!(out, "  Frames: {}", result.valid_frames)?;
            writeln!(out, "  Bytes: {}", result.valid_bytes)?;
            writeln!(out, "  Entries: {}", result.entries)?;
            writeln!(out, "✓ Verification passed")?;
            Ok(())
        }
        Err(err) => {
            tracing::warn!(error = %err, "verification failed");
            writeln!(out, "✗ Verification failed: {}", err)?;
            Err(err)
        }
    }
}
