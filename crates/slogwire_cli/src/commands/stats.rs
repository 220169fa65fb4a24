//! Stats command implementation.

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Serialize;
use slogwire_codec::{DecoderConfig, ValueKind, Visitor};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use super::{open_frames, CliError, CliResult, OutputFormat};

/// Summary of a frame file.
#[derive(Debug, Default, Serialize)]
pub struct FileStats {
    /// Number of frames.
    pub frames: u64,
    /// Payload bytes across all frames, headers excluded.
    pub payload_bytes: u64,
    /// Largest single payload.
    pub largest_payload: u64,
    /// Entries across all frames, group headers and children included.
    pub entries: u64,
    /// Deepest group nesting seen.
    pub max_depth: usize,
    /// Entries per value kind.
    pub kinds: BTreeMap<String, u64>,
}

/// Tallies kinds and tracks group depth for one frame.
#[derive(Default)]
struct KindTally {
    kinds: BTreeMap<ValueKind, u64>,
    // Remaining child entries of each open group.
    open: Vec<usize>,
    max_depth: usize,
}

impl KindTally {
    fn count(&mut self, kind: ValueKind) {
        *self.kinds.entry(kind).or_default() += 1;
        // Every entry, groups included, fills one slot of its parent.
        if let Some(remaining) = self.open.last_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    fn record(&mut self, kind: ValueKind) {
        self.count(kind);
        self.close_complete();
    }

    fn close_complete(&mut self) {
        while self.open.last() == Some(&0) {
            self.open.pop();
        }
    }
}

impl Visitor for KindTally {
    fn int(&mut self, _key: &[u8], _value: i64) {
        self.record(ValueKind::Int);
    }

    fn uint(&mut self, _key: &[u8], _value: u64) {
        self.record(ValueKind::Uint);
    }

    fn string(&mut self, _key: &[u8], _value: &[u8]) {
        self.record(ValueKind::String);
    }

    fn bytes(&mut self, _key: &[u8], _value: &[u8]) {
        self.record(ValueKind::Bytes);
    }

    fn bool(&mut self, _key: &[u8], _value: bool) {
        self.record(ValueKind::Bool);
    }

    fn float(&mut self, _key: &[u8], _value: f64) {
        self.record(ValueKind::Float);
    }

    fn duration(&mut self, _key: &[u8], _value: TimeDelta) {
        self.record(ValueKind::Duration);
    }

    fn time(&mut self, _key: &[u8], _value: DateTime<FixedOffset>) {
        self.record(ValueKind::Time);
    }

    fn group(&mut self, _key: &[u8], count: usize) {
        self.count(ValueKind::Group);
        if count / 2 > 0 {
            self.open.push(count / 2);
            self.max_depth = self.max_depth.max(self.open.len());
        } else {
            self.close_complete();
        }
    }
}

/// Collect statistics for every frame in a file.
pub fn collect_stats(path: &Path, config: &DecoderConfig) -> CliResult<FileStats> {
    let mut reader = open_frames(path, config)?;
    let mut stats = FileStats::default();
    let mut kinds: BTreeMap<ValueKind, u64> = BTreeMap::new();

    loop {
        let offset = reader.position();
        let frame = match reader.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(source) => {
                return Err(CliError::Frame {
                    index: stats.frames,
                    offset,
                    source,
                })
            }
        };
        let mut tally = KindTally::default();
        frame.visit_with(&mut tally, config).map_err(|source| CliError::Frame {
            index: stats.frames,
            offset,
            source,
        })?;

        let len = frame.len() as u64;
        stats.frames += 1;
        stats.payload_bytes += len;
        stats.largest_payload = stats.largest_payload.max(len);
        stats.max_depth = stats.max_depth.max(tally.max_depth);
        for (kind, count) in tally.kinds {
            stats.entries += count;
            *kinds.entry(kind).or_default() += count;
        }
    }

    stats.kinds = kinds
        .into_iter()
        .map(|(kind, count)| (kind.as_str().to_string(), count))
        .collect();
    Ok(stats)
}

/// Runs the stats command.
pub fn run(
    path: &Path,
    format: OutputFormat,
    config: &DecoderConfig,
    out: &mut dyn Write,
) -> CliResult<()> {
    let stats = collect_stats(path, config)?;

    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
        }
        OutputFormat::Text => {
            writeln!(out, "Frame File Statistics")?;
            writeln!(out, "=====================")?;
            writeln!(out, "Path: {:?}", path)?;
            writeln!(out, "Frames: {}", stats.frames)?;
            writeln!(out, "Payload bytes: {}", stats.payload_bytes)?;
            writeln!(out, "Largest payload: {}", stats.largest_payload)?;
            writeln!(out, "Entries: {}", stats.entries)?;
            writeln!(out, "Max group depth: {}", stats.max_depth)?;
            if !stats.kinds.is_empty() {
                writeln!(out)?;
                writeln!(out, "Kinds:")?;
                for (kind, count) in &stats.kinds {
                    writeln!(out, "  {:<10} {}", kind, count)?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slogwire_codec::{Attr, Value};
    use slogwire_testkit::{sample_record, TempLog};

    #[test]
    fn counts_kinds_and_depth() {
        let log = TempLog::with_records(&[sample_record()]);
        let stats = collect_stats(&log.path, &DecoderConfig::default()).unwrap();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.entries, 16);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.kinds["string"], 4);
        assert_eq!(stats.kinds["int"], 3);
        assert_eq!(stats.kinds["group"], 2);
        assert_eq!(stats.kinds["bool"], 2);
        assert_eq!(stats.kinds["uint"], 1);
    }

    #[test]
    fn depth_closes_with_groups() {
        let record = vec![
            Attr::new("a", Value::group([("x", 1i64)])),
            Attr::new("b", Value::group([("y", 2i64)])),
            Attr::new("e", Value::Group(vec![])),
        ];
        let log = TempLog::with_records(&[record]);
        let stats = collect_stats(&log.path, &DecoderConfig::default()).unwrap();
        assert_eq!(stats.max_depth, 1);
        assert_eq!(stats.kinds["group"], 3);
    }

    #[test]
    fn payload_totals() {
        let records = vec![vec![Attr::new("n", 5i64)], vec![Attr::new("big", 1000i64)]];
        let log = TempLog::with_records(&records);
        let stats = collect_stats(&log.path, &DecoderConfig::default()).unwrap();
        assert_eq!(stats.payload_bytes, 4 + 8);
        assert_eq!(stats.largest_payload, 8);
    }

    #[test]
    fn json_output_parses() {
        let log = TempLog::with_records(&[sample_record()]);
        let mut out = Vec::new();
        run(&log.path, OutputFormat::Json, &DecoderConfig::default(), &mut out).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["frames"], 1);
        assert_eq!(parsed["kinds"]["duration"], 1);
    }
}
