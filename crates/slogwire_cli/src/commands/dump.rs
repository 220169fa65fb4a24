//! Dump command implementation.

use serde::Serialize;
use slogwire_codec::{Attr, DecoderConfig, Value};
use std::io::Write;
use std::path::Path;

use super::json::{hex_encode, record_to_json};
use super::{open_frames, CliError, CliResult, OutputFormat};

/// A decoded frame for output.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Byte offset of the frame in the file.
    pub offset: u64,
    /// Payload size in bytes.
    pub payload_size: usize,
    /// The decoded attributes.
    pub attrs: serde_json::Value,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    format: OutputFormat,
    limit: Option<usize>,
    config: &DecoderConfig,
    out: &mut dyn Write,
) -> CliResult<()> {
    let mut reader = open_frames(path, config)?;
    let max_records = limit.unwrap_or(usize::MAX);
    let mut records = Vec::new();

    while records.len() < max_records {
        let offset = reader.position();
        let index = reader.frames_read();
        let frame = match reader.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(source) => return Err(CliError::Frame { index, offset, source }),
        };
        let attrs = frame
            .to_attrs_with(config)
            .map_err(|source| CliError::Frame { index, offset, source })?;
        tracing::debug!(index, offset, len = frame.len(), "decoded frame");
        records.push((offset, frame.len(), attrs));
    }

    match format {
        OutputFormat::Json => {
            let infos: Vec<RecordInfo> = records
                .iter()
                .map(|(offset, payload_size, attrs)| RecordInfo {
                    offset: *offset,
                    payload_size: *payload_size,
                    attrs: record_to_json(attrs),
                })
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&infos)?)?;
        }
        OutputFormat::Text => {
            writeln!(out, "Records ({} total)", records.len())?;
            writeln!(out, "================")?;
            for (offset, payload_size, attrs) in &records {
                writeln!(out)?;
                writeln!(out, "[{:08}] {} bytes", offset, payload_size)?;
                print_attrs(out, attrs, 1)?;
            }
        }
    }

    Ok(())
}

fn print_attrs(out: &mut dyn Write, attrs: &[Attr], depth: usize) -> std::io::Result<()> {
    let indent = "  ".repeat(depth);
    for attr in attrs {
        match &attr.value {
            Value::Group(children) => {
                writeln!(out, "{indent}{}:", attr.key)?;
                print_attrs(out, children, depth + 1)?;
            }
            value => writeln!(out, "{indent}{} = {}", attr.key, format_scalar(value))?,
        }
    }
    Ok(())
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Uint(n) => format!("{n}u"),
        Value::Float(f) => format!("{f:?}"),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Bytes(b) => format!("0x{}", hex_encode(b)),
        Value::Duration(d) => match d.num_nanoseconds() {
            Some(nanos) => format!("{nanos}ns"),
            None => d.to_string(),
        },
        Value::Time(t) => t.to_rfc3339(),
        Value::Group(attrs) => format!("{{{} attrs}}", attrs.len()),
        Value::Any(any) => format!("{:?}", any.to_string()),
    }
}
