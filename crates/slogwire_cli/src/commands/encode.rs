//! Encode command implementation.

use slogwire_codec::{EncoderPool, PoolConfig};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::json::records_from_json;
use super::{CliError, CliResult};

/// Runs the encode command.
pub fn run(input: &Path, output: &Path, out: &mut dyn Write) -> CliResult<()> {
    let text = fs::read_to_string(input).map_err(|source| file_error(input, source))?;
    let doc: serde_json::Value = serde_json::from_str(&text)?;
    let records = records_from_json(&doc)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output)
        .map_err(|source| file_error(output, source))?;
    let mut sink = BufWriter::new(file);

    // Records are encoded one after another, so one idle encoder suffices.
    let pool = EncoderPool::with_config(PoolConfig::new().max_idle(1).prefill(1));
    let mut written = 0usize;
    for (index, record) in records.iter().enumerate() {
        let mut encoder = pool.acquire();
        encoder.append_attrs(record);
        let result = encoder.finish(&mut sink);
        pool.release(encoder);
        let n = result.map_err(|source| CliError::Encode { index, source })?;
        tracing::debug!(index, bytes = n, "encoded record");
        written += n;
    }
    sink.flush().map_err(|source| file_error(output, source))?;

    writeln!(
        out,
        "Encoded {} records ({} bytes) into {:?}",
        records.len(),
        written,
        output
    )?;
    Ok(())
}

fn file_error(path: &Path, source: std::io::Error) -> CliError {
    CliError::File {
        path: path.display().to_string(),
        source,
    }
}
