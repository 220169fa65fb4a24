//! slogwire CLI
//!
//! Command-line tools for files of back-to-back slogwire frames.
//!
//! # Commands
//!
//! - `dump` - Print every record as text or JSON
//! - `verify` - Check that every frame decodes
//! - `stats` - Count frames, bytes and values per kind
//! - `encode` - Append records from a JSON file as frames

mod commands;

use clap::{Parser, Subcommand};
use slogwire_codec::DecoderConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::OutputFormat;

/// slogwire command-line log tools.
#[derive(Parser)]
#[command(name = "slogwire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Reject frames whose payload exceeds this many bytes
    #[arg(global = true, long, value_name = "BYTES")]
    max_payload: Option<u32>,

    /// Reject records whose groups nest deeper than this
    #[arg(global = true, long, value_name = "DEPTH")]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every record in a frame file
    Dump {
        /// File of concatenated frames
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Check that every frame in a file decodes
    Verify {
        /// File of concatenated frames
        file: PathBuf,
    },

    /// Summarize the frames in a file
    Stats {
        /// File of concatenated frames
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Append records from a JSON file as frames
    Encode {
        /// JSON record, or array of records, each an object or [key, value] pairs
        input: PathBuf,

        /// Frame file to append to (created if missing)
        output: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = DecoderConfig::new();
    if let Some(max) = cli.max_payload {
        config = config.max_payload_len(max);
    }
    if let Some(depth) = cli.max_depth {
        config = config.max_depth(depth);
    }
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Dump {
            file,
            format,
            limit,
        } => {
            commands::dump::run(&file, format, limit, &config, &mut out)?;
        }
        Commands::Verify { file } => {
            commands::verify::run(&file, &config, &mut out)?;
        }
        Commands::Stats { file, format } => {
            commands::stats::run(&file, format, &config, &mut out)?;
        }
        Commands::Encode { input, output } => {
            commands::encode::run(&input, &output, &mut out)?;
        }
        Commands::Version => {
            println!("slogwire CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("frame magic 0x{:08x}", slogwire_codec::MAGIC);
        }
    }

    Ok(())
}
