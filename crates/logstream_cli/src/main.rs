//! Logstream CLI
//!
//! Command-line tools for writing log files through logstream streams.
//!
//! # Commands
//!
//! - `write` - Copy a file into a log stream
//! - `truncate` - Cut a log file at an offset
//! - `compress` - Compress a file through a compressing stream

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Logstream command-line tools.
#[derive(Parser)]
#[command(name = "logstream")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Stream variant to write through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Buffered writes through a write cache
    Cache,
    /// Memory copies into a mapped file
    Mmap,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a file into a log stream
    Write {
        /// Stream variant to use
        #[arg(short, long, value_enum, default_value = "cache")]
        backend: Backend,

        /// File to read from
        #[arg(short, long)]
        input: PathBuf,

        /// Log file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Write cache size in bytes (cache backend)
        #[arg(long, default_value_t = logstream_storage::DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,

        /// Mapping length in bytes (mmap backend, defaults to the input size)
        #[arg(long)]
        mapping_len: Option<u64>,

        /// Bytes per write call
        #[arg(long, default_value = "4096")]
        chunk_size: usize,

        /// Sync after this many writes (0 = only at the end)
        #[arg(long, default_value = "0")]
        sync_every: usize,
    },

    /// Cut a log file at an offset
    Truncate {
        /// Log file to cut
        #[arg(short, long)]
        output: PathBuf,

        /// New length of the file
        #[arg(long)]
        offset: u64,
    },

    /// Compress a file through a compressing stream
    Compress {
        /// File to read from
        #[arg(short, long)]
        input: PathBuf,

        /// File to write the zstd frame to
        #[arg(short, long)]
        output: PathBuf,

        /// Compression level
        #[arg(short, long, default_value_t = logstream_storage::DEFAULT_ZSTD_LEVEL)]
        level: i32,

        /// Bytes per write call
        #[arg(long, default_value = "16384")]
        chunk_size: usize,
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
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Write {
            backend,
            input,
            output,
            buffer_size,
            mapping_len,
            chunk_size,
            sync_every,
        } => {
            let options = commands::write::WriteOptions {
                backend,
                buffer_size,
                mapping_len,
                chunk_size,
                sync_every,
            };
            commands::write::run(&input, &output, &options)?;
        }
        Commands::Truncate { output, offset } => {
            commands::truncate::run(&output, offset)?;
        }
        Commands::Compress {
            input,
            output,
            level,
            chunk_size,
        } => {
            commands::compress::run(&input, &output, level, chunk_size)?;
        }
        Commands::Version => {
            println!("logstream CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
