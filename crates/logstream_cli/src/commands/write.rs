//! Write command implementation.

use crate::Backend;
use logstream_storage::{
    BasicOutputStream, CacheConfig, LogStream, MmapConfig, TruncatableOutputStream,
};
use std::path::Path;
use tracing::{debug, info};

/// Options for the write command.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Stream variant to use.
    pub backend: Backend,
    /// Write cache size for the cache backend.
    pub buffer_size: usize,
    /// Mapping length for the mmap backend; the input size if unset.
    pub mapping_len: Option<u64>,
    /// Bytes per write call.
    pub chunk_size: usize,
    /// Sync after this many writes; 0 syncs only at the end.
    pub sync_every: usize,
}

/// Write statistics.
#[derive(Debug, PartialEq, Eq)]
pub struct WriteStats {
    /// Bytes written.
    pub bytes: u64,
    /// Write calls issued.
    pub writes: usize,
    /// Sync calls issued.
    pub syncs: usize,
}

/// Runs the write command.
pub fn run(
    input: &Path,
    output: &Path,
    options: &WriteOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let stats = copy_into_stream(&data, output, options)?;

    println!("Wrote {:?}", output);
    println!("  Backend: {:?}", options.backend);
    println!("  Bytes:   {}", stats.bytes);
    println!("  Writes:  {}", stats.writes);
    println!("  Syncs:   {}", stats.syncs);

    Ok(())
}

/// Writes `data` to a new stream at `output` and closes it.
pub fn copy_into_stream(
    data: &[u8],
    output: &Path,
    options: &WriteOptions,
) -> Result<WriteStats, Box<dyn std::error::Error>> {
    if options.chunk_size == 0 {
        return Err("chunk size must be greater than zero".into());
    }

    let mut stream = match options.backend {
        Backend::Cache => {
            let config = CacheConfig::new().buffer_size(options.buffer_size);
            LogStream::open_cached(output, &config)?
        }
        Backend::Mmap => {
            let len = options.mapping_len.unwrap_or(data.len() as u64).max(1);
            LogStream::open_mapped(output, &MmapConfig::new().mapping_len(len))?
        }
    };
    info!(path = %output.display(), backend = ?options.backend, "writing stream");

    let mut stats = WriteStats {
        bytes: 0,
        writes: 0,
        syncs: 0,
    };

    // A previous, longer file must not leave a tail behind.
    stream.truncate(0)?;

    for chunk in data.chunks(options.chunk_size) {
        stream.write(chunk)?;
        stats.bytes += chunk.len() as u64;
        stats.writes += 1;

        if options.sync_every > 0 && stats.writes % options.sync_every == 0 {
            stream.flush()?;
            stream.sync()?;
            stats.syncs += 1;
            debug!(bytes = stats.bytes, "synced");
        }
    }

    stream.flush()?;
    stream.sync()?;
    stats.syncs += 1;
    stream.close()?;

    Ok(stats)
}
