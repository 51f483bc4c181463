//! Truncate command implementation.

use logstream_storage::{CacheConfig, CachedStream, TruncatableOutputStream};
use std::path::Path;
use tracing::info;

/// Runs the truncate command.
pub fn run(output: &Path, offset: u64) -> Result<(), Box<dyn std::error::Error>> {
    if !output.exists() {
        return Err("Log file not found".into());
    }

    let before = std::fs::metadata(output)?.len();
    truncate_file(output, offset)?;
    info!(path = %output.display(), before, after = offset, "truncated log");

    println!("Truncated {:?}: {} -> {} bytes", output, before, offset);
    Ok(())
}

/// Cuts the file at `output` to `offset` bytes through a cache-backed stream.
pub fn truncate_file(output: &Path, offset: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = CachedStream::new();
    stream.open(output, &CacheConfig::default())?;
    stream.truncate(offset)?;
    stream.sync()?;
    stream.close()?;
    Ok(())
}
