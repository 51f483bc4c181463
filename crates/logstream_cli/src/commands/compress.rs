//! Compress command implementation.

use logstream_storage::{
    BasicOutputStream, CacheConfig, CachedStream, CompressedStream, TruncatableOutputStream,
    ZstdCompressor,
};
use std::path::Path;
use tracing::info;

/// Runs the compress command.
pub fn run(
    input: &Path,
    output: &Path,
    level: i32,
    chunk_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let written = compress_to_file(&data, output, level, chunk_size)?;

    println!("Compressed {:?} -> {:?}", input, output);
    println!("  Input:  {} bytes", data.len());
    println!(
        "  Output: {} bytes ({:.1}%)",
        written,
        if data.is_empty() {
            0.0
        } else {
            written as f64 / data.len() as f64 * 100.0
        }
    );
    Ok(())
}

/// Compresses `data` into one zstd frame and writes it to `output`.
///
/// Returns the size of the frame.
pub fn compress_to_file(
    data: &[u8],
    output: &Path,
    level: i32,
    chunk_size: usize,
) -> Result<u64, Box<dyn std::error::Error>> {
    if chunk_size == 0 {
        return Err("chunk size must be greater than zero".into());
    }

    let mut compressor = ZstdCompressor::new(level)?;
    {
        let mut stream = CompressedStream::with_compressor(&mut compressor);
        for chunk in data.chunks(chunk_size) {
            stream.write(chunk)?;
        }
    }
    let frame = compressor.finish()?;
    info!(input = data.len(), frame = frame.len(), "compressed");

    let mut sink = CachedStream::new();
    sink.open(output, &CacheConfig::default())?;
    sink.truncate(0)?;
    sink.write(&frame)?;
    sink.flush()?;
    sink.sync()?;
    sink.close()?;

    Ok(frame.len() as u64)
}
