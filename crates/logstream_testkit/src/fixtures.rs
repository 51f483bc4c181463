//! Test fixtures and stream helpers.
//!
//! Provides a temporary directory that opens streams by file name and reads
//! back what they left on disk.

use logstream_storage::{CacheConfig, CachedStream, MappedStream, MmapConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory for stream files, removed on drop.
pub struct TempStreamDir {
    dir: TempDir,
}

impl TempStreamDir {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the path of `name` inside the directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Opens a cache-backed stream on `name` with default settings.
    pub fn cached(&self, name: &str) -> CachedStream {
        self.cached_with(name, &CacheConfig::default())
    }

    /// Opens a cache-backed stream on `name`.
    pub fn cached_with(&self, name: &str, config: &CacheConfig) -> CachedStream {
        let mut stream = CachedStream::new();
        stream
            .open(&self.path(name), config)
            .expect("Failed to open cached stream");
        stream
    }

    /// Opens a mapped stream on `name` with the given mapping length.
    pub fn mapped(&self, name: &str, mapping_len: u64) -> MappedStream {
        let mut stream = MappedStream::new();
        stream
            .open(&self.path(name), &MmapConfig::new().mapping_len(mapping_len))
            .expect("Failed to open mapped stream");
        stream
    }

    /// Reads the whole of `name`.
    pub fn read(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.path(name)).expect("Failed to read stream file")
    }

    /// Returns the on-disk length of `name`.
    pub fn file_len(&self, name: &str) -> u64 {
        std::fs::metadata(self.path(name))
            .expect("Failed to stat stream file")
            .len()
    }
}

impl Default for TempStreamDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic payload of `len` bytes, distinct per `seed`.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logstream_storage::TruncatableOutputStream;

    #[test]
    fn fixture_paths_live_in_root() {
        let dir = TempStreamDir::new();
        assert_eq!(dir.path("a.log").parent(), Some(dir.root()));
    }

    #[test]
    fn fixture_opens_both_variants() {
        let dir = TempStreamDir::new();
        let mut cached = dir.cached("cached.log");
        let mut mapped = dir.mapped("mapped.log", 4096);
        assert_eq!(dir.file_len("mapped.log"), 4096);

        cached.close().unwrap();
        mapped.close().unwrap();
        assert!(dir.read("cached.log").is_empty());
        assert_eq!(dir.file_len("mapped.log"), 0);
    }

    #[test]
    fn payload_is_deterministic() {
        assert_eq!(payload(16, 1), payload(16, 1));
        assert_ne!(payload(16, 1), payload(16, 2));
    }
}
