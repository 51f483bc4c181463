//! Stream configuration.

use crate::error::{StreamError, StreamResult};

/// Default write-cache buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Default mapping length for mapped streams (1 MiB).
pub const DEFAULT_MAPPING_LEN: u64 = 1024 * 1024;

/// Configuration for opening a [`CachedStream`](crate::CachedStream).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Size of the user-space write buffer in bytes.
    pub buffer_size: usize,

    /// Whether to create missing parent directories.
    pub create_dirs: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            create_dirs: false,
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the write buffer size.
    #[must_use]
    pub const fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets whether to create missing parent directories.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    pub(crate) fn validate(&self) -> StreamResult<()> {
        if self.buffer_size == 0 {
            return Err(StreamError::InvalidConfig(
                "buffer size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for opening a [`MappedStream`](crate::MappedStream).
#[derive(Debug, Clone)]
pub struct MmapConfig {
    /// Length of the mapping, and the file size while the stream is open.
    pub mapping_len: u64,

    /// Whether to create missing parent directories.
    pub create_dirs: bool,
}

impl Default for MmapConfig {
    fn default() -> Self {
        Self {
            mapping_len: DEFAULT_MAPPING_LEN,
            create_dirs: false,
        }
    }
}

impl MmapConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mapping length.
    #[must_use]
    pub const fn mapping_len(mut self, len: u64) -> Self {
        self.mapping_len = len;
        self
    }

    /// Sets whether to create missing parent directories.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    pub(crate) fn validate(&self) -> StreamResult<()> {
        if self.mapping_len == 0 {
            return Err(StreamError::InvalidConfig(
                "mapping length must be greater than zero".to_string(),
            ));
        }
        if usize::try_from(self.mapping_len).is_err() {
            return Err(StreamError::InvalidConfig(format!(
                "mapping length {} does not fit in the address space",
                self.mapping_len
            )));
        }
        Ok(())
    }
}
