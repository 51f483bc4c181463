//! Cache-backed output stream over a regular file.

use crate::cache::WriteCache;
use crate::config::CacheConfig;
use crate::error::{Operation, StreamError, StreamResult};
use crate::stream::{BasicOutputStream, TruncatableOutputStream};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// A stream that buffers writes in a [`WriteCache`] in front of one file.
///
/// The stream is either not initialized (only [`open`](Self::open) and
/// `close` are meaningful) or initialized with a cache bound 1:1 to an open
/// file.
///
/// # Durability
///
/// - `flush()` writes the cache buffer out to the OS
/// - `sync()` calls `File::sync_all()` to put the data on disk
///
/// # Example
///
/// ```no_run
/// use logstream_storage::{
///     BasicOutputStream, CacheConfig, CachedStream, TruncatableOutputStream,
/// };
/// use std::path::Path;
///
/// let mut stream = CachedStream::new();
/// stream.open(Path::new("binlog.000001"), &CacheConfig::default()).unwrap();
/// stream.write(b"event").unwrap();
/// stream.flush().unwrap();
/// stream.sync().unwrap();
/// stream.close().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct CachedStream {
    path: Option<PathBuf>,
    cache: Option<WriteCache>,
}

impl CachedStream {
    /// Creates a stream that is not yet open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens or creates `path` for writing and binds a write cache to it.
    ///
    /// Writes start at offset 0. Existing contents are kept until they are
    /// overwritten or truncated away.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Open`] if the file cannot be opened, or
    /// [`StreamError::InvalidConfig`] for an unusable configuration.
    pub fn open(&mut self, path: &Path, config: &CacheConfig) -> StreamResult<()> {
        debug_assert!(self.cache.is_none(), "stream is already open");
        config.validate()?;

        if config.create_dirs {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(StreamError::Open)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(StreamError::Open)?;

        self.cache = Some(WriteCache::init(file, config.buffer_size));
        self.path = Some(path.to_path_buf());
        debug!(path = %path.display(), buffer_size = config.buffer_size, "opened cached stream");
        Ok(())
    }

    /// Returns `true` if the stream is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.cache.is_some()
    }

    /// Returns the path of the open file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the offset the next write lands at, or `None` if the stream
    /// is not open.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Seek`] if the file position cannot be queried.
    pub fn position(&mut self) -> StreamResult<Option<u64>> {
        self.cache
            .as_mut()
            .map(WriteCache::position)
            .transpose()
            .map_err(StreamError::Seek)
    }

    fn cache_mut(&mut self, op: Operation) -> StreamResult<&mut WriteCache> {
        self.cache.as_mut().ok_or(StreamError::NotOpen { op })
    }
}

impl BasicOutputStream for CachedStream {
    fn write(&mut self, buf: &[u8]) -> StreamResult<()> {
        self.cache_mut(Operation::Write)?
            .safe_write(buf)
            .map_err(StreamError::Write)
    }
}

impl TruncatableOutputStream for CachedStream {
    fn seek(&mut self, offset: u64) -> StreamResult<()> {
        trace!(offset, "seek cached stream");
        self.cache_mut(Operation::Seek)?
            .reinit(offset)
            .map_err(StreamError::Seek)
    }

    fn truncate(&mut self, offset: u64) -> StreamResult<()> {
        let cache = self.cache_mut(Operation::Truncate)?;

        // Pending bytes must reach the file before it is cut, or a later
        // flush would write them past the new end.
        cache.flush().map_err(StreamError::Truncate)?;
        cache.file().set_len(offset).map_err(StreamError::Truncate)?;
        cache.reinit(offset).map_err(StreamError::Truncate)?;

        debug!(offset, "truncated cached stream");
        Ok(())
    }

    fn flush(&mut self) -> StreamResult<()> {
        self.cache_mut(Operation::Flush)?
            .flush()
            .map_err(StreamError::Flush)
    }

    fn sync(&mut self) -> StreamResult<()> {
        self.cache_mut(Operation::Sync)?
            .file()
            .sync_all()
            .map_err(StreamError::Sync)
    }

    fn close(&mut self) -> StreamResult<()> {
        let Some(cache) = self.cache.take() else {
            return Ok(());
        };

        // The file is released whether or not the final flush succeeds.
        let (file, outcome) = cache.end();
        drop(file);

        if let Some(path) = self.path.take() {
            debug!(path = %path.display(), "closed cached stream");
        }
        outcome.map_err(|e| StreamError::Close(vec![e]))
    }
}

impl Drop for CachedStream {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close cached stream on drop");
        }
    }
}
