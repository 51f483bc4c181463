//! Output stream traits.

use crate::config::{CacheConfig, MmapConfig};
use crate::error::StreamResult;
use crate::{CachedStream, MappedStream};
use std::path::Path;

/// A sink for a sequence of byte ranges.
///
/// Streams do not interpret the bytes they are given.
///
/// # Implementors
///
/// - [`super::CachedStream`] - Buffered writes to a regular file
/// - [`super::MappedStream`] - Writes into a memory-mapped file
/// - [`super::CompressedStream`] - Writes into a compressor
pub trait BasicOutputStream {
    /// Writes all of `buf` at the current write position and advances it.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not open or the underlying write
    /// fails. A failed write is never partially recovered.
    fn write(&mut self, buf: &[u8]) -> StreamResult<()>;
}

/// A stream over a file that can be rewound, cut, flushed and synced.
///
/// # Invariants
///
/// - `seek` only moves the write cursor; it neither writes nor erases data
/// - `truncate` discards everything past the offset, including on disk
/// - `flush` hands buffered bytes to the OS; `sync` makes them durable
/// - `close` is idempotent and safe on a stream that was never opened
///
/// No operation is safe to call concurrently with another on the same
/// stream. Use [`super::SharedStream`] when several writers need one file.
pub trait TruncatableOutputStream: BasicOutputStream {
    /// Moves the write cursor to `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not open, the offset is outside
    /// the stream's addressable range, or the repositioning fails.
    fn seek(&mut self, offset: u64) -> StreamResult<()>;

    /// Sets the end of the stream to `offset`.
    ///
    /// The physical file is resized to `offset`, and the write cursor is
    /// moved back to `offset` if it pointed past it.
    ///
    /// # Errors
    ///
    /// Returns an error if the resize fails. The write cursor is left
    /// untouched in that case.
    fn truncate(&mut self, offset: u64) -> StreamResult<()>;

    /// Hands user-space buffers to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered bytes cannot be written out.
    fn flush(&mut self) -> StreamResult<()>;

    /// Makes previously written data durable on storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage barrier fails.
    fn sync(&mut self) -> StreamResult<()>;

    /// Releases the stream's resources.
    ///
    /// Every teardown step is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns [`super::StreamError::Close`] listing every failed step.
    fn close(&mut self) -> StreamResult<()>;
}

/// One of the file-backed stream variants.
///
/// Callers pick exactly one variant per log file.
#[derive(Debug)]
pub enum LogStream {
    /// Buffered writes through a write cache.
    Cached(CachedStream),
    /// Writes into a memory-mapped file.
    Mapped(MappedStream),
}

impl LogStream {
    /// Opens a cache-backed stream at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or the cache cannot be set up.
    pub fn open_cached(path: &Path, config: &CacheConfig) -> StreamResult<Self> {
        let mut stream = CachedStream::new();
        stream.open(path, config)?;
        Ok(Self::Cached(stream))
    }

    /// Opens a memory-mapped stream at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, resized or mapped.
    pub fn open_mapped(path: &Path, config: &MmapConfig) -> StreamResult<Self> {
        let mut stream = MappedStream::new();
        stream.open(path, config)?;
        Ok(Self::Mapped(stream))
    }

    /// Returns `true` if the underlying stream is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        match self {
            Self::Cached(s) => s.is_open(),
            Self::Mapped(s) => s.is_open(),
        }
    }
}

impl BasicOutputStream for LogStream {
    fn write(&mut self, buf: &[u8]) -> StreamResult<()> {
        match self {
            Self::Cached(s) => s.write(buf),
            Self::Mapped(s) => s.write(buf),
        }
    }
}

impl TruncatableOutputStream for LogStream {
    fn seek(&mut self, offset: u64) -> StreamResult<()> {
        match self {
            Self::Cached(s) => s.seek(offset),
            Self::Mapped(s) => s.seek(offset),
        }
    }

    fn truncate(&mut self, offset: u64) -> StreamResult<()> {
        match self {
            Self::Cached(s) => s.truncate(offset),
            Self::Mapped(s) => s.truncate(offset),
        }
    }

    fn flush(&mut self) -> StreamResult<()> {
        match self {
            Self::Cached(s) => s.flush(),
            Self::Mapped(s) => s.flush(),
        }
    }

    fn sync(&mut self) -> StreamResult<()> {
        match self {
            Self::Cached(s) => s.sync(),
            Self::Mapped(s) => s.sync(),
        }
    }

    fn close(&mut self) -> StreamResult<()> {
        match self {
            Self::Cached(s) => s.close(),
            Self::Mapped(s) => s.close(),
        }
    }
}
