//! Error types for stream operations.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// The operation family an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Acquiring the file, the cache or the mapping.
    Open,
    /// Writing bytes at the write cursor.
    Write,
    /// Repositioning the write cursor.
    Seek,
    /// Cutting the stream at an offset.
    Truncate,
    /// Handing user-space buffers to the OS.
    Flush,
    /// Making written data durable.
    Sync,
    /// Releasing the stream's resources.
    Close,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Write => "write",
            Self::Seek => "seek",
            Self::Truncate => "truncate",
            Self::Flush => "flush",
            Self::Sync => "sync",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during stream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The file, the cache or the mapping could not be acquired.
    #[error("open failed: {0}")]
    Open(#[source] io::Error),

    /// The underlying write failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// The write cursor could not be repositioned.
    #[error("seek failed: {0}")]
    Seek(#[source] io::Error),

    /// The physical resize or the cursor adjustment failed.
    #[error("truncate failed: {0}")]
    Truncate(#[source] io::Error),

    /// Buffered bytes could not be handed to the OS.
    #[error("flush failed: {0}")]
    Flush(#[source] io::Error),

    /// Data could not be made durable.
    #[error("sync failed: {0}")]
    Sync(#[source] io::Error),

    /// One or more teardown steps failed. Every step was attempted.
    #[error("close failed: {}", join_errors(.0))]
    Close(Vec<io::Error>),

    /// The compressor failed or did not take the whole buffer.
    #[error("compression failed: {unconsumed} bytes left unconsumed (failed: {failed})")]
    Compression {
        /// Bytes the compressor did not consume.
        unconsumed: usize,
        /// Whether the compressor reported failure.
        failed: bool,
    },

    /// No compressor is installed on the stream.
    #[error("no compressor installed")]
    NoCompressor,

    /// The operation requires an open stream.
    #[error("{op} on a stream that is not open")]
    NotOpen {
        /// The attempted operation.
        op: Operation,
    },

    /// The operation would reach past the end of the mapping.
    #[error("{op} out of bounds: offset {offset}, len {len}, mapping length {limit}")]
    OutOfBounds {
        /// The attempted operation.
        op: Operation,
        /// The start offset of the access.
        offset: u64,
        /// The length of the access.
        len: u64,
        /// The mapping length.
        limit: u64,
    },

    /// The configuration passed to `open` is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StreamError {
    /// Returns the operation family this error belongs to.
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::Open(_) | Self::InvalidConfig(_) => Operation::Open,
            Self::Write(_) | Self::Compression { .. } | Self::NoCompressor => Operation::Write,
            Self::Seek(_) => Operation::Seek,
            Self::Truncate(_) => Operation::Truncate,
            Self::Flush(_) => Operation::Flush,
            Self::Sync(_) => Operation::Sync,
            Self::Close(_) => Operation::Close,
            Self::NotOpen { op } | Self::OutOfBounds { op, .. } => *op,
        }
    }
}

fn join_errors(errors: &[io::Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
