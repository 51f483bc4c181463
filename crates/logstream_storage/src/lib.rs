//! # Logstream Storage
//!
//! Durable output streams for sequential log files.
//!
//! A database server writes its binary and relay logs as a sequence of byte
//! ranges in increasing offset order. It occasionally rewinds, cuts the log
//! at an offset, and decides itself when written bytes must become durable.
//! This crate provides the streams that carry those writes to storage.
//! Streams are **opaque byte sinks** - they do not interpret the log format.
//!
//! ## Design Principles
//!
//! - One contract, a closed set of variants
//! - `flush` (user space to OS) is separate from `sync` (OS to media)
//! - Every failure is surfaced to the caller; nothing is retried here
//! - Each stream exclusively owns its file and mapping; no internal locking
//!
//! ## Available Streams
//!
//! - [`CachedStream`] - Buffered writes through a [`WriteCache`]
//! - [`MappedStream`] - Memory copies into a file mapping
//! - [`CompressedStream`] - Hands every write to a caller-owned [`Compressor`]
//! - [`LogStream`] - Either file-backed variant behind one type
//!
//! ## Example
//!
//! ```rust,no_run
//! use logstream_storage::{
//!     BasicOutputStream, LogStream, MmapConfig, TruncatableOutputStream,
//! };
//! use std::path::Path;
//!
//! let config = MmapConfig::new().mapping_len(64 * 1024);
//! let mut log = LogStream::open_mapped(Path::new("binlog.000001"), &config).unwrap();
//! log.write(b"event one").unwrap();
//! log.sync().unwrap();
//! log.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod cached;
mod compressed;
mod config;
mod error;
mod mapped;
mod mapping;
mod shared;
mod stream;
#[cfg(feature = "zstd")]
mod zstd_compressor;

pub use cache::WriteCache;
pub use cached::CachedStream;
pub use compressed::{CompressOutcome, CompressedStream, Compressor};
pub use config::{CacheConfig, MmapConfig, DEFAULT_BUFFER_SIZE, DEFAULT_MAPPING_LEN};
pub use error::{Operation, StreamError, StreamResult};
pub use mapped::{Cursors, MappedStream};
pub use mapping::MappedRegion;
pub use shared::SharedStream;
pub use stream::{BasicOutputStream, LogStream, TruncatableOutputStream};
#[cfg(feature = "zstd")]
pub use zstd_compressor::{ZstdCompressor, DEFAULT_LEVEL as DEFAULT_ZSTD_LEVEL};
