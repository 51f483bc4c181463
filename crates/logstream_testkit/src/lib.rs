//! # Logstream Testkit
//!
//! Test utilities for logstream.
//!
//! This crate provides:
//! - Temporary-directory fixtures that open streams
//! - Property-based generators for stream operation sequences
//! - A reference model of stream contents and cursors
//! - Scripted compressors for exercising [`CompressedStream`]
//!
//! [`CompressedStream`]: logstream_storage::CompressedStream
//!
//! ## Usage
//!
//! ```rust,ignore
//! use logstream_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_stream() {
//!     let dir = TempStreamDir::new();
//!     let mut stream = dir.mapped("binlog.000001", 4096);
//!     // ... stream operations
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod compressors;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::compressors::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use compressors::*;
pub use fixtures::*;
pub use generators::*;
