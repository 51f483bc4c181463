//! Benchmark utilities for logstream.

#![warn(missing_docs)]

pub mod utils;
