//! CLI command implementations.

pub mod compress;
pub mod truncate;
pub mod write;
