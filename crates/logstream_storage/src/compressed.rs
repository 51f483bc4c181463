//! Output stream that feeds a compressor.

use crate::error::{StreamError, StreamResult};
use crate::stream::BasicOutputStream;
use std::fmt;

/// Result of one [`Compressor::compress`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressOutcome {
    /// Input bytes the compressor did not take.
    pub unconsumed: usize,
    /// Whether the compressor reported failure.
    pub failed: bool,
}

impl CompressOutcome {
    /// The whole input was consumed without error.
    pub const CONSUMED: Self = Self {
        unconsumed: 0,
        failed: false,
    };

    /// Returns `true` if the call failed or left input behind.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.failed || self.unconsumed > 0
    }
}

/// A transform that takes input buffers one call at a time.
pub trait Compressor {
    /// Offers `buf` to the compressor.
    fn compress(&mut self, buf: &[u8]) -> CompressOutcome;
}

/// A stream whose only sink is a caller-owned [`Compressor`].
///
/// The stream borrows the compressor and never drops it. A write is
/// all-or-nothing: if the compressor leaves any byte unconsumed the write
/// fails, with no retry.
#[derive(Default)]
pub struct CompressedStream<'c> {
    compressor: Option<&'c mut dyn Compressor>,
}

impl<'c> CompressedStream<'c> {
    /// Creates a stream with no compressor installed.
    #[must_use]
    pub fn new() -> Self {
        Self { compressor: None }
    }

    /// Creates a stream writing into `compressor`.
    #[must_use]
    pub fn with_compressor(compressor: &'c mut dyn Compressor) -> Self {
        Self {
            compressor: Some(compressor),
        }
    }

    /// Returns the installed compressor.
    #[must_use]
    pub fn compressor(&self) -> Option<&(dyn Compressor + 'c)> {
        self.compressor.as_deref()
    }

    /// Returns the installed compressor mutably.
    pub fn compressor_mut(&mut self) -> Option<&mut (dyn Compressor + 'c)> {
        self.compressor.as_deref_mut()
    }

    /// Installs `compressor`, returning the one it replaces.
    pub fn set_compressor(
        &mut self,
        compressor: Option<&'c mut dyn Compressor>,
    ) -> Option<&'c mut dyn Compressor> {
        std::mem::replace(&mut self.compressor, compressor)
    }
}

impl BasicOutputStream for CompressedStream<'_> {
    fn write(&mut self, buf: &[u8]) -> StreamResult<()> {
        let compressor = self
            .compressor
            .as_deref_mut()
            .ok_or(StreamError::NoCompressor)?;

        let outcome = compressor.compress(buf);
        if outcome.is_failure() {
            return Err(StreamError::Compression {
                unconsumed: outcome.unconsumed,
                failed: outcome.failed,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for CompressedStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedStream")
            .field("has_compressor", &self.compressor.is_some())
            .finish()
    }
}
