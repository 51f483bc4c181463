//! Zstandard-backed [`Compressor`].

use crate::compressed::{CompressOutcome, Compressor};
use std::io::{self, Write};
use tracing::warn;
use zstd::stream::write::Encoder;

/// Default zstd compression level.
pub const DEFAULT_LEVEL: i32 = 3;

/// A compressor producing one zstd frame in memory.
///
/// Input is consumed until it is exhausted or the encoder errors, so a
/// healthy encoder never reports leftover bytes.
pub struct ZstdCompressor {
    encoder: Encoder<'static, Vec<u8>>,
    consumed: u64,
}

impl ZstdCompressor {
    /// Creates a compressor at the given level.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be created.
    pub fn new(level: i32) -> io::Result<Self> {
        Ok(Self {
            encoder: Encoder::new(Vec::new(), level)?,
            consumed: 0,
        })
    }

    /// Returns the number of input bytes taken so far.
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Ends the frame and returns the compressed bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be finished.
    pub fn finish(self) -> io::Result<Vec<u8>> {
        self.encoder.finish()
    }
}

impl Compressor for ZstdCompressor {
    fn compress(&mut self, buf: &[u8]) -> CompressOutcome {
        let mut remaining = buf;
        while !remaining.is_empty() {
            match self.encoder.write(remaining) {
                Ok(0) => break,
                Ok(n) => {
                    self.consumed += n as u64;
                    remaining = &remaining[n..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(error = %e, unconsumed = remaining.len(), "zstd encoder failed");
                    return CompressOutcome {
                        unconsumed: remaining.len(),
                        failed: true,
                    };
                }
            }
        }

        CompressOutcome {
            unconsumed: remaining.len(),
            failed: false,
        }
    }
}

impl std::fmt::Debug for ZstdCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZstdCompressor")
            .field("consumed", &self.consumed)
            .finish()
    }
}
