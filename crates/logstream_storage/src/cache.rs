//! Sequential write cache over a file descriptor.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};

/// A write-back buffer in front of one file.
///
/// Bytes accumulate in user space until the buffer fills, [`flush`] is
/// called, or the cache is repositioned with [`reinit`].
///
/// [`flush`]: WriteCache::flush
/// [`reinit`]: WriteCache::reinit
#[derive(Debug)]
pub struct WriteCache {
    writer: BufWriter<File>,
}

impl WriteCache {
    /// Binds a cache of `buffer_size` bytes to `file`.
    ///
    /// Writes start at the file's current position.
    #[must_use]
    pub fn init(file: File, buffer_size: usize) -> Self {
        Self {
            writer: BufWriter::with_capacity(buffer_size, file),
        }
    }

    /// Writes out pending bytes and positions the cache at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if pending bytes cannot be written or the file
    /// cannot be repositioned.
    pub fn reinit(&mut self, offset: u64) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_mut().seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Writes all of `buf`, retrying short and interrupted writes.
    ///
    /// # Errors
    ///
    /// Returns an error on any failure the retries cannot get past.
    pub fn safe_write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)
    }

    /// Hands the buffered bytes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be written.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Returns the underlying file.
    #[must_use]
    pub fn file(&self) -> &File {
        self.writer.get_ref()
    }

    /// Returns the offset the next buffered byte lands at.
    ///
    /// # Errors
    ///
    /// Returns an error if the file position cannot be queried.
    pub fn position(&mut self) -> io::Result<u64> {
        let buffered = self.writer.buffer().len() as u64;
        let file_pos = self.writer.get_mut().stream_position()?;
        Ok(file_pos + buffered)
    }

    /// Tears the cache down, writing out pending bytes.
    ///
    /// The file is handed back even if the final write fails, so the
    /// caller can still release it.
    pub fn end(self) -> (File, io::Result<()>) {
        let (file, pending) = self.writer.into_parts();
        let outcome = match pending {
            Ok(buffer) => write_pending(&file, &buffer),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                "write cache panicked while writing",
            )),
        };
        (file, outcome)
    }
}

fn write_pending(mut file: &File, buffer: &[u8]) -> io::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    file.write_all(buffer)?;
    file.flush()
}
