//! Memory-mapped output stream.

use crate::config::MmapConfig;
use crate::error::{Operation, StreamError, StreamResult};
use crate::mapping::MappedRegion;
use crate::stream::{BasicOutputStream, TruncatableOutputStream};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Snapshot of a mapped stream's cursors, as offsets into the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursors {
    /// Offset the next write lands at.
    pub write: u64,
    /// Offset up to which data is known to be on storage.
    pub synced: u64,
    /// Logical end of file.
    pub end_of_file: u64,
}

#[derive(Debug)]
struct OpenMapping {
    path: PathBuf,
    file: File,
    region: MappedRegion,
}

/// A stream that writes by copying into a memory-mapped file.
///
/// While open, the file is exactly `mapping_len` bytes long. The logical end
/// of file is tracked separately and the file is cut down to it on close.
///
/// # Durability
///
/// - `write()` is a memory copy; no system call is made
/// - `flush()` does nothing, the bytes are already in the page cache
/// - `sync()` issues `msync` over the range written since the last sync
///
/// # Invariants
///
/// - `synced <= write <= mapping_len`
/// - `end_of_file >= write`
/// - only `sync` advances `synced` past its previous value
///
/// A `truncate` that cuts the file but cannot grow it back to the mapping
/// length closes the stream, since part of the mapping is no longer backed.
///
/// # Example
///
/// ```no_run
/// use logstream_storage::{
///     BasicOutputStream, MappedStream, MmapConfig, TruncatableOutputStream,
/// };
/// use std::path::Path;
///
/// let mut stream = MappedStream::new();
/// stream
///     .open(Path::new("relay.000001"), &MmapConfig::new().mapping_len(1 << 20))
///     .unwrap();
/// stream.write(b"event").unwrap();
/// stream.sync().unwrap();
/// stream.close().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MappedStream {
    inner: Option<OpenMapping>,
}

impl MappedStream {
    /// Creates a stream that is not yet open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens or creates `path`, sizes it to the mapping length and maps it.
    ///
    /// All cursors start at offset 0 and the logical end of file is 0, so
    /// closing without writing leaves an empty file.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Open`] if any step fails; the file is released
    /// before returning. Returns [`StreamError::InvalidConfig`] for an
    /// unusable configuration.
    pub fn open(&mut self, path: &Path, config: &MmapConfig) -> StreamResult<()> {
        debug_assert!(self.inner.is_none(), "stream is already open");
        config.validate()?;

        if config.create_dirs {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(StreamError::Open)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(StreamError::Open)?;

        // On failure `file` is dropped here, which releases the descriptor.
        file.set_len(config.mapping_len)
            .map_err(StreamError::Open)?;
        let region = MappedRegion::create(&file, config.mapping_len).map_err(StreamError::Open)?;

        debug!(path = %path.display(), mapping_len = config.mapping_len, "opened mapped stream");
        self.inner = Some(OpenMapping {
            path: path.to_path_buf(),
            file,
            region,
        });
        Ok(())
    }

    /// Returns `true` if the stream is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns the path of the open file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.as_ref().map(|m| m.path.as_path())
    }

    /// Returns the mapping length, or `None` if the stream is not open.
    #[must_use]
    pub fn mapping_len(&self) -> Option<u64> {
        self.inner.as_ref().map(|m| m.region.len())
    }

    /// Returns the current cursors, or `None` if the stream is not open.
    #[must_use]
    pub fn cursors(&self) -> Option<Cursors> {
        self.inner.as_ref().map(|m| Cursors {
            write: m.region.write_pos(),
            synced: m.region.sync_pos(),
            end_of_file: m.region.end_of_file(),
        })
    }

    /// Returns the bytes between offset 0 and the logical end of file.
    #[must_use]
    pub fn contents(&self) -> Option<&[u8]> {
        self.inner.as_ref().map(|m| m.region.contents())
    }

    fn mapping_mut(&mut self, op: Operation) -> StreamResult<&mut OpenMapping> {
        self.inner.as_mut().ok_or(StreamError::NotOpen { op })
    }

    /// Unmaps and closes a stream whose file no longer backs the whole
    /// mapping. Pages past the end of the file must never be touched, so
    /// every later operation reports [`StreamError::NotOpen`].
    fn release_unbacked(&mut self, file_len: u64) {
        if let Some(OpenMapping { path, file, region }) = self.inner.take() {
            drop(region);
            drop(file);
            warn!(
                path = %path.display(),
                file_len,
                "mapping lost its backing, stream closed"
            );
        }
    }
}

impl BasicOutputStream for MappedStream {
    fn write(&mut self, buf: &[u8]) -> StreamResult<()> {
        let mapping = self.mapping_mut(Operation::Write)?;
        let region = &mut mapping.region;

        let len = buf.len() as u64;
        if !region.fits(len) {
            return Err(StreamError::OutOfBounds {
                op: Operation::Write,
                offset: region.write_pos(),
                len,
                limit: region.len(),
            });
        }

        region.copy_in(buf);
        Ok(())
    }
}

impl TruncatableOutputStream for MappedStream {
    fn seek(&mut self, offset: u64) -> StreamResult<()> {
        let region = &mut self.mapping_mut(Operation::Seek)?.region;
        if offset > region.len() {
            return Err(StreamError::OutOfBounds {
                op: Operation::Seek,
                offset,
                len: 0,
                limit: region.len(),
            });
        }

        region.reposition(offset);
        trace!(offset, end_of_file = region.end_of_file(), "seek mapped stream");
        Ok(())
    }

    fn truncate(&mut self, offset: u64) -> StreamResult<()> {
        let mapping = self.mapping_mut(Operation::Truncate)?;
        let mapping_len = mapping.region.len();

        mapping
            .file
            .set_len(offset)
            .map_err(StreamError::Truncate)?;

        // The mapping must stay backed by the file, so it is grown back to
        // its full length. The dropped tail reads back as zeroes.
        if offset < mapping_len {
            if let Err(e) = mapping.file.set_len(mapping_len) {
                self.release_unbacked(offset);
                return Err(StreamError::Truncate(e));
            }
        }

        mapping.region.cut(offset);
        debug!(
            offset,
            end_of_file = mapping.region.end_of_file(),
            "truncated mapped stream"
        );
        Ok(())
    }

    fn flush(&mut self) -> StreamResult<()> {
        self.mapping_mut(Operation::Flush)?;
        Ok(())
    }

    fn sync(&mut self) -> StreamResult<()> {
        let region = &mut self.mapping_mut(Operation::Sync)?.region;
        region.sync_pending().map_err(StreamError::Sync)?;
        trace!(synced = region.sync_pos(), "synced mapped stream");
        Ok(())
    }

    fn close(&mut self) -> StreamResult<()> {
        let Some(OpenMapping {
            path,
            file,
            mut region,
        }) = self.inner.take()
        else {
            return Ok(());
        };

        let mut errors = Vec::new();
        if let Err(e) = region.sync_pending() {
            errors.push(e);
        }
        debug_assert_eq!(region.sync_pos(), region.write_pos());
        debug_assert!(region.end_of_file() >= region.write_pos());

        let end_of_file = region.end_of_file();
        // Unmap before shrinking so no mapped page outlives its backing.
        drop(region);
        if let Err(e) = file.set_len(end_of_file) {
            errors.push(e);
        }
        drop(file);

        debug!(path = %path.display(), end_of_file, "closed mapped stream");
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StreamError::Close(errors))
        }
    }
}

impl Drop for MappedStream {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close mapped stream on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(path: &Path, len: u64) -> MappedStream {
        let mut stream = MappedStream::new();
        stream
            .open(path, &MmapConfig::new().mapping_len(len))
            .unwrap();
        stream
    }

    #[test]
    fn mapped_open_sizes_file_to_mapping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let stream = open(&path, 4096);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);
        assert_eq!(stream.mapping_len(), Some(4096));
        assert_eq!(
            stream.cursors(),
            Some(Cursors {
                write: 0,
                synced: 0,
                end_of_file: 0
            })
        );
    }

    #[test]
    fn mapped_write_seek_write_sync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = open(&path, 4096);
        stream.write(&[1u8; 100]).unwrap();
        stream.seek(50).unwrap();
        stream.write(&[2u8; 20]).unwrap();
        stream.sync().unwrap();

        assert_eq!(
            stream.cursors(),
            Some(Cursors {
                write: 70,
                synced: 70,
                end_of_file: 100
            })
        );
    }

    #[test]
    fn mapped_seek_resets_sync_cursor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = open(&path, 4096);
        stream.write(&[1u8; 30]).unwrap();
        stream.seek(10).unwrap();
        let cursors = stream.cursors().unwrap();
        assert_eq!(cursors.write, 10);
        assert_eq!(cursors.synced, 10);
        assert_eq!(cursors.end_of_file, 30);
    }

    #[test]
    fn mapped_seek_past_end_raises_end_of_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = open(&path, 4096);
        stream.seek(200).unwrap();
        assert_eq!(stream.cursors().unwrap().end_of_file, 200);
        stream.close().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 200);
    }

    #[test]
    fn mapped_sync_twice_is_stable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = open(&path, 4096);
        stream.write(b"abc").unwrap();
        stream.sync().unwrap();
        let first = stream.cursors().unwrap();
        stream.sync().unwrap();
        assert_eq!(stream.cursors().unwrap(), first);
    }

    #[test]
    fn mapped_write_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = open(&path, 16);
        stream.write(&[0u8; 10]).unwrap();
        let err = stream.write(&[0u8; 7]).unwrap_err();
        assert!(matches!(
            err,
            StreamError::OutOfBounds {
                op: Operation::Write,
                offset: 10,
                len: 7,
                limit: 16
            }
        ));
        assert_eq!(stream.cursors().unwrap().write, 10);

        // Filling the mapping exactly is allowed.
        stream.write(&[0u8; 6]).unwrap();
        assert_eq!(stream.cursors().unwrap().write, 16);
    }

    #[test]
    fn mapped_seek_past_mapping_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = open(&path, 16);
        let err = stream.seek(17).unwrap_err();
        assert_eq!(err.operation(), Operation::Seek);
    }

    #[test]
    fn mapped_truncate_then_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = open(&path, 4096);
        stream.write(b"0123456789").unwrap();
        stream.sync().unwrap();
        stream.truncate(4).unwrap();
        assert_eq!(
            stream.cursors(),
            Some(Cursors {
                write: 4,
                synced: 4,
                end_of_file: 4
            })
        );
        stream.write(b"ab").unwrap();
        stream.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"0123ab");
    }

    #[test]
    fn mapped_truncate_zeroes_dropped_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = open(&path, 4096);
        stream.write(b"0123456789").unwrap();
        stream.truncate(4).unwrap();
        stream.seek(8).unwrap();
        assert_eq!(stream.contents().unwrap(), b"0123\0\0\0\0");
    }

    #[test]
    fn mapped_truncate_beyond_cursor_keeps_cursor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = open(&path, 4096);
        stream.write(b"0123456789").unwrap();
        stream.seek(2).unwrap();
        stream.truncate(6).unwrap();
        assert_eq!(
            stream.cursors(),
            Some(Cursors {
                write: 2,
                synced: 2,
                end_of_file: 6
            })
        );
    }

    #[test]
    fn mapped_close_syncs_and_cuts_to_end_of_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let data: Vec<u8> = (0..=255).collect();
        let mut stream = open(&path, 4096);
        stream.write(&data).unwrap();
        stream.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), data);
    }

    #[test]
    fn mapped_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut never_opened = MappedStream::new();
        never_opened.close().unwrap();

        let mut stream = open(&path, 64);
        stream.close().unwrap();
        stream.close().unwrap();
        assert!(!stream.is_open());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn mapped_operations_before_open_fail() {
        let mut stream = MappedStream::new();
        assert!(matches!(
            stream.write(b"x"),
            Err(StreamError::NotOpen {
                op: Operation::Write
            })
        ));
        assert!(matches!(
            stream.flush(),
            Err(StreamError::NotOpen {
                op: Operation::Flush
            })
        ));
        assert!(stream.cursors().is_none());
    }

    #[test]
    fn mapped_zero_length_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut stream = MappedStream::new();
        let err = stream
            .open(&path, &MmapConfig::new().mapping_len(0))
            .unwrap_err();
        assert!(matches!(err, StreamError::InvalidConfig(_)));
        assert!(!stream.is_open());
    }
}
