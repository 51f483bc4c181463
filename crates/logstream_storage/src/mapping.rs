//! Memory-mapped region with cursor bookkeeping.

use memmap2::MmapMut;
use std::fs::File;
use std::io;

/// A writable mapping of a whole file, plus the cursors a stream keeps in it.
///
/// All cursors are offsets from the start of the mapping. The region never
/// hands out addresses, and every access goes through a bounds-checked slice.
///
/// # Invariants
///
/// - `sync_pos <= write_pos <= len()`
/// - `end_of_file >= write_pos`
#[derive(Debug)]
pub struct MappedRegion {
    map: MmapMut,
    write_pos: u64,
    sync_pos: u64,
    end_of_file: u64,
}

impl MappedRegion {
    /// Maps the whole of `file`, which must already be `len` bytes long.
    ///
    /// All cursors start at offset 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping cannot be established or does not
    /// have the requested length.
    pub fn create(file: &File, len: u64) -> io::Result<Self> {
        // SAFETY: the stream that owns this region exclusively owns the file.
        // It only shrinks the file below the mapping length transiently, and
        // drops the region without touching it if the length cannot be
        // restored.
        #[allow(unsafe_code)]
        let map = unsafe { MmapMut::map_mut(file)? };

        if map.len() as u64 != len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("mapped {} bytes, expected {}", map.len(), len),
            ));
        }

        Ok(Self {
            map,
            write_pos: 0,
            sync_pos: 0,
            end_of_file: 0,
        })
    }

    /// Returns the mapping length.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.map.len() as u64
    }

    /// Returns `true` if the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the offset of the next byte to write.
    #[must_use]
    pub fn write_pos(&self) -> u64 {
        self.write_pos
    }

    /// Returns the offset up to which data has been synced.
    #[must_use]
    pub fn sync_pos(&self) -> u64 {
        self.sync_pos
    }

    /// Returns the logical end of file.
    #[must_use]
    pub fn end_of_file(&self) -> u64 {
        self.end_of_file
    }

    /// Returns `true` if `len` bytes fit at the write cursor.
    #[must_use]
    pub fn fits(&self, len: u64) -> bool {
        self.write_pos
            .checked_add(len)
            .is_some_and(|end| end <= self.len())
    }

    /// Copies `buf` to the write cursor and advances it.
    ///
    /// Callers check [`fits`](Self::fits) first; an oversized buffer panics
    /// on the slice bounds rather than touching memory outside the mapping.
    pub fn copy_in(&mut self, buf: &[u8]) {
        let start = self.write_pos as usize;
        self.map[start..start + buf.len()].copy_from_slice(buf);
        self.write_pos += buf.len() as u64;
        self.raise_end_of_file(self.write_pos);
    }

    /// Moves both cursors to `offset`, raising the end of file if needed.
    pub fn reposition(&mut self, offset: u64) {
        debug_assert!(offset <= self.len());
        self.write_pos = offset;
        self.sync_pos = offset;
        self.raise_end_of_file(offset);
    }

    /// Lowers the end of file and the cursors so that none exceed `offset`.
    pub fn cut(&mut self, offset: u64) {
        if offset < self.end_of_file {
            self.end_of_file = offset;
        }
        if self.write_pos > offset {
            self.write_pos = offset;
            self.sync_pos = offset;
        }
    }

    /// Syncs `[sync_pos, write_pos)` to storage and advances `sync_pos`.
    ///
    /// On failure the sync cursor stays where it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage barrier fails.
    pub fn sync_pending(&mut self) -> io::Result<()> {
        let pending = self.write_pos - self.sync_pos;
        if pending > 0 {
            self.map
                .flush_range(self.sync_pos as usize, pending as usize)?;
        }
        self.sync_pos = self.write_pos;
        Ok(())
    }

    /// Returns the bytes in `[0, end_of_file)`.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.map[..self.end_of_file as usize]
    }

    fn raise_end_of_file(&mut self, offset: u64) {
        if offset > self.end_of_file {
            self.end_of_file = offset;
        }
    }
}
