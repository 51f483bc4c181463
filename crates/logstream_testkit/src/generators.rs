//! Property-based test generators using proptest.
//!
//! Provides strategies for random stream operation sequences and a
//! reference model that predicts what each stream variant does with them.

use logstream_storage::{BasicOutputStream, Cursors, StreamResult, TruncatableOutputStream};
use proptest::prelude::*;

/// One operation on a truncatable stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOp {
    /// Write bytes at the write cursor.
    Write(Vec<u8>),
    /// Move the write cursor.
    Seek(u64),
    /// Cut the stream.
    Truncate(u64),
    /// Flush user-space buffers.
    Flush,
    /// Sync to storage.
    Sync,
}

impl StreamOp {
    /// Applies the operation to `stream`.
    pub fn apply(&self, stream: &mut dyn TruncatableOutputStream) -> StreamResult<()> {
        match self {
            Self::Write(data) => stream.write(data),
            Self::Seek(offset) => stream.seek(*offset),
            Self::Truncate(offset) => stream.truncate(*offset),
            Self::Flush => stream.flush(),
            Self::Sync => stream.sync(),
        }
    }
}

/// Strategy for payloads of up to `max_len` bytes.
pub fn payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Strategy for one operation with offsets in `0..=max_offset`.
pub fn stream_op_strategy(max_offset: u64, max_write: usize) -> impl Strategy<Value = StreamOp> {
    prop_oneof![
        6 => payload_strategy(max_write).prop_map(StreamOp::Write),
        2 => (0..=max_offset).prop_map(StreamOp::Seek),
        1 => (0..=max_offset).prop_map(StreamOp::Truncate),
        1 => Just(StreamOp::Flush),
        2 => Just(StreamOp::Sync),
    ]
}

/// Strategy for a sequence of operations.
pub fn op_sequence_strategy(
    max_offset: u64,
    max_write: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StreamOp>> {
    prop::collection::vec(stream_op_strategy(max_offset, max_write), 0..max_ops)
}

/// Which variant a [`StreamModel`] predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// A cache-backed stream.
    Cached,
    /// A mapped stream with the given mapping length.
    Mapped {
        /// Mapping length.
        mapping_len: u64,
    },
}

/// Reference model of a stream's contents and cursors.
///
/// `contents` is what the file holds after a successful close.
#[derive(Debug, Clone)]
pub struct StreamModel {
    kind: ModelKind,
    contents: Vec<u8>,
    write: u64,
    synced: u64,
}

impl StreamModel {
    /// Creates the model of a freshly opened, empty stream.
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            contents: Vec::new(),
            write: 0,
            synced: 0,
        }
    }

    /// Returns the expected file contents after close.
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Returns the cursors a mapped stream should report.
    pub fn cursors(&self) -> Cursors {
        Cursors {
            write: self.write,
            synced: self.synced,
            end_of_file: self.contents.len() as u64,
        }
    }

    /// Applies `op` and returns whether the real stream should succeed.
    pub fn apply(&mut self, op: &StreamOp) -> bool {
        match (op, self.kind) {
            (StreamOp::Write(data), ModelKind::Mapped { mapping_len }) => {
                if self.write + data.len() as u64 > mapping_len {
                    return false;
                }
                self.write_at_cursor(data);
            }
            (StreamOp::Write(data), ModelKind::Cached) => self.write_at_cursor(data),
            (StreamOp::Seek(offset), ModelKind::Mapped { mapping_len }) => {
                if *offset > mapping_len {
                    return false;
                }
                self.write = *offset;
                self.synced = *offset;
                if *offset > self.contents.len() as u64 {
                    self.contents.resize(*offset as usize, 0);
                }
            }
            (StreamOp::Seek(offset), ModelKind::Cached) => self.write = *offset,
            (StreamOp::Truncate(offset), ModelKind::Mapped { .. }) => {
                if *offset < self.contents.len() as u64 {
                    self.contents.truncate(*offset as usize);
                }
                if self.write > *offset {
                    self.write = *offset;
                    self.synced = *offset;
                }
            }
            (StreamOp::Truncate(offset), ModelKind::Cached) => {
                self.contents.resize(*offset as usize, 0);
                self.write = *offset;
            }
            (StreamOp::Flush, _) => {}
            (StreamOp::Sync, _) => self.synced = self.write,
        }
        true
    }

    fn write_at_cursor(&mut self, data: &[u8]) {
        let start = self.write as usize;
        let end = start + data.len();
        if end > self.contents.len() {
            self.contents.resize(end, 0);
        }
        self.contents[start..end].copy_from_slice(data);
        self.write = end as u64;
    }
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
