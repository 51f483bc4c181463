//! Compressors with scripted behaviour.

use logstream_storage::{CompressOutcome, Compressor};
use std::collections::VecDeque;

/// A compressor that returns pre-recorded outcomes.
///
/// Each call pops the next outcome; once the script runs out every call
/// consumes its whole input. Every buffer offered is recorded.
#[derive(Debug, Default)]
pub struct ScriptedCompressor {
    script: VecDeque<CompressOutcome>,
    calls: Vec<Vec<u8>>,
}

impl ScriptedCompressor {
    /// Creates a compressor that always consumes everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a compressor that replays `outcomes` in order.
    pub fn with_script(outcomes: impl IntoIterator<Item = CompressOutcome>) -> Self {
        Self {
            script: outcomes.into_iter().collect(),
            calls: Vec::new(),
        }
    }

    /// Queues one more outcome.
    pub fn push(&mut self, outcome: CompressOutcome) {
        self.script.push_back(outcome);
    }

    /// Returns every buffer offered so far.
    pub fn calls(&self) -> &[Vec<u8>] {
        &self.calls
    }
}

impl Compressor for ScriptedCompressor {
    fn compress(&mut self, buf: &[u8]) -> CompressOutcome {
        self.calls.push(buf.to_vec());
        self.script.pop_front().unwrap_or(CompressOutcome::CONSUMED)
    }
}

/// A compressor that stores its input verbatim.
#[derive(Debug, Default)]
pub struct CollectingCompressor {
    data: Vec<u8>,
    limit: Option<usize>,
}

impl CollectingCompressor {
    /// Creates a compressor without a capacity limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a compressor that takes at most `limit` bytes in total.
    ///
    /// Input past the limit is left unconsumed.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Returns the bytes taken so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Compressor for CollectingCompressor {
    fn compress(&mut self, buf: &[u8]) -> CompressOutcome {
        let room = self
            .limit
            .map_or(buf.len(), |limit| limit.saturating_sub(self.data.len()));
        let taken = room.min(buf.len());
        self.data.extend_from_slice(&buf[..taken]);
        CompressOutcome {
            unconsumed: buf.len() - taken,
            failed: false,
        }
    }
}
