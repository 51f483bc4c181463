//! External synchronization for streams with more than one writer.

use crate::error::StreamResult;
use crate::stream::{BasicOutputStream, TruncatableOutputStream};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// A cloneable handle that serializes every operation on one stream.
///
/// Streams perform no internal locking. Callers with several writer threads
/// wrap the stream in a `SharedStream`, so each operation runs to completion
/// before the next one starts.
#[derive(Debug)]
pub struct SharedStream<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedStream<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> SharedStream<S> {
    /// Wraps `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stream)),
        }
    }

    /// Locks the stream for a sequence of operations.
    ///
    /// Useful when a write and the seek before it must not interleave with
    /// another writer.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock()
    }
}

impl<S: BasicOutputStream> SharedStream<S> {
    /// Writes `buf` under the lock.
    ///
    /// # Errors
    ///
    /// Returns the stream's write error.
    pub fn write(&self, buf: &[u8]) -> StreamResult<()> {
        self.inner.lock().write(buf)
    }
}

impl<S: TruncatableOutputStream> SharedStream<S> {
    /// Writes `buf` and syncs it under one lock acquisition.
    ///
    /// # Errors
    ///
    /// Returns the stream's write or sync error.
    pub fn write_durable(&self, buf: &[u8]) -> StreamResult<()> {
        let mut stream = self.inner.lock();
        stream.write(buf)?;
        stream.flush()?;
        stream.sync()
    }

    /// Flushes and syncs under the lock.
    ///
    /// # Errors
    ///
    /// Returns the stream's flush or sync error.
    pub fn sync(&self) -> StreamResult<()> {
        let mut stream = self.inner.lock();
        stream.flush()?;
        stream.sync()
    }

    /// Closes the stream under the lock.
    ///
    /// # Errors
    ///
    /// Returns the stream's close error.
    pub fn close(&self) -> StreamResult<()> {
        self.inner.lock().close()
    }
}
