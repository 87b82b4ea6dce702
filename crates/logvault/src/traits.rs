//! Traits for log storage backends.
//!
//! This module provides the [`LogStore`] trait for abstracting over the
//! durable file store and the in-memory store used in tests.

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::types::LogEntry;

/// An append-only collection of log entries with whole-collection reads.
///
/// Implementors serialize concurrent `append` calls so they behave as if
/// run one at a time in arrival order. `read_all` may run concurrently
/// with writers but never observes a partially written collection.
pub trait LogStore: Send + Sync {
    /// Returns every durable entry in storage order.
    ///
    /// An uninitialized store yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the backing medium cannot be read or
    /// decoded. Corrupt state is never reported as empty.
    fn read_all(&self) -> impl Future<Output = Result<Vec<LogEntry>>> + Send;

    /// Appends one entry at the end of the collection and returns it.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the collection cannot be read or
    /// written back. On failure the durable state is unchanged.
    fn append(&self, entry: LogEntry) -> impl Future<Output = Result<LogEntry>> + Send;
}

impl<S: LogStore + ?Sized> LogStore for Arc<S> {
    fn read_all(&self) -> impl Future<Output = Result<Vec<LogEntry>>> + Send {
        (**self).read_all()
    }

    fn append(&self, entry: LogEntry) -> impl Future<Output = Result<LogEntry>> + Send {
        (**self).append(entry)
    }
}
