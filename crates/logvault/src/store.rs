//! In-memory log storage.
//!
//! [`MemoryLogStore`] implements [`LogStore`] without touching disk. It is
//! used in tests and by embedders that do not need durability.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::traits::LogStore;
use crate::types::LogEntry;

/// Thread-safe in-memory log store.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    /// All log entries, ordered by insertion
    entries: RwLock<Vec<LogEntry>>,
}

impl MemoryLogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `entries`, in the given order.
    #[must_use]
    pub fn with_entries(entries: Vec<LogEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl LogStore for MemoryLogStore {
    async fn read_all(&self) -> Result<Vec<LogEntry>> {
        Ok(self.entries.read().clone())
    }

    async fn append(&self, entry: LogEntry) -> Result<LogEntry> {
        self.entries.write().push(entry.clone());
        Ok(entry)
    }
}

/// Shared in-memory store handle.
pub type SharedMemoryStore = Arc<MemoryLogStore>;
