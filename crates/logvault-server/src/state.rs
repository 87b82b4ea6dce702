//! Shared state for the log server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use logvault::{
    FileLogStore, LogEntry, LogService, LogStore, MemoryLogStore, Result as LogResult,
    SubscriptionHub,
};

use crate::config::ServerConfig;

/// Storage backends the server can run on.
#[derive(Debug)]
pub enum StoreBackend {
    /// Durable single-file JSON collection.
    File(FileLogStore),
    /// Volatile in-memory collection.
    Memory(MemoryLogStore),
}

impl LogStore for StoreBackend {
    async fn read_all(&self) -> LogResult<Vec<LogEntry>> {
        match self {
            Self::File(store) => store.read_all().await,
            Self::Memory(store) => store.read_all().await,
        }
    }

    async fn append(&self, entry: LogEntry) -> LogResult<LogEntry> {
        match self {
            Self::File(store) => store.append(entry).await,
            Self::Memory(store) => store.append(entry).await,
        }
    }
}

/// Shared state for the log server.
#[derive(Debug)]
pub struct AppState {
    config: ServerConfig,
    service: LogService<StoreBackend>,
    /// Number of active WebSocket connections.
    ws_connections: AtomicUsize,
    start_time: Instant,
}

impl AppState {
    /// Create state over an existing backend.
    pub fn new(config: ServerConfig, store: StoreBackend) -> Self {
        let hub = SubscriptionHub::with_buffer(config.subscriber_buffer);
        Self {
            config,
            service: LogService::with_hub(store, hub),
            ws_connections: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Open the file store named by `config`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be initialized.
    pub async fn open(config: ServerConfig) -> LogResult<Self> {
        let store = FileLogStore::open(config.store_config()).await?;
        Ok(Self::new(config, StoreBackend::File(store)))
    }

    /// Create state backed by memory only.
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(config, StoreBackend::Memory(MemoryLogStore::new()))
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the log service.
    #[must_use]
    pub const fn service(&self) -> &LogService<StoreBackend> {
        &self.service
    }

    /// Number of live observers across SSE and WebSocket clients.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.service.hub().subscriber_count()
    }

    /// Get the number of active WebSocket connections.
    #[must_use]
    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::Relaxed)
    }

    /// Increment the WebSocket connection count.
    ///
    /// Returns `true` if the connection was allowed, `false` if limit reached.
    pub fn add_ws_connection(&self) -> bool {
        let current = self.ws_connections.fetch_add(1, Ordering::Relaxed);
        if current >= self.config.max_ws_connections {
            self.ws_connections.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Decrement the WebSocket connection count.
    pub fn remove_ws_connection(&self) {
        self.ws_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
