//! The ingestion and query pipeline.
//!
//! [`LogService`] ties validation, storage, querying and live fan-out
//! together. An entry is published to observers only after it is durable,
//! and observers see entries in the order they were appended.
//!
//! Each commit runs on its own task. Dropping an `ingest` future after the
//! append has started does not stop the entry from being published.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{LogError, Result};
use crate::hub::{Subscription, SubscriptionHub};
use crate::query::evaluate;
use crate::traits::LogStore;
use crate::types::{FilterSet, LogEntry};
use crate::validation::{validate, validate_json};

/// Log ingestion and query service over a [`LogStore`].
///
/// Cloning is cheap; clones share the store, the hub and the commit order.
#[derive(Debug)]
pub struct LogService<S> {
    inner: Arc<ServiceInner<S>>,
}

impl<S> Clone for LogService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct ServiceInner<S> {
    store: S,
    hub: SubscriptionHub,
    /// Held across append and publish.
    sequencer: Mutex<()>,
}

impl<S: LogStore> ServiceInner<S> {
    async fn commit(&self, entry: LogEntry) -> Result<LogEntry> {
        let _turn = self.sequencer.lock().await;

        let stored = self.store.append(entry).await.inspect_err(|e| {
            warn!(
                error = %e,
                reason = e.reason().unwrap_or_default(),
                "failed to persist log entry"
            );
        })?;

        let delivered = self.hub.publish(&stored);
        debug!(
            level = %stored.level,
            resource_id = %stored.resource_id,
            delivered,
            "log entry accepted"
        );
        Ok(stored)
    }
}

impl<S: LogStore + 'static> LogService<S> {
    /// Creates a service with a fresh hub.
    pub fn new(store: S) -> Self {
        Self::with_hub(store, SubscriptionHub::new())
    }

    /// Creates a service that publishes into an existing hub.
    pub fn with_hub(store: S, hub: SubscriptionHub) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                store,
                hub,
                sequencer: Mutex::new(()),
            }),
        }
    }

    /// Validates, persists and broadcasts one submitted event.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `input` is rejected; nothing is stored
    /// or published. Returns `StorageUnavailable` if the entry could not be
    /// persisted; nothing is published.
    pub async fn ingest(&self, input: &Value) -> Result<LogEntry> {
        let entry = validate(input)?;
        self.commit(entry).await
    }

    /// Like [`LogService::ingest`], starting from a raw request body.
    ///
    /// # Errors
    ///
    /// As [`LogService::ingest`]; text that is not JSON is a validation error.
    pub async fn ingest_json(&self, body: &str) -> Result<LogEntry> {
        let entry = validate_json(body)?;
        self.commit(entry).await
    }

    /// Appends and publishes on a detached task so the pair always completes
    /// together, even if the caller stops waiting.
    async fn commit(&self, entry: LogEntry) -> Result<LogEntry> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.commit(entry).await })
            .await
            .map_err(|e| {
                warn!(error = %e, "log commit task failed");
                LogError::write_failed(format!("commit task failed: {e}"))
            })?
    }

    /// Returns stored entries matching `filters`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be read.
    pub async fn query(&self, filters: &FilterSet) -> Result<Vec<LogEntry>> {
        let snapshot = self.inner.store.read_all().await.inspect_err(|e| {
            warn!(
                error = %e,
                reason = e.reason().unwrap_or_default(),
                "failed to read log entries"
            );
        })?;
        let result = evaluate(&snapshot, filters);
        debug!(scanned = snapshot.len(), matched = result.len(), "log query");
        Ok(result)
    }

    /// Registers a live observer for entries accepted from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.inner.hub.subscribe()
    }

    /// The hub used for live delivery.
    pub fn hub(&self) -> &SubscriptionHub {
        &self.inner.hub
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }
}
