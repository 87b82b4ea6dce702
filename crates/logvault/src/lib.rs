//! # logvault
//!
//! Centralized log ingestion, query and live fan-out.
//!
//! This crate provides:
//!
//! - [`LogEntry`] — A validated log record
//! - [`LogLevel`] — Severity levels (error, warn, info, debug)
//! - [`FilterSet`] — Query constraints built from query-string pairs
//! - [`validate`] — Schema validation of submitted events
//! - [`evaluate`] — Filtering and newest-first ordering
//! - [`LogStore`] — Abstract trait for storage backends
//! - [`FileLogStore`] — Durable single-file JSON storage
//! - [`MemoryLogStore`] — Volatile in-memory storage
//! - [`SubscriptionHub`] — Live delivery to observers
//! - [`LogService`] — The ingest and query pipeline
//!
//! ## Example
//!
//! ```rust
//! use logvault::{evaluate, validate, FilterSet, LogLevel};
//! use serde_json::json;
//!
//! let entry = validate(&json!({
//!     "level": "ERROR",
//!     "message": "Database connection failed",
//!     "resourceId": "server-1234",
//!     "timestamp": "2024-01-15T14:00:00.000Z",
//!     "traceId": "t1",
//!     "spanId": "s1",
//!     "commit": "c1"
//! }))
//! .expect("valid event");
//! assert_eq!(entry.level, LogLevel::Error);
//!
//! let filters = FilterSet::from_pairs([("resourceId", "1234")]);
//! let found = evaluate(&[entry], &filters);
//! assert_eq!(found.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod file_store;
pub mod hub;
pub mod query;
pub mod service;
pub mod store;
pub mod timestamp;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export main types
pub use error::{LogError, Result, StorageOp, ValidationError};
pub use file_store::{FileLogStore, FileLogStoreConfig};
pub use hub::{SubscriberId, Subscription, SubscriptionHub};
pub use query::{evaluate, CompiledFilter};
pub use service::LogService;
pub use store::{MemoryLogStore, SharedMemoryStore};
pub use timestamp::parse_instant;
pub use traits::LogStore;
pub use types::{FilterSet, LogEntry, LogLevel, FILTER_KEYS};
pub use validation::{validate, validate_json, REQUIRED_FIELDS};
