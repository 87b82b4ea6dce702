//! Error types for ingestion, storage and queries.

use std::fmt;

use thiserror::Error;

/// Reasons a submitted log event is rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The body was not a JSON object (null, array, scalar or not JSON at all).
    #[error("request body must be a JSON object")]
    MalformedBody,

    /// A required field was absent or null.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A required field was present but not a string.
    #[error("field {0} must be a string")]
    WrongType(&'static str),

    /// `level` was not one of the allowed values.
    #[error("invalid level {value:?}, expected one of: {}", allowed.join(", "))]
    InvalidEnum {
        /// The submitted value after lowercasing.
        value: String,
        /// The accepted values.
        allowed: Vec<&'static str>,
    },

    /// `timestamp` did not parse as a calendar date-time.
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// `metadata` was present but not a key-value object.
    #[error("metadata must be a JSON object")]
    InvalidMetadataShape,
}

impl ValidationError {
    /// Returns the name of the offending field, when the error concerns one.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::MalformedBody => None,
            Self::MissingField(name) | Self::WrongType(name) => Some(name),
            Self::InvalidEnum { .. } => Some("level"),
            Self::InvalidTimestamp(_) => Some("timestamp"),
            Self::InvalidMetadataShape => Some("metadata"),
        }
    }
}

/// Which side of the store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    /// Reading or decoding the collection.
    Read,
    /// Encoding or writing the collection.
    Write,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Errors surfaced by the log service.
#[derive(Debug, Error)]
pub enum LogError {
    /// Client input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The durable medium could not be read or written.
    ///
    /// The display form omits `reason`; use [`LogError::reason`]
    /// when logging.
    #[error("server could not {operation} log data")]
    StorageUnavailable {
        /// Whether the read or the write side failed.
        operation: StorageOp,
        /// Internal detail (paths, OS errors, decode errors).
        reason: String,
    },
}

impl LogError {
    /// Builds a read-side storage failure.
    pub fn read_failed(reason: impl fmt::Display) -> Self {
        Self::StorageUnavailable {
            operation: StorageOp::Read,
            reason: reason.to_string(),
        }
    }

    /// Builds a write-side storage failure.
    pub fn write_failed(reason: impl fmt::Display) -> Self {
        Self::StorageUnavailable {
            operation: StorageOp::Write,
            reason: reason.to_string(),
        }
    }

    /// Returns true for client-correctable validation failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true for storage failures.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }

    /// Internal detail of a storage failure.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::StorageUnavailable { reason, .. } => Some(reason),
            Self::Validation(_) => None,
        }
    }
}

/// Result type alias for log operations.
pub type Result<T> = std::result::Result<T, LogError>;
