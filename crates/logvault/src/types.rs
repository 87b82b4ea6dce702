//! Core types for the log service.
//!
//! This module provides:
//! - [`LogLevel`]: The four accepted severities
//! - [`LogEntry`]: A validated, immutable log record
//! - [`FilterSet`]: Caller-supplied query constraints

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp::parse_instant;

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error conditions
    Error,
    /// Warning conditions
    Warn,
    /// General information
    Info,
    /// Debugging information
    Debug,
}

impl LogLevel {
    /// Every level, in canonical order.
    pub const ALL: [Self; 4] = [Self::Error, Self::Warn, Self::Info, Self::Debug];

    /// Returns the string representation of this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// The accepted spellings, in canonical order.
    #[must_use]
    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::as_str).collect()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Parses a level case-insensitively. The error carries the lowercased input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == lower)
            .ok_or(lower)
    }
}

/// A validated log record.
///
/// Constructed once by the validator and never mutated afterwards. The
/// timestamp keeps its submitted text; use [`LogEntry::parsed_timestamp`]
/// for comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Severity level
    pub level: LogLevel,
    /// The log message
    pub message: String,
    /// Emitting resource
    pub resource_id: String,
    /// When the event happened, as submitted
    pub timestamp: String,
    /// Distributed trace identifier
    pub trace_id: String,
    /// Span identifier within the trace
    pub span_id: String,
    /// Source revision of the emitter
    pub commit: String,
    /// Arbitrary structured fields
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl LogEntry {
    /// Parses the stored timestamp into an instant.
    ///
    /// Always `Some` for entries produced by the validator.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.timestamp)
    }
}

/// Query-string keys understood by [`FilterSet::from_pairs`].
pub const FILTER_KEYS: [&str; 8] = [
    "level",
    "message",
    "resourceId",
    "timestamp_start",
    "timestamp_end",
    "traceId",
    "spanId",
    "commit",
];

/// Filter criteria for querying logs.
///
/// Every present constraint must hold (AND). A `None` field places no
/// constraint; blank strings are normalized to `None` on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct FilterSet {
    /// Case-insensitive exact level match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Case-insensitive substring of the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Case-insensitive substring of the resource id.
    #[serde(rename = "resourceId", skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Inclusive lower bound on the timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_start: Option<String>,
    /// Inclusive upper bound on the timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_end: Option<String>,
    /// Case-insensitive substring of the trace id.
    #[serde(rename = "traceId", skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Case-insensitive substring of the span id.
    #[serde(rename = "spanId", skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    /// Case-insensitive substring of the commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl FilterSet {
    /// Creates a new empty filter that matches all logs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from key/value pairs such as a parsed query string.
    ///
    /// Unrecognized keys are ignored. Blank values mean "no constraint".
    /// When a key repeats, the last value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filters = Self::default();
        for (key, value) in pairs {
            filters.set(key.as_ref(), value);
        }
        filters
    }

    /// Sets the constraint for `key`. Returns false if the key is not recognized.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        let slot = match key {
            "level" => &mut self.level,
            "message" => &mut self.message,
            "resourceId" => &mut self.resource_id,
            "timestamp_start" => &mut self.timestamp_start,
            "timestamp_end" => &mut self.timestamp_end,
            "traceId" => &mut self.trace_id,
            "spanId" => &mut self.span_id,
            "commit" => &mut self.commit,
            _ => return false,
        };
        *slot = non_blank(value);
        true
    }

    /// Returns true if no constraint is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Adds a level filter.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = non_blank(level);
        self
    }

    /// Adds a message substring filter.
    #[must_use]
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.message = non_blank(text);
        self
    }

    /// Adds a resource id substring filter.
    #[must_use]
    pub fn with_resource_id(mut self, text: impl Into<String>) -> Self {
        self.resource_id = non_blank(text);
        self
    }

    /// Adds an inclusive lower time bound.
    #[must_use]
    pub fn with_timestamp_start(mut self, ts: impl Into<String>) -> Self {
        self.timestamp_start = non_blank(ts);
        self
    }

    /// Adds an inclusive upper time bound.
    #[must_use]
    pub fn with_timestamp_end(mut self, ts: impl Into<String>) -> Self {
        self.timestamp_end = non_blank(ts);
        self
    }

    /// Adds a trace id substring filter.
    #[must_use]
    pub fn with_trace_id(mut self, text: impl Into<String>) -> Self {
        self.trace_id = non_blank(text);
        self
    }

    /// Adds a span id substring filter.
    #[must_use]
    pub fn with_span_id(mut self, text: impl Into<String>) -> Self {
        self.span_id = non_blank(text);
        self
    }

    /// Adds a commit substring filter.
    #[must_use]
    pub fn with_commit(mut self, text: impl Into<String>) -> Self {
        self.commit = non_blank(text);
        self
    }

    /// Checks a single entry against this filter.
    ///
    /// Prefer [`crate::query::evaluate`] for whole snapshots; it compiles the
    /// filter once.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        crate::query::CompiledFilter::new(self).matches(entry)
    }
}

impl From<HashMap<String, String>> for FilterSet {
    fn from(map: HashMap<String, String>) -> Self {
        Self::from_pairs(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_entry() -> LogEntry {
        LogEntry {
            level: LogLevel::Info,
            message: "Request processed".to_string(),
            resource_id: "server-1234".to_string(),
            timestamp: "2024-01-15T12:00:00.000Z".to_string(),
            trace_id: "t2".to_string(),
            span_id: "s2".to_string(),
            commit: "c2".to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    // ===========================================
    // LogLevel Tests
    // ===========================================

    #[test]
    fn log_level_as_str() {
        assert_eq!(LogLevel::Error.as_str(), "error");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
        assert_eq!(LogLevel::allowed(), vec!["error", "warn", "info", "debug"]);
    }

    #[test]
    fn log_level_from_str_is_case_insensitive() {
        assert_eq!("ERROR".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert_eq!("Warn".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("CRITICAL".parse::<LogLevel>(), Err("critical".to_string()));
        assert_eq!("trace".parse::<LogLevel>(), Err("trace".to_string()));
    }

    #[test]
    fn log_level_serialization() {
        let json = serde_json::to_string(&LogLevel::Warn).map_err(|e| e.to_string());
        assert_eq!(json, Ok("\"warn\"".to_string()));
    }

    // ===========================================
    // LogEntry Tests
    // ===========================================

    #[test]
    fn log_entry_uses_camel_case_keys() {
        let value = serde_json::to_value(sample_entry()).unwrap_or_default();
        assert_eq!(value["resourceId"], "server-1234");
        assert_eq!(value["traceId"], "t2");
        assert_eq!(value["spanId"], "s2");
        assert_eq!(value["metadata"], json!({}));
        assert!(value.get("resource_id").is_none());
    }

    #[test]
    fn log_entry_keeps_original_timestamp_text() {
        let mut entry = sample_entry();
        entry.timestamp = "2024-01-15T14:00:00+02:00".to_string();
        let value = serde_json::to_value(&entry).unwrap_or_default();
        assert_eq!(value["timestamp"], "2024-01-15T14:00:00+02:00");
        assert_eq!(
            entry.parsed_timestamp(),
            parse_instant("2024-01-15T12:00:00Z")
        );
    }

    #[test]
    fn log_entry_metadata_defaults_when_absent_on_disk() {
        let parsed: Result<LogEntry, _> = serde_json::from_value(json!({
            "level": "info",
            "message": "m",
            "resourceId": "r",
            "timestamp": "2024-01-15T12:00:00Z",
            "traceId": "t",
            "spanId": "s",
            "commit": "c"
        }));
        assert!(parsed.is_ok_and(|e| e.metadata.is_empty()));
    }

    // ===========================================
    // FilterSet Tests
    // ===========================================

    #[test]
    fn filter_from_pairs_maps_known_keys() {
        let filters = FilterSet::from_pairs([
            ("level", "ERROR"),
            ("resourceId", "1234"),
            ("timestamp_start", "2024-01-01"),
            ("traceId", "t1"),
        ]);
        assert_eq!(filters.level.as_deref(), Some("ERROR"));
        assert_eq!(filters.resource_id.as_deref(), Some("1234"));
        assert_eq!(filters.timestamp_start.as_deref(), Some("2024-01-01"));
        assert_eq!(filters.trace_id.as_deref(), Some("t1"));
        assert!(filters.message.is_none());
    }

    #[test]
    fn filter_drops_unknown_keys_and_blank_values() {
        let filters = FilterSet::from_pairs([
            ("page", "2"),
            ("message", "   "),
            ("commit", ""),
            ("resource_id", "snake-case-is-not-recognized"),
        ]);
        assert!(filters.is_empty());
    }

    #[test]
    fn filter_set_reports_recognition() {
        let mut filters = FilterSet::new();
        assert!(filters.set("spanId", "s1"));
        assert!(!filters.set("sort", "asc"));
        assert_eq!(filters.span_id.as_deref(), Some("s1"));
    }

    #[test]
    fn filter_builder_normalizes_blank() {
        let filters = FilterSet::new().with_message(" \t").with_commit("abc");
        assert!(filters.message.is_none());
        assert_eq!(filters.commit.as_deref(), Some("abc"));
    }

    #[test]
    fn filter_deserializes_from_flat_map() {
        let filters: FilterSet = serde_json::from_value(json!({
            "level": "warn",
            "spanId": "s9",
            "unknown": "x",
            "message": ""
        }))
        .unwrap_or_default();
        assert_eq!(filters.level.as_deref(), Some("warn"));
        assert_eq!(filters.span_id.as_deref(), Some("s9"));
        assert!(filters.message.is_none());
    }

    #[test]
    fn filter_keys_are_all_recognized() {
        for key in FILTER_KEYS {
            let mut filters = FilterSet::new();
            assert!(filters.set(key, "x"), "{key} should be recognized");
            assert!(!filters.is_empty());
        }
    }

    #[test]
    fn filter_matches_single_entry() {
        let entry = sample_entry();
        assert!(FilterSet::new().matches(&entry));
        assert!(FilterSet::new().with_level("INFO").matches(&entry));
        assert!(!FilterSet::new().with_level("error").matches(&entry));
    }
}
