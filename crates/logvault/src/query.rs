//! Filter-and-sort over a snapshot of entries.
//!
//! [`evaluate`] is pure: it never mutates its input and returns a new,
//! newest-first vector.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use crate::timestamp::parse_instant;
use crate::types::{FilterSet, LogEntry};

/// A [`FilterSet`] prepared for repeated matching.
///
/// Needles are lowercased and time bounds parsed once. A bound that does
/// not parse is dropped, so it constrains nothing.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    level: Option<String>,
    message: Option<String>,
    resource_id: Option<String>,
    trace_id: Option<String>,
    span_id: Option<String>,
    commit: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

/// Blank values never reach here; the rest is matched as supplied.
fn lowered(value: Option<&String>) -> Option<String> {
    value.map(|v| v.to_lowercase())
}

fn contains(haystack: &str, needle: Option<&String>) -> bool {
    needle.is_none_or(|n| haystack.to_lowercase().contains(n.as_str()))
}

impl CompiledFilter {
    /// Compiles `filters`.
    #[must_use]
    pub fn new(filters: &FilterSet) -> Self {
        Self {
            level: lowered(filters.level.as_ref()),
            message: lowered(filters.message.as_ref()),
            resource_id: lowered(filters.resource_id.as_ref()),
            trace_id: lowered(filters.trace_id.as_ref()),
            span_id: lowered(filters.span_id.as_ref()),
            commit: lowered(filters.commit.as_ref()),
            start: filters.timestamp_start.as_deref().and_then(parse_instant),
            end: filters.timestamp_end.as_deref().and_then(parse_instant),
        }
    }

    /// Returns true if `entry` satisfies every constraint.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if self.level.as_deref().is_some_and(|l| l != entry.level.as_str()) {
            return false;
        }

        if !contains(&entry.message, self.message.as_ref())
            || !contains(&entry.resource_id, self.resource_id.as_ref())
            || !contains(&entry.trace_id, self.trace_id.as_ref())
            || !contains(&entry.span_id, self.span_id.as_ref())
            || !contains(&entry.commit, self.commit.as_ref())
        {
            return false;
        }

        if self.start.is_none() && self.end.is_none() {
            return true;
        }
        // An entry without a parsable instant cannot satisfy a time bound.
        let Some(ts) = entry.parsed_timestamp() else {
            return false;
        };
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts <= end)
    }
}

/// Returns the entries matching `filters`, newest first.
///
/// Entries with equal instants keep their relative storage order. Entries
/// whose timestamp does not parse sort last.
#[must_use]
pub fn evaluate(entries: &[LogEntry], filters: &FilterSet) -> Vec<LogEntry> {
    let filter = CompiledFilter::new(filters);

    let mut keyed: Vec<(Option<DateTime<Utc>>, &LogEntry)> = entries
        .iter()
        .filter(|e| filter.matches(e))
        .map(|e| (e.parsed_timestamp(), e))
        .collect();

    // `None < Some(_)`, so reversing puts unparsable entries at the end.
    keyed.sort_by_key(|(ts, _)| Reverse(*ts));

    keyed.into_iter().map(|(_, e)| e.clone()).collect()
}
