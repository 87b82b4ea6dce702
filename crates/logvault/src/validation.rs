//! Schema validation for submitted log events.
//!
//! [`validate`] turns an arbitrary JSON value into a normalized
//! [`LogEntry`] or a [`ValidationError`] naming the rule that failed.
//! It has no side effects.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::timestamp::parse_instant;
use crate::types::{LogEntry, LogLevel};

/// Required text fields, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "level",
    "message",
    "resourceId",
    "timestamp",
    "traceId",
    "spanId",
    "commit",
];

/// Validates a raw request body.
///
/// Text that is not JSON at all is reported as [`ValidationError::MalformedBody`].
///
/// # Errors
///
/// Returns the first validation rule the body violates.
pub fn validate_json(body: &str) -> Result<LogEntry, ValidationError> {
    let value: Value = serde_json::from_str(body).map_err(|_| ValidationError::MalformedBody)?;
    validate(&value)
}

/// Validates a structured input and produces a normalized entry.
///
/// # Errors
///
/// Returns the first validation rule the input violates.
pub fn validate(input: &Value) -> Result<LogEntry, ValidationError> {
    let obj = input.as_object().ok_or(ValidationError::MalformedBody)?;

    let [level, message, resource_id, timestamp, trace_id, span_id, commit] =
        REQUIRED_FIELDS.map(|name| required_text(obj, name));

    let level = level?;
    let message = message?;
    let resource_id = resource_id?;
    let timestamp = timestamp?;
    let trace_id = trace_id?;
    let span_id = span_id?;
    let commit = commit?;

    if message.is_empty() {
        return Err(ValidationError::MissingField("message"));
    }

    let level: LogLevel = level
        .parse()
        .map_err(|value| ValidationError::InvalidEnum {
            value,
            allowed: LogLevel::allowed(),
        })?;

    if parse_instant(timestamp).is_none() {
        return Err(ValidationError::InvalidTimestamp(timestamp.to_string()));
    }

    let metadata = match obj.get("metadata") {
        None => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(ValidationError::InvalidMetadataShape),
    };

    Ok(LogEntry {
        level,
        message: message.to_string(),
        resource_id: resource_id.to_string(),
        timestamp: timestamp.to_string(),
        trace_id: trace_id.to_string(),
        span_id: span_id.to_string(),
        commit: commit.to_string(),
        metadata,
    })
}

fn required_text<'a>(
    obj: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ValidationError> {
    match obj.get(name) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(name)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::WrongType(name)),
    }
}
