//! Wire types for live streaming clients.

use chrono::{DateTime, Utc};
use logvault::LogEntry;
use serde::{Deserialize, Serialize};

/// A frame pushed to WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    /// A newly accepted entry.
    Log {
        /// The stored entry.
        entry: LogEntry,
    },
    /// Keepalive sent on the ping interval.
    Heartbeat {
        /// Server time.
        timestamp: DateTime<Utc>,
    },
}

impl LiveMessage {
    /// Heartbeat stamped with the current time.
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::Heartbeat {
            timestamp: Utc::now(),
        }
    }

    /// Get the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Log { .. } => "log",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Registered live observers.
    pub subscribers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_entry() -> LogEntry {
        let entry = logvault::validate(&json!({
            "level": "warn",
            "message": "slow query",
            "resourceId": "db-01",
            "timestamp": "2024-01-15T12:00:00Z",
            "traceId": "t",
            "spanId": "s",
            "commit": "c",
            "metadata": {"ms": 812}
        }));
        entry.unwrap_or_else(|e| panic!("fixture rejected: {e}"))
    }

    #[test]
    fn test_log_frame_shape() {
        let frame = LiveMessage::Log {
            entry: sample_entry(),
        };
        let value = serde_json::to_value(&frame).unwrap_or_default();

        assert_eq!(value["type"], "log");
        assert_eq!(value["entry"]["resourceId"], "db-01");
        assert_eq!(value["entry"]["metadata"]["ms"], 812);
        assert_eq!(frame.event_type(), "log");
    }

    #[test]
    fn test_heartbeat_frame_shape() {
        let frame = LiveMessage::heartbeat();
        let value = serde_json::to_value(&frame).unwrap_or_default();

        assert_eq!(value["type"], "heartbeat");
        assert!(value["timestamp"].is_string());
        assert_eq!(frame.event_type(), "heartbeat");
    }

    #[test]
    fn test_frame_parses_back() {
        let text = serde_json::to_string(&LiveMessage::Log {
            entry: sample_entry(),
        })
        .unwrap_or_default();
        let parsed: Result<LiveMessage, _> = serde_json::from_str(&text);
        assert!(matches!(parsed, Ok(LiveMessage::Log { entry }) if entry.message == "slow query"));
    }
}
