//! Server configuration and command-line parsing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use logvault::{FileLogStoreConfig, SubscriptionHub};

use crate::error::{ServerError, ServerResult};

/// Configuration for the log server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// Location of the JSON log collection.
    pub data_file: PathBuf,
    /// Entries buffered per live observer before deliveries are dropped.
    pub subscriber_buffer: usize,
    /// Maximum WebSocket connections allowed.
    pub max_ws_connections: usize,
    /// Interval between heartbeat frames on WebSocket connections.
    pub ws_ping_interval: Duration,
    /// CORS allowed origins (empty means all).
    pub cors_origins: Vec<String>,
    /// Write the collection as indented JSON.
    pub pretty_storage: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_file: PathBuf::from("data/logs.json"),
            subscriber_buffer: SubscriptionHub::DEFAULT_BUFFER,
            max_ws_connections: 1000,
            ws_ping_interval: Duration::from_secs(30),
            cors_origins: Vec::new(),
            pretty_storage: true,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Set the collection file.
    #[must_use]
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    /// Set the per-observer buffer.
    #[must_use]
    pub const fn with_subscriber_buffer(mut self, buffer: usize) -> Self {
        self.subscriber_buffer = buffer;
        self
    }

    /// Set the maximum WebSocket connections.
    #[must_use]
    pub const fn with_max_ws_connections(mut self, max: usize) -> Self {
        self.max_ws_connections = max;
        self
    }

    /// Set the WebSocket heartbeat interval.
    #[must_use]
    pub const fn with_ws_ping_interval(mut self, interval: Duration) -> Self {
        self.ws_ping_interval = interval;
        self
    }

    /// Add a CORS allowed origin.
    #[must_use]
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origins.push(origin.into());
        self
    }

    /// Choose indented or compact storage.
    #[must_use]
    pub const fn with_pretty_storage(mut self, pretty: bool) -> Self {
        self.pretty_storage = pretty;
        self
    }

    /// Storage settings derived from this configuration.
    #[must_use]
    pub fn store_config(&self) -> FileLogStoreConfig {
        FileLogStoreConfig::new(&self.data_file).with_pretty(self.pretty_storage)
    }

    /// Check that limits and intervals are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] naming the first bad setting.
    pub fn validate(&self) -> ServerResult<()> {
        if self.subscriber_buffer == 0 {
            return Err(ServerError::InvalidConfig(
                "subscriber buffer must be at least 1".to_string(),
            ));
        }
        if self.max_ws_connections == 0 {
            return Err(ServerError::InvalidConfig(
                "max WebSocket connections must be at least 1".to_string(),
            ));
        }
        if self.ws_ping_interval.is_zero() {
            return Err(ServerError::InvalidConfig(
                "WebSocket ping interval must be non-zero".to_string(),
            ));
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(ServerError::InvalidConfig("data file path is empty".to_string()));
        }
        Ok(())
    }
}

/// Centralized log ingestion, query and live streaming server.
#[derive(Parser, Debug, Clone)]
#[command(name = "logvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "LOGVAULT_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Path of the JSON log collection.
    #[arg(long, env = "LOGVAULT_DATA_FILE", default_value = "data/logs.json")]
    pub data_file: PathBuf,

    /// Entries buffered per live observer.
    #[arg(long, env = "LOGVAULT_SUBSCRIBER_BUFFER", default_value_t = SubscriptionHub::DEFAULT_BUFFER)]
    pub subscriber_buffer: usize,

    /// Maximum concurrent WebSocket connections.
    #[arg(long, env = "LOGVAULT_MAX_WS_CONNECTIONS", default_value_t = 1000)]
    pub max_ws_connections: usize,

    /// Seconds between WebSocket heartbeats.
    #[arg(long, env = "LOGVAULT_WS_PING_SECS", default_value_t = 30)]
    pub ws_ping_secs: u64,

    /// Allowed CORS origin; repeat or comma-separate. Any origin if unset.
    #[arg(long = "cors-origin", env = "LOGVAULT_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Write the collection without indentation.
    #[arg(long)]
    pub compact_storage: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Build the server configuration from parsed arguments.
    #[must_use]
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            data_file: self.data_file,
            subscriber_buffer: self.subscriber_buffer,
            max_ws_connections: self.max_ws_connections,
            ws_ping_interval: Duration::from_secs(self.ws_ping_secs),
            cors_origins: self
                .cors_origins
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            pretty_storage: !self.compact_storage,
        }
    }
}
