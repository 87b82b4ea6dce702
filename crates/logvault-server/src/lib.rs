//! # logvault-server
//!
//! HTTP front end for the [`logvault`] service.
//!
//! Built on axum, it exposes submission and search as REST endpoints and
//! pushes every newly accepted entry to WebSocket and Server-Sent Events
//! clients.
//!
//! ## Example
//!
//! ```rust,no_run
//! use logvault_server::{LogServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default().with_data_file("data/logs.json");
//!     let server = LogServer::open(config).await?;
//!     server.serve().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/health` | GET | Liveness, uptime and observer count |
//! | `/api/logs` | POST | Submit one log event |
//! | `/api/logs` | GET | Search with query-string filters, newest first |
//! | `/api/logs/stream` | GET | Live entries via SSE |
//! | `/api/ws` | GET | Live entries via WebSocket |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;
pub mod websocket;

// Re-export main types
pub use config::{Cli, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::LogServer;
pub use state::{AppState, StoreBackend};
pub use types::{HealthResponse, LiveMessage};
