//! Log server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::routes::create_router;
use crate::state::AppState;

/// HTTP server exposing ingestion, search and live streams.
#[derive(Debug, Clone)]
pub struct LogServer {
    state: Arc<AppState>,
}

impl LogServer {
    /// Create a server over prepared state.
    #[must_use]
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Validate `config` and open its file store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the collection
    /// cannot be initialized.
    pub async fn open(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let state = AppState::open(config).await?;
        Ok(Self::new(Arc::new(state)))
    }

    /// Get the shared state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Create the router without starting the server.
    pub fn router(&self) -> axum::Router {
        create_router(self.state())
    }

    /// Bind the configured address and serve until a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails or the server stops abnormally.
    pub async fn serve(&self) -> ServerResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails or the server stops abnormally.
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config().bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(addr, e))?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server stops abnormally.
    pub async fn serve_on<F>(&self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: Option<SocketAddr> = listener.local_addr().ok();
        let config = self.state.config();
        info!(
            addr = ?addr,
            data_file = %config.data_file.display(),
            "log server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        info!("log server shut down");
        Ok(())
    }
}
