//! Web server for CareData.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::auth::SessionManager;
use crate::config::Config;
use crate::{CareError, Database};

use super::handlers::AppState;
use super::router::create_router;

/// Interval between expired-session sweeps.
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// HTTP server.
pub struct WebServer {
    addr: SocketAddr,
    app_state: AppState,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: Database) -> crate::Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| CareError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: AppState::new(db, config)?,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Application state, for embedding the router elsewhere.
    pub fn state(&self) -> &AppState {
        &self.app_state
    }

    /// Start the session cleanup background task.
    ///
    /// Runs every hour and deletes expired session rows.
    fn start_session_cleanup_task(sessions: SessionManager) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match sessions.cleanup_expired().await {
                    Ok(0) => tracing::debug!("No expired sessions to clean up"),
                    Ok(count) => {
                        tracing::info!(deleted_count = count, "Cleaned up expired sessions")
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to clean up sessions"),
                }
            }
        });
    }

    fn build(self) -> (SocketAddr, SessionManager, Router) {
        let sessions = self.app_state.sessions.clone();
        let router = create_router(self.app_state).layer(CompressionLayer::new());
        (self.addr, sessions, router)
    }

    /// Run the web server until Ctrl-C.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let (addr, sessions, router) = self.build();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        Self::start_session_cleanup_task(sessions);
        tracing::info!("Session cleanup task started (runs every hour)");
        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr, std::io::Error> {
        let (addr, sessions, router) = self.build();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        Self::start_session_cleanup_task(sessions);
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
