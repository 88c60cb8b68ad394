//! HTTP server implementation
//!
//! Sets up the Axum HTTP server with:
//! - Resource routes
//! - Middleware (tracing, timeout, compression)
//! - Graceful shutdown

use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::catalog::ResourceHandler;
use crate::config::Config;
use crate::formatter::FormatterSelector;
use crate::routes::{self, AppState};

/// HTTP server for the image host
pub struct Server {
    config: Config,
    handler: Arc<dyn ResourceHandler>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config, handler: Arc<dyn ResourceHandler>) -> Self {
        Self { config, handler }
    }

    /// Build the Axum router with all middleware
    pub fn build_router(&self) -> axum::Router {
        let selector = FormatterSelector::new(self.config.formatting.default_format);
        let state = AppState::new(
            self.handler.clone(),
            selector,
            self.config.server.max_body_size,
        );
        routes::create_router(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(std::time::Duration::from_secs(
                        self.config.server.timeout_secs,
                    )))
                    .layer(CompressionLayer::new())
                    .into_inner(),
            )
    }

    /// Start the server and run until shutdown signal
    pub async fn start<F>(&self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = self.build_router();

        let listener = tokio::net::TcpListener::bind(self.config.server.bind_address).await?;
        info!(address = %self.config.server.bind_address, "Server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
