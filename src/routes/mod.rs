//! HTTP surface of the image host
//!
//! Every request except `GET /metrics` is resolved by the resource
//! [`Router`](crate::routing::Router) rather than by axum's own path
//! matching, so method admissibility and path shapes are decided in one
//! place:
//! - GET|HEAD /status
//! - GET|HEAD /users/{publicKey}
//! - GET|HEAD /users/{publicKey}/images
//! - GET|HEAD|PUT|DELETE /users/{publicKey}/images/{imageIdentifier}
//! - GET|HEAD|PUT|POST|DELETE /users/{publicKey}/images/{imageIdentifier}/meta

mod handlers;

use axum::routing::get;
use std::sync::Arc;

use crate::catalog::ResourceHandler;
use crate::formatter::FormatterSelector;
use crate::routing::Router;

pub use handlers::{dispatch, metrics};

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub router: Router,
    pub handler: Arc<dyn ResourceHandler>,
    pub selector: FormatterSelector,
    /// Largest request body buffered for PUT and POST
    pub max_body_size: usize,
}

impl AppState {
    pub fn new(
        handler: Arc<dyn ResourceHandler>,
        selector: FormatterSelector,
        max_body_size: usize,
    ) -> Self {
        Self {
            router: Router::new(),
            handler,
            selector,
            max_body_size,
        }
    }
}

/// Create the axum router
pub fn create_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/metrics", get(handlers::metrics).fallback(handlers::dispatch))
        .fallback(handlers::dispatch)
        .with_state(state)
}
