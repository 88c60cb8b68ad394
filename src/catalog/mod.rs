//! Business logic behind resolved routes
//!
//! Once the router has identified a resource, the request is handed to a
//! [`ResourceHandler`], which answers with a response model to be formatted
//! or with raw image data.

mod memory;

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use std::collections::HashMap;

use crate::errors::Result;
use crate::model::ResponseModel;
use crate::routing::ResolvedRequest;

pub use memory::MemoryCatalog;

/// Request data beyond what the router resolved
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    pub query: HashMap<String, String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// What a handler produced for a request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A model to be rendered by the negotiated formatter
    Model {
        status: StatusCode,
        model: ResponseModel,
    },
    /// Image bytes served as-is
    Image { mime: String, data: Bytes },
}

impl Outcome {
    pub fn ok(model: ResponseModel) -> Self {
        Outcome::Model {
            status: StatusCode::OK,
            model,
        }
    }
}

/// Handles requests for resolved resources
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn handle(&self, request: &ResolvedRequest, input: RequestInput) -> Result<Outcome>;
}
