//! Request handlers

use axum::{
    body::{to_bytes, Body},
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http_body_util::LengthLimitError;
use std::collections::HashMap;
use tracing::{debug, error, instrument};

use super::AppState;
use crate::catalog::{Outcome, RequestInput};
use crate::errors::{ImageHostError, Result};
use crate::formatter::formatter_for;
use crate::metrics::{HTTP_REQUEST_DURATION, HTTP_RESPONSES, ROUTES_RESOLVED, ROUTING_ERRORS};
use crate::model::ResponseModel;
use crate::routing::{HttpMethod, ResolvedRequest, ResponseFormat};

/// Prometheus metrics endpoint
#[instrument]
pub async fn metrics() -> Response {
    match crate::metrics::render() {
        Ok(body) => body.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Route a request to its resource, run the handler and format the result
///
/// The body is left unread until the request has been routed, so method and
/// path failures are reported no matter what was sent.
#[instrument(skip_all, fields(method = %method, path = %uri.path()))]
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let timer = HTTP_REQUEST_DURATION.start_timer();
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok());

    let response = match state.router.route(method.as_str(), uri.path()) {
        Ok(resolved) => {
            ROUTES_RESOLVED
                .with_label_values(&[resolved.resource.as_str()])
                .inc();
            let format = state.selector.select(resolved.extension, accept);
            respond(&state, &resolved, &uri, &headers, body, format)
                .await
                .unwrap_or_else(|e| e.into_response_with(format))
        }
        Err(e) => {
            ROUTING_ERRORS.with_label_values(&[e.kind()]).inc();
            let format = state.selector.select(None, accept);
            ImageHostError::from(e).into_response_with(format)
        }
    };

    HTTP_RESPONSES
        .with_label_values(&[method.as_str(), response.status().as_str()])
        .inc();
    timer.observe_duration();
    response
}

async fn respond(
    state: &AppState,
    resolved: &ResolvedRequest,
    uri: &Uri,
    headers: &HeaderMap,
    body: Body,
    format: ResponseFormat,
) -> Result<Response> {
    let input = RequestInput {
        query: parse_query(uri)?,
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: read_body(resolved.method, body, state.max_body_size).await?,
    };

    let outcome = state.handler.handle(resolved, input).await?;
    render(outcome, format)
}

fn parse_query(uri: &Uri) -> Result<HashMap<String, String>> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(query)| query)
        .map_err(|e| {
            debug!(error = %e, query = ?uri.query(), "Rejected query string");
            ImageHostError::InvalidQuery(e.to_string())
        })
}

/// Buffer the body for methods that carry one, up to `limit` bytes
async fn read_body(method: HttpMethod, body: Body, limit: usize) -> Result<Bytes> {
    if !matches!(method, HttpMethod::Put | HttpMethod::Post) {
        return Ok(Bytes::new());
    }

    to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.is::<LengthLimitError>() {
            ImageHostError::PayloadTooLarge { limit }
        } else {
            ImageHostError::InvalidBody(inner.to_string())
        }
    })
}

fn render(outcome: Outcome, format: ResponseFormat) -> Result<Response> {
    match outcome {
        Outcome::Model { status, model } => render_model(status, &model, format),
        Outcome::Image { mime, data } => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime)
            .header(header::CONTENT_LENGTH, data.len())
            .body(Body::from(data))
            .map_err(|e| ImageHostError::Internal(format!("Failed to build response: {}", e))),
    }
}

fn render_model(status: StatusCode, model: &ResponseModel, format: ResponseFormat) -> Result<Response> {
    let formatter = formatter_for(format);
    let payload = formatter.format(model)?;

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, formatter.content_type())
        .body(Body::from(payload))
        .map_err(|e| ImageHostError::Internal(format!("Failed to build response: {}", e)))
}
