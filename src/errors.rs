//! Error types for the image host
//!
//! [`RoutingError`] is the closed set of failures the router can produce.
//! [`ImageHostError`] wraps it together with the domain and formatting
//! failures raised further down the request, and knows how to render itself
//! as a structured Error payload in any response format.

use axum::response::{IntoResponse, Response};
use chrono::Utc;
use http::{header, HeaderValue, StatusCode};
use thiserror::Error;
use tracing::error;

use crate::formatter::{formatter_for, FormatError};
use crate::model::{ErrorModel, ResponseModel};
use crate::routing::{allow_header, HttpMethod, ResponseFormat};

/// No specific error code applies
pub const ERR_UNSPECIFIED: u16 = 0;
/// The requested image does not exist
pub const ERR_IMAGE_NOT_FOUND: u16 = 100;
/// The public key has no images
pub const ERR_USER_NOT_FOUND: u16 = 101;
/// A metadata body was not a JSON object
pub const ERR_INVALID_METADATA: u16 = 200;
/// An image was uploaded without a body
pub const ERR_EMPTY_IMAGE: u16 = 201;
/// A query parameter could not be parsed
pub const ERR_INVALID_QUERY: u16 = 202;
/// The request body exceeded the configured limit
pub const ERR_PAYLOAD_TOO_LARGE: u16 = 203;
/// The request body could not be read
pub const ERR_INVALID_BODY: u16 = 204;

/// Classified routing failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// `BREW` was requested
    #[error("I'm a teapot")]
    Teapot,

    /// The method is not one the service recognizes at all
    #[error("Unsupported HTTP method")]
    UnsupportedMethod,

    /// The resource exists but does not accept the method
    #[error("Method not allowed")]
    MethodNotAllowed { allowed: &'static [HttpMethod] },

    /// No route matches the path
    #[error("Not Found")]
    NotFound,
}

impl RoutingError {
    pub fn status(&self) -> StatusCode {
        match self {
            RoutingError::Teapot => StatusCode::IM_A_TEAPOT,
            RoutingError::UnsupportedMethod => StatusCode::NOT_IMPLEMENTED,
            RoutingError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RoutingError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Stable label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingError::Teapot => "teapot",
            RoutingError::UnsupportedMethod => "unsupported_method",
            RoutingError::MethodNotAllowed { .. } => "method_not_allowed",
            RoutingError::NotFound => "not_found",
        }
    }
}

/// Main error type for request handling
#[derive(Error, Debug)]
pub enum ImageHostError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Image not found")]
    ImageNotFound { image_identifier: String },

    #[error("Unknown public key")]
    UserNotFound { public_key: String },

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Missing image data")]
    EmptyImage { image_identifier: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    InvalidBody(String),

    #[error("Formatting error: {0}")]
    Format(#[from] FormatError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ImageHostError {
    pub fn status(&self) -> StatusCode {
        match self {
            ImageHostError::Routing(e) => e.status(),
            ImageHostError::ImageNotFound { .. } | ImageHostError::UserNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ImageHostError::InvalidMetadata(_)
            | ImageHostError::EmptyImage { .. }
            | ImageHostError::InvalidQuery(_)
            | ImageHostError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ImageHostError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ImageHostError::Format(_) | ImageHostError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Service specific error code carried in the Error payload
    pub fn error_code(&self) -> u16 {
        match self {
            ImageHostError::ImageNotFound { .. } => ERR_IMAGE_NOT_FOUND,
            ImageHostError::UserNotFound { .. } => ERR_USER_NOT_FOUND,
            ImageHostError::InvalidMetadata(_) => ERR_INVALID_METADATA,
            ImageHostError::EmptyImage { .. } => ERR_EMPTY_IMAGE,
            ImageHostError::InvalidQuery(_) => ERR_INVALID_QUERY,
            ImageHostError::PayloadTooLarge { .. } => ERR_PAYLOAD_TOO_LARGE,
            ImageHostError::InvalidBody(_) => ERR_INVALID_BODY,
            _ => ERR_UNSPECIFIED,
        }
    }

    /// Build the Error model describing this failure
    pub fn to_model(&self) -> ErrorModel {
        let image_identifier = match self {
            ImageHostError::ImageNotFound { image_identifier }
            | ImageHostError::EmptyImage { image_identifier } => Some(image_identifier.clone()),
            _ => None,
        };

        ErrorModel {
            http_code: self.status().as_u16(),
            message: self.to_string(),
            date: Utc::now(),
            error_code: self.error_code(),
            image_identifier,
        }
    }

    /// Render this error in the given response format
    pub fn into_response_with(self, format: ResponseFormat) -> Response {
        let status = self.status();
        let formatter = formatter_for(format);
        let model = ResponseModel::Error(self.to_model());

        let mut response = match formatter.format(&model) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, formatter.content_type())],
                body,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "Failed to format error response");
                (status, self.to_string()).into_response()
            }
        };

        if let ImageHostError::Routing(RoutingError::MethodNotAllowed { allowed }) = &self {
            if let Ok(value) = HeaderValue::from_str(&allow_header(allowed)) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }

        response
    }
}

impl IntoResponse for ImageHostError {
    fn into_response(self) -> Response {
        self.into_response_with(ResponseFormat::Json)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ImageHostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_status_and_messages() {
        let cases = [
            (RoutingError::Teapot, 418, "I'm a teapot"),
            (RoutingError::UnsupportedMethod, 501, "Unsupported HTTP method"),
            (RoutingError::NotFound, 404, "Not Found"),
            (
                RoutingError::MethodNotAllowed { allowed: &[HttpMethod::Get] },
                405,
                "Method not allowed",
            ),
        ];

        for (err, status, message) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn test_wrapped_routing_error_keeps_message() {
        let err = ImageHostError::from(RoutingError::Teapot);
        let model = err.to_model();
        assert_eq!(model.http_code, 418);
        assert_eq!(model.message, "I'm a teapot");
        assert_eq!(model.error_code, ERR_UNSPECIFIED);
        assert_eq!(model.image_identifier, None);
    }

    #[test]
    fn test_image_errors_carry_identifier() {
        let err = ImageHostError::ImageNotFound {
            image_identifier: "a9b80ed42957fd508c617549cad07d6c".to_string(),
        };
        let model = err.to_model();
        assert_eq!(model.http_code, 404);
        assert_eq!(model.error_code, ERR_IMAGE_NOT_FOUND);
        assert_eq!(model.image_identifier.as_deref(), Some("a9b80ed42957fd508c617549cad07d6c"));
    }

    #[test]
    fn test_method_not_allowed_response_has_allow_header() {
        let err = ImageHostError::from(RoutingError::MethodNotAllowed {
            allowed: &[HttpMethod::Get, HttpMethod::Head],
        });
        let response = err.into_response_with(ResponseFormat::Xml);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");
    }

    #[test]
    fn test_request_input_errors() {
        let cases = [
            (ImageHostError::PayloadTooLarge { limit: 16 }, 413, ERR_PAYLOAD_TOO_LARGE),
            (ImageHostError::InvalidQuery("limit".into()), 400, ERR_INVALID_QUERY),
            (ImageHostError::InvalidBody("reset".into()), 400, ERR_INVALID_BODY),
        ];

        for (err, status, code) in cases {
            let model = err.to_model();
            assert_eq!(model.http_code, status);
            assert_eq!(model.error_code, code);
        }
        assert_eq!(
            ImageHostError::PayloadTooLarge { limit: 16 }.to_string(),
            "Request body exceeds 16 bytes"
        );
    }
}
