//! Request routing for the image hosting API
//!
//! Resolves a raw HTTP method and path into the resource being addressed:
//!
//! - `/status[.ext]`
//! - `/users/{publicKey}[.ext]`
//! - `/users/{publicKey}/images[.ext]`
//! - `/users/{publicKey}/images/{imageIdentifier}[.ext]`
//! - `/users/{publicKey}/images/{imageIdentifier}/meta[.ext]`
//!
//! Global method checks always run first, so `BREW` is a teapot and `TRACE`
//! is unsupported no matter what path they are sent to.

mod extension;
mod matcher;
mod method;
mod table;

use tracing::{debug, warn};

use crate::errors::RoutingError;

pub use extension::{Extension, ImageFormat, ResponseFormat};
pub use matcher::{match_path, split_path, Captures};
pub use method::{allow_header, validate_method, HttpMethod};
pub use table::{Resource, RouteDefinition, ROUTE_TABLE};

/// Outcome of a successful routing attempt
///
/// Owned by the handling of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub resource: Resource,
    pub public_key: Option<String>,
    /// Only set for the image and metadata resources
    pub image_identifier: Option<String>,
    pub extension: Option<Extension>,
}

/// Resolves requests against a route table
#[derive(Debug, Clone, Copy)]
pub struct Router {
    routes: &'static [RouteDefinition],
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a router over the process-wide [`ROUTE_TABLE`]
    pub fn new() -> Self {
        Self {
            routes: ROUTE_TABLE.as_slice(),
        }
    }

    /// Route a request
    ///
    /// # Errors
    ///
    /// - [`RoutingError::Teapot`] for `BREW`, regardless of the path
    /// - [`RoutingError::UnsupportedMethod`] for methods outside the allow-list
    /// - [`RoutingError::NotFound`] when no route matches, or the extension is
    ///   not one the matched resource can be served as
    /// - [`RoutingError::MethodNotAllowed`] when the resource does not accept
    ///   the method
    pub fn route(&self, method: &str, path: &str) -> Result<ResolvedRequest, RoutingError> {
        let result = self.resolve(method, path);
        match &result {
            Ok(resolved) => debug!(
                method,
                resource = %resolved.resource,
                public_key = ?resolved.public_key,
                image_identifier = ?resolved.image_identifier,
                extension = ?resolved.extension.map(|e| e.as_str()),
                "Route resolved"
            ),
            Err(e) => warn!(
                method,
                path,
                kind = e.kind(),
                status = e.status().as_u16(),
                "Route rejected"
            ),
        }
        result
    }

    fn resolve(&self, method: &str, path: &str) -> Result<ResolvedRequest, RoutingError> {
        let method = validate_method(method)?;

        let (definition, captures) = self
            .routes
            .iter()
            .find_map(|definition| match_path(path, definition).map(|caps| (definition, caps)))
            .ok_or(RoutingError::NotFound)?;

        let extension = match captures.extension.as_deref() {
            Some(raw) => Some(parse_extension(definition.resource, raw)?),
            None => None,
        };

        if !definition.allows(method) {
            return Err(RoutingError::MethodNotAllowed {
                allowed: definition.allowed_methods,
            });
        }

        Ok(ResolvedRequest {
            method,
            resource: definition.resource,
            public_key: captures.public_key,
            image_identifier: captures.image_identifier,
            extension,
        })
    }
}

fn parse_extension(resource: Resource, raw: &str) -> Result<Extension, RoutingError> {
    let extension = match raw.parse::<ResponseFormat>() {
        Ok(format) => Extension::Format(format),
        Err(_) => Extension::Image(raw.parse::<ImageFormat>().map_err(|_| RoutingError::NotFound)?),
    };

    if resource.accepts(extension) {
        Ok(extension)
    } else {
        Err(RoutingError::NotFound)
    }
}
