//! Static route table
//!
//! Built once on first use and shared read-only by every request. Each
//! definition is anchored at both ends, so a path matches at most one entry
//! regardless of evaluation order.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use super::extension::Extension;
use super::method::HttpMethod;

/// Logical resource addressed by a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Status,
    User,
    Images,
    Image,
    Metadata,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Status => "status",
            Resource::User => "user",
            Resource::Images => "images",
            Resource::Image => "image",
            Resource::Metadata => "metadata",
        }
    }

    /// Whether `extension` names a representation this resource can be served as
    pub fn accepts(&self, extension: Extension) -> bool {
        matches!(
            (self, extension),
            (Resource::Image, Extension::Image(_))
                | (
                    Resource::Status | Resource::User | Resource::Images | Resource::Metadata,
                    Extension::Format(_)
                )
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable pairing of a path shape with a resource and its methods
#[derive(Debug)]
pub struct RouteDefinition {
    pub resource: Resource,
    /// Structural pattern, matched against the path once any extension and
    /// trailing slash have been removed
    pub pattern: Regex,
    pub allowed_methods: &'static [HttpMethod],
}

impl RouteDefinition {
    fn new(resource: Resource, pattern: &str, allowed_methods: &'static [HttpMethod]) -> Self {
        #[allow(clippy::unwrap_used)]
        let pattern = Regex::new(pattern).unwrap();
        Self {
            resource,
            pattern,
            allowed_methods,
        }
    }

    pub fn allows(&self, method: HttpMethod) -> bool {
        self.allowed_methods.contains(&method)
    }
}

/// Capture name for the public key segment
pub const PUBLIC_KEY: &str = "public_key";
/// Capture name for the image identifier segment
pub const IMAGE_IDENTIFIER: &str = "image_identifier";

const READ_ONLY: &[HttpMethod] = &[HttpMethod::Get, HttpMethod::Head];
const IMAGE_METHODS: &[HttpMethod] = &[
    HttpMethod::Get,
    HttpMethod::Head,
    HttpMethod::Put,
    HttpMethod::Delete,
];
const METADATA_METHODS: &[HttpMethod] = &[
    HttpMethod::Get,
    HttpMethod::Head,
    HttpMethod::Put,
    HttpMethod::Post,
    HttpMethod::Delete,
];

lazy_static! {
    /// Every route the service answers, most specific first
    pub static ref ROUTE_TABLE: Vec<RouteDefinition> = vec![
        RouteDefinition::new(
            Resource::Metadata,
            r"^/users/(?P<public_key>[a-z0-9_-]+)/images/(?P<image_identifier>[a-f0-9]{32})/meta$",
            METADATA_METHODS,
        ),
        RouteDefinition::new(
            Resource::Image,
            r"^/users/(?P<public_key>[a-z0-9_-]+)/images/(?P<image_identifier>[a-f0-9]{32})$",
            IMAGE_METHODS,
        ),
        RouteDefinition::new(
            Resource::Images,
            r"^/users/(?P<public_key>[a-z0-9_-]+)/images$",
            READ_ONLY,
        ),
        RouteDefinition::new(
            Resource::User,
            r"^/users/(?P<public_key>[a-z0-9_-]+)$",
            READ_ONLY,
        ),
        RouteDefinition::new(Resource::Status, r"^/status$", READ_ONLY),
    ];
}
