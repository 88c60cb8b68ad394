//! HTTP method admissibility
//!
//! Only a fixed set of methods is recognized at all. `BREW` is recognized so
//! that it can be refused with 418 before anything else is looked at.

use std::fmt;
use std::str::FromStr;

use crate::errors::RoutingError;

/// Globally recognized HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Brew,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Brew => "BREW",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RoutingError;

    // Methods are matched exactly; `get` is not `GET`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "BREW" => Ok(HttpMethod::Brew),
            _ => Err(RoutingError::UnsupportedMethod),
        }
    }
}

/// Run the global method checks that precede any path matching
///
/// `BREW` yields [`RoutingError::Teapot`], anything outside the allow-list
/// yields [`RoutingError::UnsupportedMethod`].
pub fn validate_method(method: &str) -> Result<HttpMethod, RoutingError> {
    match method.parse::<HttpMethod>()? {
        HttpMethod::Brew => Err(RoutingError::Teapot),
        method => Ok(method),
    }
}

/// Render a method set the way the `Allow` header expects it
pub fn allow_header(methods: &[HttpMethod]) -> String {
    methods
        .iter()
        .map(HttpMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
