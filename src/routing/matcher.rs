//! Path matching against a single route definition
//!
//! A path is decomposed before structural matching:
//!
//! 1. at most one trailing `/` is removed,
//! 2. a trailing `.<extension>` is split off,
//! 3. the remainder must match the definition's anchored pattern.
//!
//! A trailing slash and an extension never appear together: `/status.json/`
//! does not match anything.

use lazy_static::lazy_static;
use regex::Regex;

use super::table::{RouteDefinition, IMAGE_IDENTIFIER, PUBLIC_KEY};

lazy_static! {
    static ref EXTENSION: Regex = {
        #[allow(clippy::unwrap_used)]
        let re = Regex::new(r"\.(?P<extension>[A-Za-z0-9_-]+)$").unwrap();
        re
    };
}

/// Identifiers extracted from a matching path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    pub public_key: Option<String>,
    pub image_identifier: Option<String>,
    /// Raw extension text; validated against the resource by the router
    pub extension: Option<String>,
}

/// Split a path into its structural part and optional extension
///
/// Returns `None` for paths that can never match a route.
pub fn split_path(path: &str) -> Option<(&str, Option<&str>)> {
    let (path, had_trailing_slash) = match path.strip_suffix('/') {
        Some(trimmed) => (trimmed, true),
        None => (path, false),
    };

    if path.is_empty() {
        return None;
    }

    match EXTENSION.captures(path) {
        Some(_) if had_trailing_slash => None,
        Some(caps) => {
            let whole = caps.get(0)?;
            let extension = caps.name("extension")?.as_str();
            Some((&path[..whole.start()], Some(extension)))
        }
        None => Some((path, None)),
    }
}

/// Attempt to match `path` against `definition`
pub fn match_path(path: &str, definition: &RouteDefinition) -> Option<Captures> {
    let (structural, extension) = split_path(path)?;
    let caps = definition.pattern.captures(structural)?;

    Some(Captures {
        public_key: caps.name(PUBLIC_KEY).map(|m| m.as_str().to_string()),
        image_identifier: caps.name(IMAGE_IDENTIFIER).map(|m| m.as_str().to_string()),
        extension: extension.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::table::{Resource, ROUTE_TABLE};

    const ID: &str = "a9b80ed42957fd508c617549cad07d6c";

    fn definition(resource: Resource) -> &'static RouteDefinition {
        ROUTE_TABLE.iter().find(|d| d.resource == resource).unwrap()
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/status"), Some(("/status", None)));
        assert_eq!(split_path("/status/"), Some(("/status", None)));
        assert_eq!(split_path("/status.json"), Some(("/status", Some("json"))));
        assert_eq!(split_path("/status.json/"), None);
        assert_eq!(split_path("/"), None);
        assert_eq!(split_path(""), None);
    }

    #[test]
    fn test_only_one_trailing_slash_is_trimmed() {
        assert!(match_path("/status//", definition(Resource::Status)).is_none());
    }

    #[test]
    fn test_empty_extension_is_not_an_extension() {
        assert_eq!(split_path("/status."), Some(("/status.", None)));
        assert!(match_path("/status.", definition(Resource::Status)).is_none());
    }

    #[test]
    fn test_matches_metadata_captures() {
        let path = format!("/users/christer/images/{ID}/meta.xml");
        let caps = match_path(&path, definition(Resource::Metadata)).unwrap();
        assert_eq!(caps.public_key.as_deref(), Some("christer"));
        assert_eq!(caps.image_identifier.as_deref(), Some(ID));
        assert_eq!(caps.extension.as_deref(), Some("xml"));
    }

    #[test]
    fn test_no_partial_matches() {
        let image = definition(Resource::Image);
        assert!(match_path(&format!("/users/christer/images/{ID}/meta"), image).is_none());
        assert!(match_path(&format!("/prefix/users/christer/images/{ID}"), image).is_none());
        assert!(match_path("/users/christer/images/a9b80ed42957fd508c617549cad07d6", image).is_none());
        assert!(match_path("/users/christer/images/A9B80ED42957FD508C617549CAD07D6C", image).is_none());
    }

    #[test]
    fn test_public_key_is_case_sensitive() {
        let user = definition(Resource::User);
        assert!(match_path("/users/Christer", user).is_none());
        assert!(match_path("/users/chrisTer.json", user).is_none());
        assert!(match_path("/users/user_name-1", user).is_some());
    }

    #[test]
    fn test_status_has_no_identifiers() {
        let caps = match_path("/status.html", definition(Resource::Status)).unwrap();
        assert_eq!(caps.public_key, None);
        assert_eq!(caps.image_identifier, None);
        assert_eq!(caps.extension.as_deref(), Some("html"));
    }
}
