//! Typed path extensions
//!
//! A path suffix either selects a response representation (`json`, `xml`,
//! `html`) or, for the image resource, an image format (`png`, `jpg`, `gif`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Representation a response model can be rendered as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// application/json
    Json,
    /// application/xml
    Xml,
    /// text/html
    Html,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
            ResponseFormat::Html => "html",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ResponseFormat::Json),
            "xml" => Ok(ResponseFormat::Xml),
            "html" => Ok(ResponseFormat::Html),
            _ => Err(format!("Unknown response format: {}", s)),
        }
    }
}

/// Image formats the image resource can be addressed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpg,
    Gif,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Gif => "gif",
        }
    }

    /// Mime type served for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Map a mime type back to a format, if it is one we serve
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpg),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(ImageFormat::Png),
            "jpg" => Ok(ImageFormat::Jpg),
            "gif" => Ok(ImageFormat::Gif),
            _ => Err(format!("Unknown image format: {}", s)),
        }
    }
}

/// Extension captured from a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Format(ResponseFormat),
    Image(ImageFormat),
}

impl Extension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Format(format) => format.as_str(),
            Extension::Image(format) => format.as_str(),
        }
    }

    /// The response format selected by this extension, if any
    pub fn response_format(&self) -> Option<ResponseFormat> {
        match self {
            Extension::Format(format) => Some(*format),
            Extension::Image(_) => None,
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<&str> for Extension {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_format_parsing_is_case_sensitive() {
        assert_eq!(ResponseFormat::from_str("json").unwrap(), ResponseFormat::Json);
        assert_eq!(ResponseFormat::from_str("html").unwrap(), ResponseFormat::Html);
        assert!(ResponseFormat::from_str("JSON").is_err());
        assert!(ResponseFormat::from_str("yaml").is_err());
    }

    #[test]
    fn test_image_format_mime_types() {
        assert_eq!(ImageFormat::Jpg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::from_mime("image/jpeg"), Some(ImageFormat::Jpg));
        assert_eq!(ImageFormat::from_mime("image/webp"), None);
    }

    #[test]
    fn test_extension_compares_with_str() {
        assert_eq!(Extension::Image(ImageFormat::Png), "png");
        assert_eq!(Extension::Format(ResponseFormat::Xml).response_format(), Some(ResponseFormat::Xml));
        assert_eq!(Extension::Image(ImageFormat::Gif).response_format(), None);
    }
}
