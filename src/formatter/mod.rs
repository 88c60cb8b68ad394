//! Response formatters
//!
//! A [`Formatter`] turns a [`ResponseModel`] into a payload of one content
//! type. All formatters share the same field semantics and render dates
//! through [`DateFormatter`]. [`FormatterSelector`] picks the representation
//! for a request from its path extension and `Accept` header.

mod date;
mod html;
mod json;
mod xml;

use mime::Mime;
use thiserror::Error;

use crate::model::{
    ArrayModel, ErrorModel, ImagesModel, ListModel, MetadataModel, ResponseModel, StatsModel,
    StatusModel, UserModel,
};
use crate::routing::{Extension, ResponseFormat};

pub use date::DateFormatter;
pub use html::HtmlFormatter;
pub use json::JsonFormatter;
pub use xml::XmlFormatter;

/// Failure while rendering a model
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML encoding failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Renders response models as a single content type
pub trait Formatter: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn format_error(&self, model: &ErrorModel) -> Result<String, FormatError>;
    fn format_status(&self, model: &StatusModel) -> Result<String, FormatError>;
    fn format_user(&self, model: &UserModel) -> Result<String, FormatError>;
    fn format_images(&self, model: &ImagesModel) -> Result<String, FormatError>;
    fn format_metadata(&self, model: &MetadataModel) -> Result<String, FormatError>;
    fn format_array_model(&self, model: &ArrayModel) -> Result<String, FormatError>;
    fn format_list_model(&self, model: &ListModel) -> Result<String, FormatError>;
    fn format_stats(&self, model: &StatsModel) -> Result<String, FormatError>;

    /// Dispatch on the model variant
    fn format(&self, model: &ResponseModel) -> Result<String, FormatError> {
        match model {
            ResponseModel::Error(m) => self.format_error(m),
            ResponseModel::Status(m) => self.format_status(m),
            ResponseModel::User(m) => self.format_user(m),
            ResponseModel::Images(m) => self.format_images(m),
            ResponseModel::Metadata(m) => self.format_metadata(m),
            ResponseModel::Array(m) => self.format_array_model(m),
            ResponseModel::List(m) => self.format_list_model(m),
            ResponseModel::Stats(m) => self.format_stats(m),
        }
    }
}

static JSON: JsonFormatter = JsonFormatter::new(DateFormatter);
static XML: XmlFormatter = XmlFormatter::new(DateFormatter);
static HTML: HtmlFormatter = HtmlFormatter::new(DateFormatter);

/// The shared formatter instance for a format
pub fn formatter_for(format: ResponseFormat) -> &'static dyn Formatter {
    match format {
        ResponseFormat::Json => &JSON,
        ResponseFormat::Xml => &XML,
        ResponseFormat::Html => &HTML,
    }
}

/// Chooses a response format for a request
#[derive(Debug, Clone, Copy)]
pub struct FormatterSelector {
    default_format: ResponseFormat,
}

impl FormatterSelector {
    pub fn new(default_format: ResponseFormat) -> Self {
        Self { default_format }
    }

    /// Pick a format: path extension first, then `Accept`, then the default
    pub fn select(&self, extension: Option<Extension>, accept: Option<&str>) -> ResponseFormat {
        if let Some(format) = extension.and_then(|e| e.response_format()) {
            return format;
        }

        accept
            .and_then(|accept| self.negotiate(accept))
            .unwrap_or(self.default_format)
    }

    fn negotiate(&self, accept: &str) -> Option<ResponseFormat> {
        let mut ranges: Vec<(Mime, f32)> = accept
            .split(',')
            .filter_map(|range| range.trim().parse::<Mime>().ok())
            .map(|mime| {
                let q = mime
                    .params()
                    .find(|(name, _)| name.as_str() == "q")
                    .and_then(|(_, q)| q.as_str().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (mime, q)
            })
            .filter(|(_, q)| *q > 0.0)
            .collect();

        // Stable, so equal weights keep the client's order
        ranges.sort_by(|a, b| b.1.total_cmp(&a.1));

        ranges
            .iter()
            .find_map(|(mime, _)| self.format_for_mime(mime))
    }

    fn format_for_mime(&self, mime: &Mime) -> Option<ResponseFormat> {
        match (mime.type_(), mime.subtype()) {
            (mime::APPLICATION, mime::JSON) => Some(ResponseFormat::Json),
            (mime::APPLICATION, mime::XML) | (mime::TEXT, mime::XML) => Some(ResponseFormat::Xml),
            (mime::TEXT, mime::HTML) => Some(ResponseFormat::Html),
            (mime::APPLICATION, mime::STAR) => Some(ResponseFormat::Json),
            (mime::STAR, mime::STAR) => Some(self.default_format),
            _ => None,
        }
    }
}

impl Default for FormatterSelector {
    fn default() -> Self {
        Self::new(ResponseFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ImageFormat;

    #[test]
    fn test_extension_wins_over_accept() {
        let selector = FormatterSelector::default();
        let format = selector.select(
            Some(Extension::Format(ResponseFormat::Xml)),
            Some("text/html"),
        );
        assert_eq!(format, ResponseFormat::Xml);
    }

    #[test]
    fn test_image_extension_falls_back_to_accept() {
        let selector = FormatterSelector::default();
        let format = selector.select(Some(Extension::Image(ImageFormat::Png)), Some("text/html"));
        assert_eq!(format, ResponseFormat::Html);
    }

    #[test]
    fn test_accept_quality_ordering() {
        let selector = FormatterSelector::default();
        let accept = "text/html;q=0.5, application/xml;q=0.9, image/png";
        assert_eq!(selector.select(None, Some(accept)), ResponseFormat::Xml);
    }

    #[test]
    fn test_wildcard_and_unknown_use_default() {
        let selector = FormatterSelector::new(ResponseFormat::Html);
        assert_eq!(selector.select(None, Some("*/*")), ResponseFormat::Html);
        assert_eq!(selector.select(None, Some("image/gif")), ResponseFormat::Html);
        assert_eq!(selector.select(None, Some("not a mime")), ResponseFormat::Html);
        assert_eq!(selector.select(None, None), ResponseFormat::Html);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(formatter_for(ResponseFormat::Json).content_type(), "application/json");
        assert_eq!(formatter_for(ResponseFormat::Xml).content_type(), "application/xml");
        assert_eq!(formatter_for(ResponseFormat::Html).content_type(), "text/html");
    }
}
