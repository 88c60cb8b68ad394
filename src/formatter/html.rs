//! HTML formatter
//!
//! Produces a small standalone HTML5 document per model, mostly definition
//! lists, suitable for poking at the API from a browser.

use quick_xml::escape::escape;
use serde_json::Value;
use std::fmt::Write;

use super::{DateFormatter, FormatError, Formatter};
use crate::model::{
    ArrayModel, ErrorModel, ImagesModel, KeyedData, ListModel, MetadataModel, StatsModel,
    StatusModel, UserModel,
};

#[derive(Debug, Clone, Copy)]
pub struct HtmlFormatter {
    dates: DateFormatter,
}

impl HtmlFormatter {
    pub const fn new(dates: DateFormatter) -> Self {
        Self { dates }
    }

    fn document(&self, title: &str, body: &str) -> Result<String, FormatError> {
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
  </head>
  <body>
    <h1>{title}</h1>
    {body}
  </body>
</html>"#,
            title = escape(title),
            body = body,
        ))
    }
}

/// Render `(term, description)` pairs; descriptions must already be escaped
fn definition_list(entries: &[(&str, String)]) -> String {
    let mut out = String::from("<dl>");
    for (term, description) in entries {
        let _ = write!(out, "<dt>{}</dt><dd>{}</dd>", escape(*term), description);
    }
    out.push_str("</dl>");
    out
}

fn text(value: &str) -> String {
    escape(value).into_owned()
}

fn keyed(data: &KeyedData) -> String {
    let entries: Vec<(&str, String)> = data
        .iter()
        .map(|(key, value)| (key.as_str(), json_value(value)))
        .collect();
    definition_list(&entries)
}

fn json_value(data: &Value) -> String {
    match data {
        Value::Object(map) => keyed(map),
        Value::Array(items) => {
            let mut out = String::from("<ul>");
            for item in items {
                let _ = write!(out, "<li>{}</li>", json_value(item));
            }
            out.push_str("</ul>");
            out
        }
        Value::String(s) => text(s),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn optional(dimension: Option<u32>) -> String {
    dimension.map(|d| d.to_string()).unwrap_or_default()
}

impl Formatter for HtmlFormatter {
    fn content_type(&self) -> &'static str {
        "text/html"
    }

    fn format_error(&self, model: &ErrorModel) -> Result<String, FormatError> {
        let mut entries = vec![
            ("Code", model.http_code.to_string()),
            ("Message", text(&model.message)),
            ("Date", text(&self.dates.format_date(&model.date))),
            ("Error code", model.error_code.to_string()),
        ];
        if let Some(image_identifier) = &model.image_identifier {
            entries.push(("Image identifier", text(image_identifier)));
        }
        self.document("Error", &definition_list(&entries))
    }

    fn format_status(&self, model: &StatusModel) -> Result<String, FormatError> {
        let entries = [
            ("Date", text(&self.dates.format_date(&model.date))),
            ("Database", model.database.to_string()),
            ("Storage", model.storage.to_string()),
        ];
        self.document("Status", &definition_list(&entries))
    }

    fn format_user(&self, model: &UserModel) -> Result<String, FormatError> {
        let entries = [
            ("Public key", text(&model.public_key)),
            ("Number of images", model.num_images.to_string()),
            ("Last modified", text(&self.dates.format_date(&model.last_modified))),
        ];
        self.document("User", &definition_list(&entries))
    }

    fn format_images(&self, model: &ImagesModel) -> Result<String, FormatError> {
        let search = definition_list(&[
            ("Hits", model.hits.to_string()),
            ("Page", model.page.to_string()),
            ("Limit", model.limit.to_string()),
            ("Count", model.count.to_string()),
        ]);

        let mut images = String::from("<ul>");
        for image in &model.images {
            let mut entries: Vec<(&str, String)> = [
                ("added", text(&self.dates.format_date(&image.added))),
                ("updated", text(&self.dates.format_date(&image.updated))),
                ("checksum", text(&image.checksum)),
                ("extension", text(&image.extension)),
                ("size", image.size.to_string()),
                ("width", optional(image.width)),
                ("height", optional(image.height)),
                ("mime", text(&image.mime)),
                ("imageIdentifier", text(&image.image_identifier)),
                ("publicKey", text(&image.public_key)),
            ]
            .into_iter()
            .filter(|(name, _)| model.shows(name))
            .collect();

            if model.shows("metadata") {
                if let Some(metadata) = &image.metadata {
                    entries.push(("metadata", keyed(metadata)));
                }
            }
            let _ = write!(images, "<li>{}</li>", definition_list(&entries));
        }
        images.push_str("</ul>");

        self.document("Images", &format!("{search}{images}"))
    }

    fn format_metadata(&self, model: &MetadataModel) -> Result<String, FormatError> {
        self.document("Metadata", &keyed(&model.data))
    }

    fn format_array_model(&self, model: &ArrayModel) -> Result<String, FormatError> {
        self.document("Data", &keyed(&model.data))
    }

    fn format_list_model(&self, model: &ListModel) -> Result<String, FormatError> {
        let list = json_value(&Value::Array(model.list.clone()));
        self.document(&escape(model.container.as_str()), &list)
    }

    fn format_stats(&self, model: &StatsModel) -> Result<String, FormatError> {
        let users: Vec<(&str, String)> = model
            .users
            .iter()
            .map(|user| {
                let figures = definition_list(&[
                    ("Number of images", user.num_images.to_string()),
                    ("Number of bytes", user.num_bytes.to_string()),
                ]);
                (user.public_key.as_str(), figures)
            })
            .collect();

        let entries = [
            ("Users", definition_list(&users)),
            (
                "Total",
                definition_list(&[
                    ("Number of images", model.num_images.to_string()),
                    ("Number of users", model.num_users.to_string()),
                    ("Number of bytes", model.num_bytes.to_string()),
                ]),
            ),
            ("Custom", model.custom.as_ref().map(keyed).unwrap_or_else(|| keyed(&KeyedData::new()))),
        ];
        self.document("Stats", &definition_list(&entries))
    }
}
