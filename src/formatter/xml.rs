//! XML formatter
//!
//! Every document has a single `<imagehost>` root. Keyed data is written as
//! `<tag key="...">` elements since keys are not guaranteed to be valid XML
//! names.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

use super::{DateFormatter, FormatError, Formatter};
use crate::model::{
    ArrayModel, ErrorModel, ImagesModel, KeyedData, ListModel, MetadataModel, StatsModel,
    StatusModel, UserModel,
};

const ROOT: &str = "imagehost";

type XmlResult = Result<(), quick_xml::Error>;

#[derive(Debug, Clone, Copy)]
pub struct XmlFormatter {
    dates: DateFormatter,
}

impl XmlFormatter {
    pub const fn new(dates: DateFormatter) -> Self {
        Self { dates }
    }

    /// Write a complete document, with `body` filling the root element
    fn document<F>(&self, body: F) -> Result<String, FormatError>
    where
        F: FnOnce(&mut Writer<Vec<u8>>) -> XmlResult,
    {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        start(&mut writer, ROOT)?;
        body(&mut writer)?;
        end(&mut writer, ROOT)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> XmlResult {
    writer.write_event(Event::Start(BytesStart::new(name)))
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> XmlResult {
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> XmlResult {
    start(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

/// Write an arbitrary JSON value below an element called `name`
fn value(writer: &mut Writer<Vec<u8>>, name: &str, key: Option<&str>, data: &Value) -> XmlResult {
    let mut tag = BytesStart::new(name);
    if let Some(key) = key {
        tag.push_attribute(("key", key));
    }

    match data {
        Value::Null => writer.write_event(Event::Empty(tag)),
        Value::Object(map) => {
            writer.write_event(Event::Start(tag))?;
            keyed(writer, map)?;
            end(writer, name)
        }
        Value::Array(items) => {
            writer.write_event(Event::Start(tag))?;
            for item in items {
                value(writer, "item", None, item)?;
            }
            end(writer, name)
        }
        Value::String(s) => {
            writer.write_event(Event::Start(tag))?;
            writer.write_event(Event::Text(BytesText::new(s)))?;
            end(writer, name)
        }
        other => {
            writer.write_event(Event::Start(tag))?;
            writer.write_event(Event::Text(BytesText::new(&other.to_string())))?;
            end(writer, name)
        }
    }
}

fn keyed(writer: &mut Writer<Vec<u8>>, data: &KeyedData) -> XmlResult {
    for (key, data) in data {
        value(writer, "tag", Some(key), data)?;
    }
    Ok(())
}

fn optional(dimension: Option<u32>) -> String {
    dimension.map(|d| d.to_string()).unwrap_or_default()
}

impl Formatter for XmlFormatter {
    fn content_type(&self) -> &'static str {
        "application/xml"
    }

    fn format_error(&self, model: &ErrorModel) -> Result<String, FormatError> {
        self.document(|w| {
            start(w, "error")?;
            element(w, "code", &model.http_code.to_string())?;
            element(w, "message", &model.message)?;
            element(w, "date", &self.dates.format_date(&model.date))?;
            element(w, "imboErrorCode", &model.error_code.to_string())?;
            end(w, "error")?;
            if let Some(image_identifier) = &model.image_identifier {
                element(w, "imageIdentifier", image_identifier)?;
            }
            Ok(())
        })
    }

    fn format_status(&self, model: &StatusModel) -> Result<String, FormatError> {
        self.document(|w| {
            start(w, "status")?;
            element(w, "date", &self.dates.format_date(&model.date))?;
            element(w, "database", &model.database.to_string())?;
            element(w, "storage", &model.storage.to_string())?;
            end(w, "status")
        })
    }

    fn format_user(&self, model: &UserModel) -> Result<String, FormatError> {
        self.document(|w| {
            start(w, "user")?;
            element(w, "publicKey", &model.public_key)?;
            element(w, "numImages", &model.num_images.to_string())?;
            element(w, "lastModified", &self.dates.format_date(&model.last_modified))?;
            end(w, "user")
        })
    }

    fn format_images(&self, model: &ImagesModel) -> Result<String, FormatError> {
        self.document(|w| {
            start(w, "search")?;
            element(w, "hits", &model.hits.to_string())?;
            element(w, "page", &model.page.to_string())?;
            element(w, "limit", &model.limit.to_string())?;
            element(w, "count", &model.count.to_string())?;
            end(w, "search")?;

            start(w, "images")?;
            for image in &model.images {
                start(w, "image")?;
                let fields = [
                    ("added", self.dates.format_date(&image.added)),
                    ("updated", self.dates.format_date(&image.updated)),
                    ("checksum", image.checksum.clone()),
                    ("extension", image.extension.clone()),
                    ("size", image.size.to_string()),
                    ("width", optional(image.width)),
                    ("height", optional(image.height)),
                    ("mime", image.mime.clone()),
                    ("imageIdentifier", image.image_identifier.clone()),
                    ("publicKey", image.public_key.clone()),
                ];
                for (name, text) in fields.iter().filter(|(name, _)| model.shows(name)) {
                    element(w, name, text)?;
                }
                if model.shows("metadata") {
                    if let Some(metadata) = &image.metadata {
                        start(w, "metadata")?;
                        keyed(w, metadata)?;
                        end(w, "metadata")?;
                    }
                }
                end(w, "image")?;
            }
            end(w, "images")
        })
    }

    fn format_metadata(&self, model: &MetadataModel) -> Result<String, FormatError> {
        self.document(|w| {
            start(w, "metadata")?;
            keyed(w, &model.data)?;
            end(w, "metadata")
        })
    }

    fn format_array_model(&self, model: &ArrayModel) -> Result<String, FormatError> {
        self.document(|w| keyed(w, &model.data))
    }

    fn format_list_model(&self, model: &ListModel) -> Result<String, FormatError> {
        self.document(|w| {
            let mut tag = BytesStart::new("list");
            tag.push_attribute(("name", model.container.as_str()));
            w.write_event(Event::Start(tag))?;
            for item in &model.list {
                value(w, "item", None, item)?;
            }
            end(w, "list")
        })
    }

    fn format_stats(&self, model: &StatsModel) -> Result<String, FormatError> {
        self.document(|w| {
            start(w, "stats")?;
            start(w, "users")?;
            for user in &model.users {
                let mut tag = BytesStart::new("user");
                tag.push_attribute(("publicKey", user.public_key.as_str()));
                w.write_event(Event::Start(tag))?;
                element(w, "numImages", &user.num_images.to_string())?;
                element(w, "numBytes", &user.num_bytes.to_string())?;
                end(w, "user")?;
            }
            end(w, "users")?;
            start(w, "total")?;
            element(w, "numImages", &model.num_images.to_string())?;
            element(w, "numUsers", &model.num_users.to_string())?;
            element(w, "numBytes", &model.num_bytes.to_string())?;
            end(w, "total")?;
            start(w, "custom")?;
            if let Some(custom) = &model.custom {
                keyed(w, custom)?;
            }
            end(w, "custom")?;
            end(w, "stats")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Map};

    fn formatter() -> XmlFormatter {
        XmlFormatter::new(DateFormatter)
    }

    #[test]
    fn test_error_document() {
        let model = ErrorModel {
            http_code: 418,
            message: "I'm a teapot".into(),
            date: Utc.with_ymd_and_hms(2012, 1, 3, 10, 48, 22).unwrap(),
            error_code: 0,
            image_identifier: None,
        };
        let xml = formatter().format_error(&model).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<imagehost><error><code>418</code>"));
        assert!(xml.contains("<message>I&apos;m a teapot</message>"));
        assert!(xml.contains("<date>Tue, 03 Jan 2012 10:48:22 GMT</date>"));
        assert!(!xml.contains("imageIdentifier"));
    }

    #[test]
    fn test_metadata_escapes_keys_and_values() {
        let mut data = Map::new();
        data.insert("a<b".into(), json!("x & y"));
        let xml = formatter().format_metadata(&MetadataModel { data }).unwrap();
        assert!(xml.contains(r#"<tag key="a&lt;b">x &amp; y</tag>"#));
    }

    #[test]
    fn test_empty_metadata() {
        let xml = formatter().format_metadata(&MetadataModel::default()).unwrap();
        assert!(xml.ends_with("<imagehost><metadata></metadata></imagehost>"));
    }

    #[test]
    fn test_list_model() {
        let model = ListModel {
            container: "users".into(),
            list: vec![json!("christer")],
        };
        let xml = formatter().format_list_model(&model).unwrap();
        assert!(xml.contains(r#"<list name="users"><item>christer</item></list>"#));

        let model = ListModel {
            container: "my <list>".into(),
            list: vec![],
        };
        let xml = formatter().format_list_model(&model).unwrap();
        assert!(xml.ends_with(r#"<imagehost><list name="my &lt;list&gt;"></list></imagehost>"#));
    }

    #[test]
    fn test_images_field_allow_list() {
        let date = Utc.with_ymd_and_hms(2012, 1, 3, 10, 48, 22).unwrap();
        let model = ImagesModel {
            images: vec![crate::model::Image {
                added: date,
                updated: date,
                checksum: "c".into(),
                extension: "png".into(),
                size: 10,
                width: None,
                height: None,
                mime: "image/png".into(),
                image_identifier: "id".into(),
                public_key: "christer".into(),
                metadata: Some(Map::new()),
            }],
            fields: vec!["size".into()],
            hits: 1,
            page: 1,
            limit: 20,
            count: 1,
        };
        let xml = formatter().format_images(&model).unwrap();
        assert!(xml.contains("<images><image><size>10</size></image></images>"));
    }
}
