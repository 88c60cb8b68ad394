//! JSON formatter

use serde_json::{json, Map, Value};

use super::{DateFormatter, FormatError, Formatter};
use crate::model::{
    ArrayModel, ErrorModel, Image, ImagesModel, KeyedData, ListModel, MetadataModel, StatsModel,
    StatusModel, UserModel,
};

#[derive(Debug, Clone, Copy)]
pub struct JsonFormatter {
    dates: DateFormatter,
}

impl JsonFormatter {
    pub const fn new(dates: DateFormatter) -> Self {
        Self { dates }
    }

    fn encode(&self, data: &Value) -> Result<String, FormatError> {
        Ok(serde_json::to_string(data)?)
    }

    fn image_entry(&self, model: &ImagesModel, image: &Image) -> Value {
        let mut entry = Map::new();
        entry.insert("added".into(), json!(self.dates.format_date(&image.added)));
        entry.insert("updated".into(), json!(self.dates.format_date(&image.updated)));
        entry.insert("checksum".into(), json!(image.checksum));
        entry.insert("extension".into(), json!(image.extension));
        entry.insert("size".into(), json!(image.size));
        entry.insert("width".into(), json!(image.width));
        entry.insert("height".into(), json!(image.height));
        entry.insert("mime".into(), json!(image.mime));
        entry.insert("imageIdentifier".into(), json!(image.image_identifier));
        entry.insert("publicKey".into(), json!(image.public_key));

        if model.shows("metadata") {
            if let Some(metadata) = &image.metadata {
                entry.insert("metadata".into(), keyed(metadata));
            }
        }

        if !model.fields.is_empty() {
            entry.retain(|key, _| model.shows(key));
        }

        Value::Object(entry)
    }
}

/// Keyed data as a JSON object; empty data stays an object, never a list
fn keyed(data: &KeyedData) -> Value {
    Value::Object(data.clone())
}

impl Formatter for JsonFormatter {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn format_error(&self, model: &ErrorModel) -> Result<String, FormatError> {
        let mut data = json!({
            "error": {
                "code": model.http_code,
                "message": model.message,
                "date": self.dates.format_date(&model.date),
                "imboErrorCode": model.error_code,
            }
        });

        if let Some(image_identifier) = &model.image_identifier {
            data["imageIdentifier"] = json!(image_identifier);
        }

        self.encode(&data)
    }

    fn format_status(&self, model: &StatusModel) -> Result<String, FormatError> {
        self.encode(&json!({
            "date": self.dates.format_date(&model.date),
            "database": model.database,
            "storage": model.storage,
        }))
    }

    fn format_user(&self, model: &UserModel) -> Result<String, FormatError> {
        self.encode(&json!({
            "publicKey": model.public_key,
            "numImages": model.num_images,
            "lastModified": self.dates.format_date(&model.last_modified),
        }))
    }

    fn format_images(&self, model: &ImagesModel) -> Result<String, FormatError> {
        let images: Vec<Value> = model
            .images
            .iter()
            .map(|image| self.image_entry(model, image))
            .collect();

        self.encode(&json!({
            "search": {
                "hits": model.hits,
                "page": model.page,
                "limit": model.limit,
                "count": model.count,
            },
            "images": images,
        }))
    }

    fn format_metadata(&self, model: &MetadataModel) -> Result<String, FormatError> {
        self.encode(&keyed(&model.data))
    }

    fn format_array_model(&self, model: &ArrayModel) -> Result<String, FormatError> {
        self.encode(&keyed(&model.data))
    }

    fn format_list_model(&self, model: &ListModel) -> Result<String, FormatError> {
        let mut data = Map::new();
        data.insert(model.container.clone(), Value::Array(model.list.clone()));
        self.encode(&Value::Object(data))
    }

    fn format_stats(&self, model: &StatsModel) -> Result<String, FormatError> {
        let users: Vec<Value> = model
            .users
            .iter()
            .map(|user| {
                json!({
                    "publicKey": user.public_key,
                    "numImages": user.num_images,
                    "numBytes": user.num_bytes,
                })
            })
            .collect();

        self.encode(&json!({
            "users": users,
            "total": {
                "numImages": model.num_images,
                "numUsers": model.num_users,
                "numBytes": model.num_bytes,
            },
            "custom": model.custom.as_ref().map(keyed).unwrap_or_else(|| json!({})),
        }))
    }
}
