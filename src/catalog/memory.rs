//! In-process catalog
//!
//! Keeps images and their metadata in memory. Nothing survives a restart;
//! this backs the binary and the HTTP tests.

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::{Outcome, RequestInput, ResourceHandler};
use crate::errors::{ImageHostError, Result};
use crate::model::{
    ArrayModel, Image, ImagesModel, KeyedData, MetadataModel, ResponseModel, StatsModel,
    StatusModel, UserModel, UserStats,
};
use crate::routing::{Extension, HttpMethod, ImageFormat, ResolvedRequest, Resource};

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 20;

#[derive(Debug, Clone)]
struct StoredImage {
    data: Bytes,
    mime: String,
    extension: String,
    added: DateTime<Utc>,
    updated: DateTime<Utc>,
    metadata: KeyedData,
}

/// Image identifier -> image, per public key
type Users = HashMap<String, BTreeMap<String, StoredImage>>;

/// Memory backed [`ResourceHandler`]
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    users: RwLock<Users>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usage figures across every user
    pub async fn stats(&self) -> StatsModel {
        let users = self.users.read().await;
        let mut stats: Vec<UserStats> = users
            .iter()
            .map(|(public_key, images)| UserStats {
                public_key: public_key.clone(),
                num_images: images.len() as u64,
                num_bytes: images.values().map(|i| i.data.len() as u64).sum(),
            })
            .collect();
        stats.sort_by(|a, b| a.public_key.cmp(&b.public_key));
        StatsModel::from_users(stats)
    }

    fn status(&self) -> Outcome {
        Outcome::ok(ResponseModel::Status(StatusModel {
            date: Utc::now(),
            database: true,
            storage: true,
        }))
    }

    async fn user(&self, public_key: &str) -> Result<Outcome> {
        let users = self.users.read().await;
        let images = users
            .get(public_key)
            .filter(|images| !images.is_empty())
            .ok_or_else(|| ImageHostError::UserNotFound {
                public_key: public_key.to_string(),
            })?;

        let last_modified = images
            .values()
            .map(|image| image.updated)
            .max()
            .unwrap_or_else(Utc::now);

        Ok(Outcome::ok(ResponseModel::User(UserModel {
            public_key: public_key.to_string(),
            num_images: images.len() as u64,
            last_modified,
        })))
    }

    async fn images(&self, public_key: &str, query: &HashMap<String, String>) -> Result<Outcome> {
        let page = query_number(query, "page")?.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = query_number(query, "limit")?.unwrap_or(DEFAULT_LIMIT).max(1);
        let fields: Vec<String> = query
            .get("fields")
            .map(|fields| {
                fields
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let with_metadata = query
            .get("metadata")
            .is_some_and(|v| matches!(v.as_str(), "1" | "true"))
            || fields.iter().any(|f| f == "metadata");

        let users = self.users.read().await;
        let mut stored: Vec<(&String, &StoredImage)> = users
            .get(public_key)
            .map(|images| images.iter().collect())
            .unwrap_or_default();
        stored.sort_by(|a, b| b.1.added.cmp(&a.1.added).then_with(|| a.0.cmp(b.0)));

        let hits = stored.len() as u64;
        let skip = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let images: Vec<Image> = stored
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(image_identifier, image)| Image {
                added: image.added,
                updated: image.updated,
                checksum: image_identifier.clone(),
                extension: image.extension.clone(),
                size: image.data.len() as u64,
                width: None,
                height: None,
                mime: image.mime.clone(),
                image_identifier: image_identifier.clone(),
                public_key: public_key.to_string(),
                metadata: with_metadata.then(|| image.metadata.clone()),
            })
            .collect();

        debug!(public_key, hits, page, limit, "Listed images");

        Ok(Outcome::ok(ResponseModel::Images(ImagesModel {
            count: images.len() as u64,
            images,
            fields,
            hits,
            page,
            limit,
        })))
    }

    async fn get_image(&self, public_key: &str, image_identifier: &str) -> Result<Outcome> {
        let users = self.users.read().await;
        let image = users
            .get(public_key)
            .and_then(|images| images.get(image_identifier))
            .ok_or_else(|| image_not_found(image_identifier))?;

        Ok(Outcome::Image {
            mime: image.mime.clone(),
            data: image.data.clone(),
        })
    }

    async fn put_image(
        &self,
        public_key: &str,
        image_identifier: &str,
        extension: Option<Extension>,
        input: RequestInput,
    ) -> Result<Outcome> {
        if input.body.is_empty() {
            return Err(ImageHostError::EmptyImage {
                image_identifier: image_identifier.to_string(),
            });
        }

        let mime = match extension {
            Some(Extension::Image(format)) => format.mime_type().to_string(),
            _ => input
                .content_type
                .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string()),
        };
        let file_extension = file_extension(&mime);
        let now = Utc::now();

        let mut users = self.users.write().await;
        let images = users.entry(public_key.to_string()).or_default();
        let status = match images.get_mut(image_identifier) {
            Some(existing) => {
                existing.data = input.body;
                existing.mime = mime;
                existing.extension = file_extension;
                existing.updated = now;
                StatusCode::OK
            }
            None => {
                images.insert(
                    image_identifier.to_string(),
                    StoredImage {
                        data: input.body,
                        mime,
                        extension: file_extension,
                        added: now,
                        updated: now,
                        metadata: KeyedData::new(),
                    },
                );
                StatusCode::CREATED
            }
        };

        info!(public_key, image_identifier, %status, "Stored image");
        Ok(Outcome::Model {
            status,
            model: identifier_model(image_identifier),
        })
    }

    async fn delete_image(&self, public_key: &str, image_identifier: &str) -> Result<Outcome> {
        let mut users = self.users.write().await;
        let images = users
            .get_mut(public_key)
            .ok_or_else(|| image_not_found(image_identifier))?;
        images
            .remove(image_identifier)
            .ok_or_else(|| image_not_found(image_identifier))?;
        if images.is_empty() {
            users.remove(public_key);
        }

        info!(public_key, image_identifier, "Deleted image");
        Ok(Outcome::ok(identifier_model(image_identifier)))
    }

    async fn metadata(
        &self,
        method: HttpMethod,
        public_key: &str,
        image_identifier: &str,
        input: RequestInput,
    ) -> Result<Outcome> {
        let update = match method {
            HttpMethod::Put | HttpMethod::Post => Some(parse_metadata(&input.body)?),
            HttpMethod::Delete => None,
            _ => {
                let users = self.users.read().await;
                let image = users
                    .get(public_key)
                    .and_then(|images| images.get(image_identifier))
                    .ok_or_else(|| image_not_found(image_identifier))?;
                return Ok(Outcome::ok(ResponseModel::Metadata(MetadataModel {
                    data: image.metadata.clone(),
                })));
            }
        };

        let mut users = self.users.write().await;
        let image = users
            .get_mut(public_key)
            .and_then(|images| images.get_mut(image_identifier))
            .ok_or_else(|| image_not_found(image_identifier))?;

        match (method, update) {
            (HttpMethod::Post, Some(data)) => image.metadata.extend(data),
            (_, Some(data)) => image.metadata = data,
            (_, None) => image.metadata.clear(),
        }
        image.updated = Utc::now();

        debug!(public_key, image_identifier, %method, "Updated metadata");
        Ok(Outcome::ok(ResponseModel::Metadata(MetadataModel {
            data: image.metadata.clone(),
        })))
    }
}

#[async_trait]
impl ResourceHandler for MemoryCatalog {
    #[instrument(skip(self, input), fields(resource = %request.resource, method = %request.method))]
    async fn handle(&self, request: &ResolvedRequest, input: RequestInput) -> Result<Outcome> {
        let method = request.method;
        match request.resource {
            Resource::Status => Ok(self.status()),
            Resource::User => self.user(required(&request.public_key)?).await,
            Resource::Images => self.images(required(&request.public_key)?, &input.query).await,
            Resource::Image => {
                let public_key = required(&request.public_key)?;
                let image_identifier = required(&request.image_identifier)?;
                match method {
                    HttpMethod::Put => {
                        self.put_image(public_key, image_identifier, request.extension, input)
                            .await
                    }
                    HttpMethod::Delete => self.delete_image(public_key, image_identifier).await,
                    _ => self.get_image(public_key, image_identifier).await,
                }
            }
            Resource::Metadata => {
                let public_key = required(&request.public_key)?;
                let image_identifier = required(&request.image_identifier)?;
                self.metadata(method, public_key, image_identifier, input)
                    .await
            }
        }
    }
}

fn required(value: &Option<String>) -> Result<&str> {
    value
        .as_deref()
        .ok_or_else(|| ImageHostError::Internal("Resolved request is missing a capture".into()))
}

fn query_number(query: &HashMap<String, String>, name: &str) -> Result<Option<u64>> {
    query
        .get(name)
        .map(|value| {
            value.parse().map_err(|_| {
                ImageHostError::InvalidQuery(format!("{name} must be a non-negative integer"))
            })
        })
        .transpose()
}

fn image_not_found(image_identifier: &str) -> ImageHostError {
    ImageHostError::ImageNotFound {
        image_identifier: image_identifier.to_string(),
    }
}

fn identifier_model(image_identifier: &str) -> ResponseModel {
    let mut data = KeyedData::new();
    data.insert("imageIdentifier".into(), json!(image_identifier));
    ResponseModel::Array(ArrayModel { data })
}

/// File extension recorded for an uploaded mime type
fn file_extension(mime: &str) -> String {
    if let Some(format) = ImageFormat::from_mime(mime) {
        return format.as_str().to_string();
    }
    mime_guess::get_mime_extensions_str(mime)
        .and_then(|extensions| extensions.first())
        .map(|e| e.to_string())
        .unwrap_or_else(|| "bin".to_string())
}

fn parse_metadata(body: &[u8]) -> Result<KeyedData> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(data)) => Ok(data),
        Ok(_) => Err(ImageHostError::InvalidMetadata(
            "metadata must be a JSON object".into(),
        )),
        Err(e) => Err(ImageHostError::InvalidMetadata(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Router;

    const ID: &str = "a9b80ed42957fd508c617549cad07d6c";
    const OTHER: &str = "0123456789abcdef0123456789abcdef";

    async fn call(catalog: &MemoryCatalog, method: &str, path: &str, body: &str) -> Result<Outcome> {
        let resolved = Router::new().route(method, path).unwrap();
        let input = RequestInput {
            body: Bytes::from(body.to_string()),
            ..Default::default()
        };
        catalog.handle(&resolved, input).await
    }

    fn model(outcome: Outcome) -> (StatusCode, ResponseModel) {
        match outcome {
            Outcome::Model { status, model } => (status, model),
            other => panic!("expected a model, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_put_then_get_image() {
        let catalog = MemoryCatalog::new();
        let path = format!("/users/christer/images/{ID}.png");

        let (status, put) = model(call(&catalog, "PUT", &path, "png-bytes").await.unwrap());
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(put, identifier_model(ID));

        let (status, _) = model(call(&catalog, "PUT", &path, "png-bytes-2").await.unwrap());
        assert_eq!(status, StatusCode::OK);

        match call(&catalog, "GET", &path, "").await.unwrap() {
            Outcome::Image { mime, data } => {
                assert_eq!(mime, "image/png");
                assert_eq!(data, Bytes::from_static(b"png-bytes-2"));
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let catalog = MemoryCatalog::new();
        let err = call(&catalog, "PUT", &format!("/users/christer/images/{ID}"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageHostError::EmptyImage { .. }));
    }

    #[tokio::test]
    async fn test_unknown_user_and_image() {
        let catalog = MemoryCatalog::new();
        let err = call(&catalog, "GET", "/users/nobody", "").await.unwrap_err();
        assert!(matches!(err, ImageHostError::UserNotFound { .. }));

        let err = call(&catalog, "GET", &format!("/users/nobody/images/{ID}"), "")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_user_summary_and_listing() {
        let catalog = MemoryCatalog::new();
        call(&catalog, "PUT", &format!("/users/christer/images/{ID}.gif"), "a").await.unwrap();
        call(&catalog, "PUT", &format!("/users/christer/images/{OTHER}.jpg"), "bb").await.unwrap();

        let (_, user) = model(call(&catalog, "GET", "/users/christer", "").await.unwrap());
        match user {
            ResponseModel::User(user) => assert_eq!(user.num_images, 2),
            other => panic!("unexpected {other:?}"),
        }

        let resolved = Router::new().route("GET", "/users/christer/images").unwrap();
        let mut query = HashMap::new();
        query.insert("limit".to_string(), "1".to_string());
        query.insert("page".to_string(), "2".to_string());
        let input = RequestInput { query, ..Default::default() };
        let (_, images) = model(catalog.handle(&resolved, input).await.unwrap());
        match images {
            ResponseModel::Images(images) => {
                assert_eq!(images.hits, 2);
                assert_eq!(images.count, 1);
                assert_eq!(images.page, 2);
                assert_eq!(images.limit, 1);
                assert!(images.images[0].metadata.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_metadata_lifecycle() {
        let catalog = MemoryCatalog::new();
        let meta = format!("/users/christer/images/{ID}/meta");
        call(&catalog, "PUT", &format!("/users/christer/images/{ID}"), "x").await.unwrap();

        call(&catalog, "PUT", &meta, r#"{"foo":"bar"}"#).await.unwrap();
        let (_, merged) = model(call(&catalog, "POST", &meta, r#"{"baz":1}"#).await.unwrap());
        let mut expected = KeyedData::new();
        expected.insert("foo".into(), json!("bar"));
        expected.insert("baz".into(), json!(1));
        assert_eq!(merged, ResponseModel::Metadata(MetadataModel { data: expected }));

        let (_, cleared) = model(call(&catalog, "DELETE", &meta, "").await.unwrap());
        assert_eq!(cleared, ResponseModel::Metadata(MetadataModel::default()));

        let err = call(&catalog, "PUT", &meta, "[1,2]").await.unwrap_err();
        assert!(matches!(err, ImageHostError::InvalidMetadata(_)));
    }

    #[tokio::test]
    async fn test_metadata_reads_share_the_lock() {
        let catalog = MemoryCatalog::new();
        let meta = format!("/users/christer/images/{ID}/meta");
        call(&catalog, "PUT", &format!("/users/christer/images/{ID}"), "x").await.unwrap();
        call(&catalog, "PUT", &meta, r#"{"foo":"bar"}"#).await.unwrap();

        let held = catalog.users.read().await;
        let read = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            call(&catalog, "GET", &meta, ""),
        )
        .await
        .expect("metadata GET waited on a held read lock")
        .unwrap();
        drop(held);

        let mut expected = KeyedData::new();
        expected.insert("foo".into(), json!("bar"));
        assert_eq!(model(read).1, ResponseModel::Metadata(MetadataModel { data: expected }));

        let err = call(&catalog, "HEAD", &format!("/users/christer/images/{OTHER}/meta"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageHostError::ImageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_listing_rejects_non_numeric_paging() {
        let catalog = MemoryCatalog::new();
        let resolved = Router::new().route("GET", "/users/christer/images").unwrap();

        for (name, value) in [("limit", "abc"), ("page", "-1")] {
            let mut query = HashMap::new();
            query.insert(name.to_string(), value.to_string());
            let input = RequestInput { query, ..Default::default() };
            let err = catalog.handle(&resolved, input).await.unwrap_err();
            assert!(matches!(err, ImageHostError::InvalidQuery(ref m) if m.starts_with(name)));
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_delete_image_and_stats() {
        let catalog = MemoryCatalog::new();
        call(&catalog, "PUT", &format!("/users/christer/images/{ID}"), "abc").await.unwrap();
        call(&catalog, "PUT", &format!("/users/espen/images/{OTHER}"), "de").await.unwrap();

        let stats = catalog.stats().await;
        assert_eq!(stats.num_users, 2);
        assert_eq!(stats.num_bytes, 5);

        call(&catalog, "DELETE", &format!("/users/christer/images/{ID}"), "").await.unwrap();
        assert_eq!(catalog.stats().await.num_users, 1);
        let err = call(&catalog, "DELETE", &format!("/users/christer/images/{ID}"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageHostError::ImageNotFound { .. }));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("image/jpeg"), "jpg");
        assert_eq!(file_extension("application/x-unknown-thing"), "bin");
    }
}
