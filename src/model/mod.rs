//! Response models
//!
//! Values produced by the resource handlers and rendered by exactly one
//! formatter. Models are fully populated when built and never mutated by
//! the formatter that consumes them.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Keyed, untyped data such as image metadata
pub type KeyedData = Map<String, Value>;

/// A failed request
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorModel {
    pub http_code: u16,
    pub message: String,
    pub date: DateTime<Utc>,
    /// Service specific error code
    pub error_code: u16,
    pub image_identifier: Option<String>,
}

/// Health of the service and its backends
#[derive(Debug, Clone, PartialEq)]
pub struct StatusModel {
    pub date: DateTime<Utc>,
    pub database: bool,
    pub storage: bool,
}

/// Summary of a single user
#[derive(Debug, Clone, PartialEq)]
pub struct UserModel {
    pub public_key: String,
    pub num_images: u64,
    pub last_modified: DateTime<Utc>,
}

/// A stored image as listed by the images resource
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub added: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub checksum: String,
    pub extension: String,
    pub size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mime: String,
    pub image_identifier: String,
    pub public_key: String,
    /// `None` when metadata was not loaded for this listing
    pub metadata: Option<KeyedData>,
}

/// One page of a user's images
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImagesModel {
    pub images: Vec<Image>,
    /// Field allow-list; empty means every field
    pub fields: Vec<String>,
    pub hits: u64,
    pub page: u64,
    pub limit: u64,
    pub count: u64,
}

/// Metadata attached to a single image
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataModel {
    pub data: KeyedData,
}

/// Generic key-value payload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayModel {
    pub data: KeyedData,
}

/// A list wrapped in a named container
#[derive(Debug, Clone, PartialEq)]
pub struct ListModel {
    pub container: String,
    pub list: Vec<Value>,
}

/// Usage figures for one user
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub public_key: String,
    pub num_images: u64,
    pub num_bytes: u64,
}

/// Aggregated usage statistics
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsModel {
    pub users: Vec<UserStats>,
    pub num_images: u64,
    pub num_users: u64,
    pub num_bytes: u64,
    pub custom: Option<KeyedData>,
}

/// Closed set of everything a formatter can render
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseModel {
    Error(ErrorModel),
    Status(StatusModel),
    User(UserModel),
    Images(ImagesModel),
    Metadata(MetadataModel),
    Array(ArrayModel),
    List(ListModel),
    Stats(StatsModel),
}

impl ImagesModel {
    /// Whether `field` should be emitted for each image
    pub fn shows(&self, field: &str) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f == field)
    }
}

impl StatsModel {
    /// Build stats from per-user figures, deriving the totals
    pub fn from_users(users: Vec<UserStats>) -> Self {
        let num_images = users.iter().map(|u| u.num_images).sum();
        let num_bytes = users.iter().map(|u| u.num_bytes).sum();
        Self {
            num_users: users.len() as u64,
            num_images,
            num_bytes,
            users,
            custom: None,
        }
    }
}
