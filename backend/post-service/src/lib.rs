/// Post Service Library
///
/// Serves the blog post resource: paginated listing, creation with an image
/// upload, title lookup, update with optional image replacement, and deletion
/// of a post together with its stored image.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and request body extraction
/// - `models`: Post records, response envelopes and the paginator
/// - `services`: Business logic layer tying validation, records and blobs together
/// - `db`: Record store trait with PostgreSQL and in-memory implementations
/// - `storage`: Blob store trait with local disk, S3 and in-memory implementations
/// - `validation`: Request validation producing field-keyed error messages
/// - `middleware`: HTTP middleware for request metrics
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{AppError, Result};
