/// Configuration management for Post Service
///
/// This module handles loading and managing configuration from environment variables.
/// `main` loads a `.env` file first, so the same keys work there.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Blob storage configuration
    pub storage: StorageConfig,
    /// Upload limits
    pub uploads: UploadConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Number of HTTP workers
    pub workers: usize,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Apply embedded migrations at start-up
    pub run_migrations: bool,
}

/// Which blob store backs post images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    Local,
    S3,
    Memory,
}

impl std::str::FromStr for StorageDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "public" => Ok(StorageDriver::Local),
            "s3" => Ok(StorageDriver::S3),
            "memory" => Ok(StorageDriver::Memory),
            other => Err(format!("unsupported STORAGE_DRIVER '{}'", other)),
        }
    }
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub driver: StorageDriver,
    /// Root directory for the local driver
    pub local_root: PathBuf,
    /// S3 settings, present when the driver is `s3`
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, LocalStack); forces path-style addressing
    pub endpoint_url: Option<String>,
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Hard cap on a single multipart part, in bytes
    pub max_part_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_part_bytes: default_upload_max_bytes(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("POST_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("POST_SERVICE_PORT", 8080)?,
                workers: parse_env_or_default("POST_SERVICE_WORKERS", 4)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/posts".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                run_migrations: parse_env_or_default("DATABASE_RUN_MIGRATIONS", true)?,
            },
            storage: {
                let driver: StorageDriver = std::env::var("STORAGE_DRIVER")
                    .unwrap_or_else(|_| "local".to_string())
                    .parse()?;

                let s3 = if driver == StorageDriver::S3 {
                    Some(S3Config {
                        bucket: std::env::var("S3_BUCKET")
                            .map_err(|_| "S3_BUCKET must be set when STORAGE_DRIVER=s3".to_string())?,
                        region: std::env::var("AWS_REGION")
                            .unwrap_or_else(|_| "us-east-1".to_string()),
                        endpoint_url: std::env::var("S3_ENDPOINT_URL")
                            .ok()
                            .filter(|v| !v.trim().is_empty()),
                    })
                } else {
                    None
                };

                StorageConfig {
                    driver,
                    local_root: std::env::var("STORAGE_LOCAL_ROOT")
                        .map(PathBuf::from)
                        .unwrap_or_else(|_| PathBuf::from("storage/app/public")),
                    s3,
                }
            },
            uploads: UploadConfig {
                max_part_bytes: parse_env_or_default(
                    "UPLOAD_MAX_BYTES",
                    default_upload_max_bytes(),
                )?,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

fn default_upload_max_bytes() -> usize {
    8 * 1024 * 1024
}
