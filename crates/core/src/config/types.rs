use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// API key -> user id, used when `method = "api_key"`.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Trust the `X-User-Id` header (for deployments behind an authenticating proxy).
    None,
    ApiKey,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::ApiKey => "api_key",
        }
    }
}

/// Database configuration (document store and audit log share one file)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("bugtrail.db")
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory uploaded objects are written to.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Base URL the objects are reachable under.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Size of each write during an upload; one progress event per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            public_url: default_public_url(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("objects")
}

fn default_public_url() -> String {
    "/objects".to_string()
}

fn default_chunk_size() -> usize {
    256 * 1024
}

/// Defect submission configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmissionConfig {
    /// Images above this size are dropped from the submission with a warning.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    /// Content type every uploaded image is tagged with.
    #[serde(default = "default_image_content_type")]
    pub image_content_type: String,
    /// How the reporter's `myTickets` index is updated.
    #[serde(default)]
    pub user_index: UserIndexMode,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            image_content_type: default_image_content_type(),
            user_index: UserIndexMode::default(),
        }
    }
}

fn default_max_image_bytes() -> u64 {
    3_145_728
}

fn default_image_content_type() -> String {
    "image/jpeg".to_string()
}

/// Strategy for appending a ticket id to the reporter's ticket index.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserIndexMode {
    /// Merge-write the caller's snapshot plus the new id. Concurrent
    /// submissions from stale snapshots can drop an id.
    #[default]
    Merge,
    /// Atomic set-union performed by the document store.
    ArrayUnion,
}

impl UserIndexMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserIndexMode::Merge => "merge",
            UserIndexMode::ArrayUnion => "array_union",
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: SanitizedStorageConfig,
    pub submission: SubmissionConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_keys_configured: usize,
}

/// Storage config without the local filesystem root
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub public_url: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                api_keys_configured: config.auth.api_keys.len(),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            storage: SanitizedStorageConfig {
                public_url: config.storage.public_url.clone(),
            },
            submission: config.submission.clone(),
        }
    }
}
