//! Configuration module
//!
//! Configuration is loaded once from the environment (with `.env` support for
//! local development) and passed explicitly to each component at construction
//! time. Nothing in this workspace reads ambient global state after startup.

use std::env;

use crate::moderation::{Likelihood, RejectThresholds};

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_GEO_RADIUS_METERS: f64 = 50_000.0;
const DEFAULT_QUEUE_CAPACITY: usize = 256;
const DEFAULT_QUEUE_WORKERS: usize = 4;
const DEFAULT_REJECT_THRESHOLD: &str = "LIKELY";

/// Object storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "s3" => Ok(StorageBackend::S3),
            other => Err(anyhow::anyhow!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local backend (each bucket is a subdirectory).
    pub local_root: Option<String>,
    /// Base URL used to build public object URLs for the local backend.
    pub local_base_url: Option<String>,
    pub public_bucket: String,
    pub private_bucket: String,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO etc.).
    pub s3_endpoint: Option<String>,
    /// Optional CDN endpoint for public delivery URLs; falls back to the
    /// backend's native URL format when unset.
    pub cdn_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Per-category reject thresholds, parsed leniently from env labels.
    pub thresholds: RejectThresholds,
    pub rekognition_region: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct NotificationQueueConfig {
    pub capacity: usize,
    pub max_workers: usize,
}

impl Default for NotificationQueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            max_workers: DEFAULT_QUEUE_WORKERS,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub storage: StorageConfig,
    pub moderation: ModerationConfig,
    /// Email delivery; optional, notifications degrade to in-app only.
    pub smtp: Option<SmtpConfig>,
    pub notification_queue: NotificationQueueConfig,
    /// Default search radius in meters when lat/lng are given without one.
    pub default_search_radius_meters: f64,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a reject-threshold label, warning about non-empty labels that do not
/// parse. Unparsable labels degrade to "never reject on this axis".
fn env_threshold(key: &str) -> Option<Likelihood> {
    let label = env_or(key, DEFAULT_REJECT_THRESHOLD);
    let parsed = Likelihood::parse_threshold(&label);
    if parsed.is_none() && !label.trim().is_empty() {
        tracing::warn!(
            key = key,
            label = %label,
            "Unrecognized moderation threshold label, category will never reject"
        );
    }
    parsed
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Load .env if present; real deployments rely on the environment.
        let _ = dotenvy::dotenv();

        let database_url = env_or("DATABASE_URL", "postgres://localhost:5432/staywork");
        let db_max_connections = env_or("DB_MAX_CONNECTIONS", "")
            .parse()
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

        let backend: StorageBackend = env_or("STORAGE_BACKEND", "local").parse()?;

        let storage = StorageConfig {
            backend,
            local_root: env_opt("LOCAL_STORAGE_PATH"),
            local_base_url: env_opt("LOCAL_STORAGE_BASE_URL"),
            public_bucket: env_or("STORAGE_PUBLIC_BUCKET", "staywork-public"),
            private_bucket: env_or("STORAGE_PRIVATE_BUCKET", "staywork-private"),
            s3_region: env_opt("S3_REGION").or_else(|| env_opt("AWS_REGION")),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            cdn_endpoint: env_opt("CDN_URL_ENDPOINT"),
        };

        let moderation = ModerationConfig {
            thresholds: RejectThresholds {
                adult: env_threshold("IMAGE_REJECT_ADULT"),
                racy: env_threshold("IMAGE_REJECT_RACY"),
                violence: env_threshold("IMAGE_REJECT_VIOLENCE"),
                medical: env_threshold("IMAGE_REJECT_MEDICAL"),
                spoof: env_threshold("IMAGE_REJECT_SPOOF"),
            },
            rekognition_region: env_or("REKOGNITION_REGION", "us-east-1"),
        };

        let smtp = env_opt("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: env_or("SMTP_PORT", "587").parse().unwrap_or(587),
            username: env_opt("SMTP_USER"),
            password: env_opt("SMTP_PASSWORD"),
            from: env_or("SMTP_FROM", "no-reply@staywork.example"),
        });

        let notification_queue = NotificationQueueConfig {
            capacity: env_or("NOTIFICATION_QUEUE_CAPACITY", "")
                .parse()
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            max_workers: env_or("NOTIFICATION_QUEUE_WORKERS", "")
                .parse()
                .unwrap_or(DEFAULT_QUEUE_WORKERS),
        };

        let default_search_radius_meters = env_or("SEARCH_DEFAULT_RADIUS_METERS", "")
            .parse()
            .unwrap_or(DEFAULT_GEO_RADIUS_METERS);

        Ok(Config {
            database_url,
            db_max_connections,
            storage,
            moderation,
            smtp,
            notification_queue,
            default_search_radius_meters,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.is_empty() {
            anyhow::bail!("DATABASE_URL must not be empty");
        }
        if self.storage.public_bucket == self.storage.private_bucket {
            anyhow::bail!("public and private buckets must differ");
        }
        match self.storage.backend {
            StorageBackend::Local => {
                if self.storage.local_root.is_none() {
                    anyhow::bail!("LOCAL_STORAGE_PATH is required for the local backend");
                }
            }
            StorageBackend::S3 => {
                if self.storage.s3_region.is_none() && self.storage.s3_endpoint.is_none() {
                    anyhow::bail!("S3_REGION or S3_ENDPOINT is required for the s3 backend");
                }
            }
        }
        if self.notification_queue.capacity == 0 || self.notification_queue.max_workers == 0 {
            anyhow::bail!("notification queue capacity and workers must be positive");
        }
        Ok(())
    }
}
