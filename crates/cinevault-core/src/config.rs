//! Configuration module
//!
//! All settings come from environment variables with local-development defaults,
//! so the service starts against a docker-compose stack with no configuration.

use std::env;

const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
const DEFAULT_KAFKA_SEND_TIMEOUT_SECS: u64 = 2;
const DEFAULT_KAFKA_FLUSH_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MAX_UPLOAD_SIZE_BYTES: usize = 1024 * 1024 * 1024;

const DEV_SECRET_KEY: &str = "dev-secret-change-me";

/// Application configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,

    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,

    pub secret_key: String,
    pub token_ttl_minutes: i64,

    pub storage_backend: StorageBackendKind,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub s3_bucket: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub local_storage_path: String,

    pub kafka_brokers: String,
    pub kafka_topic: String,
    pub kafka_send_timeout_secs: u64,
    pub kafka_flush_timeout_secs: u64,

    pub max_upload_size_bytes: usize,
}

/// Which object store backend to construct at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackendKind {
    S3,
    Local,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                let user = env_or("DB_USER", "postgres");
                let password = env_or("DB_PASSWORD", "postgres");
                let host = env_or("DB_HOST", "localhost");
                let port = env_or("DB_PORT", "5432");
                let name = env_or("DB_NAME", "cinevault");
                format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, name)
            }
        };

        let storage_backend = match env_or("STORAGE_BACKEND", "s3").to_lowercase().as_str() {
            "local" => StorageBackendKind::Local,
            "s3" => StorageBackendKind::S3,
            other => {
                return Err(anyhow::anyhow!(
                    "Unknown STORAGE_BACKEND '{}', expected 's3' or 'local'",
                    other
                ))
            }
        };

        Ok(Config {
            server_port: parse_env("PORT", DEFAULT_SERVER_PORT)?,
            environment: env_or("ENVIRONMENT", "development"),
            cors_origins: env_or("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_env("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS)?,

            secret_key: env_or("SECRET_KEY", DEV_SECRET_KEY),
            token_ttl_minutes: parse_env("ACCESS_TOKEN_EXPIRE_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?,

            storage_backend,
            s3_endpoint: s3_endpoint_from(env::var("MINIO_ENDPOINT").ok()),
            s3_region: env_or("S3_REGION", "us-east-1"),
            s3_bucket: env_or("S3_BUCKET", "movies"),
            s3_access_key: env_or("MINIO_ACCESS_KEY", "minioadmin"),
            s3_secret_key: env_or("MINIO_SECRET_KEY", "minioadmin"),
            local_storage_path: env_or("LOCAL_STORAGE_PATH", "./data/movies"),

            kafka_brokers: env_or("KAFKA_BROKER", "localhost:9092"),
            kafka_topic: env_or("KAFKA_TOPIC", "user_stats"),
            kafka_send_timeout_secs: parse_env(
                "KAFKA_SEND_TIMEOUT_SECS",
                DEFAULT_KAFKA_SEND_TIMEOUT_SECS,
            )?,
            kafka_flush_timeout_secs: parse_env(
                "KAFKA_FLUSH_TIMEOUT_SECS",
                DEFAULT_KAFKA_FLUSH_TIMEOUT_SECS,
            )?,

            max_upload_size_bytes: parse_env(
                "MAX_UPLOAD_SIZE_BYTES",
                DEFAULT_MAX_UPLOAD_SIZE_BYTES,
            )?,
        })
    }

    /// Fail fast on configuration that must never reach production.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.secret_key == DEV_SECRET_KEY {
            return Err(anyhow::anyhow!(
                "SECRET_KEY must be set to a non-default value in production"
            ));
        }
        if self.secret_key.len() < 16 {
            return Err(anyhow::anyhow!(
                "SECRET_KEY must be at least 16 characters long"
            ));
        }
        if self.token_ttl_minutes <= 0 {
            return Err(anyhow::anyhow!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be positive"
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

/// Object store endpoint selection: unset targets the local MinIO dev
/// stack, an explicitly empty value targets AWS S3 proper (no custom
/// endpoint), anything else is used as-is.
fn s3_endpoint_from(raw: Option<String>) -> Option<String> {
    match raw {
        None => Some("http://localhost:9000".to_string()),
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
