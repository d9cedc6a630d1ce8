//! Server settings read from `BENCHLOG_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use benchlog_core::ConfigError;

/// Default upload size limit (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Which `LabStore` implementation the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::InvalidValue {
                field: "BENCHLOG_STORAGE".to_string(),
                value: other.to_string(),
                reason: "expected 'postgres' or 'memory'".to_string(),
            }),
        }
    }
}

/// Server settings outside of auth and the database connection.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Exact origins or `*.domain` patterns. Empty opens CORS to everyone.
    pub cors_origins: Vec<String>,
    pub cors_allow_credentials: bool,
    pub cors_max_age_secs: u64,
    pub storage: StorageBackend,
    /// Where uploaded files are written.
    pub upload_dir: PathBuf,
    /// Largest accepted upload request body.
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 24 * 60 * 60,
            storage: StorageBackend::default(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}

impl ApiConfig {
    /// Read the `BENCHLOG_*` variables over [`ApiConfig::default`]:
    ///
    /// | variable | meaning |
    /// |---|---|
    /// | `BENCHLOG_CORS_ORIGINS` | comma-separated origins |
    /// | `BENCHLOG_CORS_ALLOW_CREDENTIALS` | `true` to allow credentials |
    /// | `BENCHLOG_CORS_MAX_AGE_SECS` | preflight cache lifetime |
    /// | `BENCHLOG_STORAGE` | `postgres` or `memory` |
    /// | `BENCHLOG_UPLOAD_DIR` | upload directory |
    /// | `BENCHLOG_MAX_UPLOAD_BYTES` | upload size limit |
    ///
    /// Only an unknown storage backend is an error; other malformed values
    /// keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let storage = match std::env::var("BENCHLOG_STORAGE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.storage,
        };

        Ok(Self {
            cors_origins: std::env::var("BENCHLOG_CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            cors_allow_credentials: std::env::var("BENCHLOG_CORS_ALLOW_CREDENTIALS")
                .is_ok_and(|raw| raw.eq_ignore_ascii_case("true")),
            cors_max_age_secs: env_parsed("BENCHLOG_CORS_MAX_AGE_SECS")
                .unwrap_or(defaults.cors_max_age_secs),
            storage,
            upload_dir: std::env::var_os("BENCHLOG_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: env_parsed("BENCHLOG_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
        })
    }

    /// `*.lab.example.org` matches that domain and its subdomains over https.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }
        let host = origin.strip_prefix("https://");
        self.cors_origins.iter().any(|entry| match entry.strip_prefix("*.") {
            None => entry == origin,
            Some(domain) => host.is_some_and(|host| {
                host == domain
                    || host
                        .strip_suffix(domain)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }),
        })
    }
}

/// True when `BENCHLOG_ENVIRONMENT` is `production` or `prod`.
pub fn is_production_environment() -> bool {
    std::env::var("BENCHLOG_ENVIRONMENT")
        .map(|env| {
            let env = env.to_lowercase();
            env == "production" || env == "prod"
        })
        .unwrap_or(false)
}
