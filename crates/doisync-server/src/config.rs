//! Configuration management
//!
//! Everything is read from the environment (after loading `.env` through
//! `dotenvy`) with the defaults below, then checked by [`Config::validate`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/doisync";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

// ============================================================================
// DOI Configuration Constants
// ============================================================================

/// Test prefix handed out by DataCite for sandbox accounts.
pub const DEFAULT_DOI_PREFIX: &str = "10.21373";

pub const DEFAULT_PORTAL_URL: &str = "https://www.gbif.org/";

pub const DEFAULT_API_ROOT: &str = "https://api.gbif.org/v1/";

pub const DEFAULT_DATACITE_API_URL: &str = "https://mds.test.datacite.org/";

pub const DEFAULT_DATACITE_TIMEOUT_SECS: u64 = 30;

/// Register attempts per change message, including escalation retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

pub const DEFAULT_RETRY_PAUSE_MS: u64 = 1000;

pub const DEFAULT_WORKERS: usize = 4;

/// Page size used when listing the constituent datasets of a download.
pub const DEFAULT_USAGES_PAGE_SIZE: u32 = 400;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub doi: DoiConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// DataCite account used by the registration client
#[derive(Clone, Serialize, Deserialize)]
pub struct DataCiteConfig {
    pub api_url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for DataCiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCiteConfig")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Identifier engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoiConfig {
    /// Prefix owned by this registry, e.g. "10.15468"
    pub prefix: String,
    /// Landing page base, e.g. "https://www.gbif.org/"
    pub portal_url: String,
    /// Public API base used for metadata links in download documents
    pub api_root: String,
    pub datacite: DataCiteConfig,
    pub max_attempts: u32,
    pub retry_pause_ms: u64,
    pub workers: usize,
    pub usages_page_size: u32,
    /// Datasets whose parent is listed here never get identifier actions
    pub dataset_parent_exclude_list: HashSet<Uuid>,
    /// Physically delete records that are still RESERVED on a delete request
    pub allow_reserved_delete: bool,
}

impl DoiConfig {
    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !self.prefix.starts_with("10.") {
            anyhow::bail!("DOI_PREFIX must start with '10.', got '{}'", self.prefix);
        }

        for (name, value) in [
            ("DOI_PORTAL_URL", &self.portal_url),
            ("DOI_API_ROOT", &self.api_root),
            ("DATACITE_API_URL", &self.datacite.api_url),
        ] {
            if Url::parse(value).is_err() {
                anyhow::bail!("{} must be an absolute URL, got '{}'", name, value);
            }
        }

        if self.max_attempts == 0 {
            anyhow::bail!("DOI_MAX_ATTEMPTS must be greater than 0");
        }

        if self.workers == 0 {
            anyhow::bail!("DOI_WORKERS must be greater than 0");
        }

        if self.usages_page_size == 0 {
            anyhow::bail!("DOI_USAGES_PAGE_SIZE must be greater than 0");
        }

        if self.datacite.username.is_empty() {
            tracing::warn!("DATACITE_USERNAME is empty - registration calls will be rejected");
        }

        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a comma separated list of dataset keys.
pub fn parse_exclude_list(raw: &str) -> anyhow::Result<HashSet<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|e| anyhow::anyhow!("Invalid dataset key '{}' in exclude list: {}", s, e))
        })
        .collect()
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env_string("DOISYNC_HOST", DEFAULT_SERVER_HOST),
                port: env_or("DOISYNC_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "DOISYNC_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: env_string("DATABASE_URL", DEFAULT_DATABASE_URL),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            doi: DoiConfig {
                prefix: env_string("DOI_PREFIX", DEFAULT_DOI_PREFIX),
                portal_url: env_string("DOI_PORTAL_URL", DEFAULT_PORTAL_URL),
                api_root: env_string("DOI_API_ROOT", DEFAULT_API_ROOT),
                datacite: DataCiteConfig {
                    api_url: env_string("DATACITE_API_URL", DEFAULT_DATACITE_API_URL),
                    username: env_string("DATACITE_USERNAME", ""),
                    password: env_string("DATACITE_PASSWORD", ""),
                    timeout_secs: env_or("DATACITE_TIMEOUT_SECS", DEFAULT_DATACITE_TIMEOUT_SECS),
                },
                max_attempts: env_or("DOI_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS),
                retry_pause_ms: env_or("DOI_RETRY_PAUSE_MS", DEFAULT_RETRY_PAUSE_MS),
                workers: env_or("DOI_WORKERS", DEFAULT_WORKERS),
                usages_page_size: env_or("DOI_USAGES_PAGE_SIZE", DEFAULT_USAGES_PAGE_SIZE),
                dataset_parent_exclude_list: parse_exclude_list(&env_string(
                    "DOI_DATASET_PARENT_EXCLUDE_LIST",
                    "",
                ))?,
                allow_reserved_delete: env_or("DOI_ALLOW_RESERVED_DELETE", false),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        self.doi.validate()
    }
}

impl Default for DoiConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_DOI_PREFIX.to_string(),
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            api_root: DEFAULT_API_ROOT.to_string(),
            datacite: DataCiteConfig {
                api_url: DEFAULT_DATACITE_API_URL.to_string(),
                username: String::new(),
                password: String::new(),
                timeout_secs: DEFAULT_DATACITE_TIMEOUT_SECS,
            },
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_pause_ms: DEFAULT_RETRY_PAUSE_MS,
            workers: DEFAULT_WORKERS,
            usages_page_size: DEFAULT_USAGES_PAGE_SIZE,
            dataset_parent_exclude_list: HashSet::new(),
            allow_reserved_delete: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            doi: DoiConfig::default(),
        }
    }
}
