//! Settings read from the environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;
use terminology_indexer_repository::opensearch::DEFAULT_INDEX_NAME;

use crate::IndexingError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default source system API base URL.
const DEFAULT_SOURCE_API_URL: &str = "http://localhost:9102/api";

/// Default source system credentials.
const DEFAULT_SOURCE_API_USERNAME: &str = "admin";
const DEFAULT_SOURCE_API_PASSWORD: &str = "admin";

/// Default URL the source system posts change notifications to.
const DEFAULT_NOTIFY_CALLBACK_URL: &str = "http://localhost:8001/notify";

/// Default UTC time of day of the scheduled full reindex.
const DEFAULT_REINDEX_AT: &str = "03:00";

/// Default listen address of the HTTP server.
const DEFAULT_SERVER_ADDR: SocketAddr =
    SocketAddr::V4(std::net::SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, 8001));

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BOOTSTRAP_ATTEMPTS: usize = 10;
const DEFAULT_BOOTSTRAP_RETRY_DELAY_SECS: u64 = 5;

/// Runtime settings of the indexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub opensearch_url: String,
    pub opensearch_username: Option<String>,
    pub opensearch_password: Option<String>,
    pub index_name: String,
    /// Create-index body; built-in settings when unset.
    pub index_settings_path: Option<PathBuf>,
    /// Put-mapping body; built-in mapping when unset.
    pub index_mapping_path: Option<PathBuf>,
    /// Wipe the index on every start.
    pub delete_index_on_restart: bool,
    pub source_api_url: String,
    pub source_api_username: String,
    pub source_api_password: String,
    pub notify_callback_url: String,
    pub server_addr: SocketAddr,
    /// UTC time of day of the scheduled full reindex.
    pub reindex_at: NaiveTime,
    /// Upper bound for every outbound HTTP call.
    pub http_timeout: Duration,
    pub bootstrap_attempts: usize,
    pub bootstrap_retry_delay: Duration,
    /// Re-index documents embedding a changed node on incremental updates.
    pub refresh_neighbours: bool,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: optional basic auth
    /// - `INDEX_NAME`: index name (default: terminology)
    /// - `INDEX_SETTINGS_PATH` / `INDEX_MAPPING_PATH`: JSON definition files
    /// - `INDEX_DELETE_ON_RESTART`: wipe the index on start (default: false)
    /// - `SOURCE_API_URL`: source system API (default: http://localhost:9102/api)
    /// - `SOURCE_API_USERNAME` / `SOURCE_API_PASSWORD`: (default: admin / admin)
    /// - `NOTIFY_CALLBACK_URL`: webhook callback (default: http://localhost:8001/notify)
    /// - `SERVER_ADDR`: listen address (default: 0.0.0.0:8001)
    /// - `REINDEX_AT`: `HH:MM` UTC of the nightly reindex (default: 03:00)
    /// - `HTTP_TIMEOUT_SECS`: outbound request timeout (default: 30)
    /// - `BOOTSTRAP_ATTEMPTS` / `BOOTSTRAP_RETRY_DELAY_SECS`: (default: 10 / 5)
    /// - `SYNC_REFRESH_NEIGHBOURS`: re-index embedding documents (default: false)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// Empty values count as unset. Values that fail to parse are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let string_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let bootstrap_attempts: usize =
            parse_or(get("BOOTSTRAP_ATTEMPTS"), "BOOTSTRAP_ATTEMPTS", DEFAULT_BOOTSTRAP_ATTEMPTS)?;
        if bootstrap_attempts == 0 {
            return Err(IndexingError::config("BOOTSTRAP_ATTEMPTS must be at least 1"));
        }

        let http_timeout_secs: u64 =
            parse_or(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if http_timeout_secs == 0 {
            return Err(IndexingError::config("HTTP_TIMEOUT_SECS must be at least 1"));
        }

        let reindex_at = get("REINDEX_AT").unwrap_or_else(|| DEFAULT_REINDEX_AT.to_string());
        let reindex_at = NaiveTime::parse_from_str(reindex_at.trim(), "%H:%M").map_err(|e| {
            IndexingError::config(format!("Invalid REINDEX_AT '{}': {}", reindex_at, e))
        })?;

        Ok(Self {
            opensearch_url: string_or("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            opensearch_username: get("OPENSEARCH_USERNAME"),
            opensearch_password: get("OPENSEARCH_PASSWORD"),
            index_name: string_or("INDEX_NAME", DEFAULT_INDEX_NAME),
            index_settings_path: get("INDEX_SETTINGS_PATH").map(PathBuf::from),
            index_mapping_path: get("INDEX_MAPPING_PATH").map(PathBuf::from),
            delete_index_on_restart: parse_flag(
                get("INDEX_DELETE_ON_RESTART"),
                "INDEX_DELETE_ON_RESTART",
            )?,
            source_api_url: string_or("SOURCE_API_URL", DEFAULT_SOURCE_API_URL),
            source_api_username: string_or("SOURCE_API_USERNAME", DEFAULT_SOURCE_API_USERNAME),
            source_api_password: string_or("SOURCE_API_PASSWORD", DEFAULT_SOURCE_API_PASSWORD),
            notify_callback_url: string_or("NOTIFY_CALLBACK_URL", DEFAULT_NOTIFY_CALLBACK_URL),
            server_addr: parse_or(get("SERVER_ADDR"), "SERVER_ADDR", DEFAULT_SERVER_ADDR)?,
            reindex_at,
            http_timeout: Duration::from_secs(http_timeout_secs),
            bootstrap_attempts,
            bootstrap_retry_delay: Duration::from_secs(parse_or(
                get("BOOTSTRAP_RETRY_DELAY_SECS"),
                "BOOTSTRAP_RETRY_DELAY_SECS",
                DEFAULT_BOOTSTRAP_RETRY_DELAY_SECS,
            )?),
            refresh_neighbours: parse_flag(
                get("SYNC_REFRESH_NEIGHBOURS"),
                "SYNC_REFRESH_NEIGHBOURS",
            )?,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opensearch_url: DEFAULT_OPENSEARCH_URL.to_string(),
            opensearch_username: None,
            opensearch_password: None,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            index_settings_path: None,
            index_mapping_path: None,
            delete_index_on_restart: false,
            source_api_url: DEFAULT_SOURCE_API_URL.to_string(),
            source_api_username: DEFAULT_SOURCE_API_USERNAME.to_string(),
            source_api_password: DEFAULT_SOURCE_API_PASSWORD.to_string(),
            notify_callback_url: DEFAULT_NOTIFY_CALLBACK_URL.to_string(),
            server_addr: DEFAULT_SERVER_ADDR,
            reindex_at: NaiveTime::from_hms_opt(3, 0, 0).unwrap_or(NaiveTime::MIN),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            bootstrap_attempts: DEFAULT_BOOTSTRAP_ATTEMPTS,
            bootstrap_retry_delay: Duration::from_secs(DEFAULT_BOOTSTRAP_RETRY_DELAY_SECS),
            refresh_neighbours: false,
        }
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, IndexingError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| IndexingError::config(format!("Invalid {} '{}': {}", key, raw, e))),
    }
}

fn parse_flag(value: Option<String>, key: &str) -> Result<bool, IndexingError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(IndexingError::config(format!(
                "Invalid {} '{}': expected true or false",
                key, v
            ))),
        },
    }
}
