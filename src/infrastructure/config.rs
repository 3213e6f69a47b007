//! Configuration infrastructure
//!
//! Contains configuration loading and validation for the harvester.
//!
//! Sources are layered, later ones winning:
//! 1. Built-in defaults (`defaults` / `ligaswu` constants)
//! 2. Optional config file (`harvester.toml` or an explicit `--config` path)
//! 3. Environment variables, e.g. `HARVESTER__TRANSPORT__MAX_ATTEMPTS=5`

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::domain::Collection;
pub use crate::infrastructure::parsing::config::ProductListSelectors;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Storefront origin and the brand collections to harvest
    pub site: SiteConfig,

    /// HTTP identity, throttling and retry policy
    pub transport: TransportConfig,

    /// Page walking limits
    pub pagination: PaginationConfig,

    /// Structural selectors for listing pages
    pub extraction: ProductListSelectors,

    /// Periodic run settings
    pub schedule: ScheduleConfig,

    /// Snapshot export settings
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin used to resolve relative links and images
    pub base_url: String,

    /// Collections in harvest order. A file or environment list replaces the
    /// built-in one as a whole.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<CollectionEntry>,
}

/// One configured collection; `id` is kept verbatim as the snapshot key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub id: String,
    pub url: String,
}

impl CollectionEntry {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub connection: String,
    pub upgrade_insecure_requests: bool,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Random delay before every attempt, drawn from [min, max]
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,

    /// Attempts per URL, first one included
    pub max_attempts: u32,

    /// Fixed wait after a failed attempt
    pub retry_cooldown_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Query parameter carrying the page index
    pub page_param: String,

    /// A page with fewer records than this is the last one
    pub full_page_threshold: usize,

    /// Hard ceiling on fetched pages per collection
    pub max_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_seconds: u64,
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_dir: PathBuf,
    pub file_prefix: String,
    pub write_json: bool,
    pub write_csv: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output (daily rolling)
    pub file_output: bool,

    /// JSON formatted file logs
    pub json_format: bool,

    /// Directory for log files
    pub log_dir: PathBuf,

    /// Number of log files to keep (older files are deleted on startup)
    pub max_files: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: ligaswu::BASE_URL.to_string(),
            collections: ligaswu::COLLECTIONS
                .iter()
                .map(|(id, url)| CollectionEntry::new(*id, *url))
                .collect(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            accept: defaults::ACCEPT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            connection: defaults::CONNECTION.to_string(),
            upgrade_insecure_requests: true,
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            jitter_min_ms: defaults::JITTER_MIN_MS,
            jitter_max_ms: defaults::JITTER_MAX_MS,
            max_attempts: defaults::MAX_ATTEMPTS,
            retry_cooldown_ms: defaults::RETRY_COOLDOWN_MS,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_param: defaults::PAGE_PARAM.to_string(),
            full_page_threshold: defaults::FULL_PAGE_THRESHOLD,
            max_pages: defaults::MAX_PAGES,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_seconds: defaults::SCHEDULE_INTERVAL_SECONDS,
            run_on_startup: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
            file_prefix: defaults::FILE_PREFIX.to_string(),
            write_json: true,
            write_csv: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            console_output: true,
            file_output: false,
            json_format: false,
            log_dir: PathBuf::from(defaults::LOG_DIR),
            max_files: defaults::LOG_MAX_FILES,
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_millis(self.retry_cooldown_ms)
    }

    /// No jitter, no cooldown. Used by tests and dry runs against local servers.
    pub fn without_delays(mut self) -> Self {
        self.jitter_min_ms = 0;
        self.jitter_max_ms = 0;
        self.retry_cooldown_ms = 0;
        self
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// An explicit `path` must exist; without one, `harvester.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // The built-in collections are left out of the defaults layer so a
        // configured list is never merged with them; serde fills them back in
        // when no source provides any.
        let mut base = AppConfig::default();
        base.site.collections.clear();
        let defaults = config::Config::try_from(&base)?;

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(defaults::CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// One-line overview for the startup log
    pub fn summary(&self) -> String {
        let ids: Vec<&str> = self.site.collections.iter().map(|c| c.id.as_str()).collect();
        format!(
            "{} collections [{}], max_attempts={}, max_pages={}",
            ids.len(),
            ids.join(", "),
            self.transport.max_attempts,
            self.pagination.max_pages
        )
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Validation { message });

        if Url::parse(&self.site.base_url).is_err() {
            return invalid(format!("site.base_url '{}' is not a valid URL", self.site.base_url));
        }
        if self.site.collections.is_empty() {
            return invalid("site.collections must not be empty".to_string());
        }
        let mut seen = HashSet::new();
        for entry in &self.site.collections {
            if entry.id.trim().is_empty() {
                return invalid("collection ids must not be empty".to_string());
            }
            if !seen.insert(entry.id.as_str()) {
                return invalid(format!("collection '{}' is configured more than once", entry.id));
            }
            if Url::parse(&entry.url).is_err() {
                return invalid(format!("collection '{}' has an invalid URL: {}", entry.id, entry.url));
            }
        }
        if self.transport.max_attempts == 0 {
            return invalid("transport.max_attempts must be greater than 0".to_string());
        }
        if self.transport.jitter_min_ms > self.transport.jitter_max_ms {
            return invalid("transport.jitter_min_ms cannot be greater than jitter_max_ms".to_string());
        }
        if self.pagination.max_pages == 0 {
            return invalid("pagination.max_pages must be greater than 0".to_string());
        }
        if self.pagination.full_page_threshold == 0 {
            return invalid("pagination.full_page_threshold must be greater than 0".to_string());
        }
        if self.extraction.card_selectors.is_empty() {
            return invalid("extraction.card_selectors must not be empty".to_string());
        }
        if self.schedule.interval_seconds == 0 {
            return invalid("schedule.interval_seconds must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Configured collections in configured order
    pub fn collections(&self) -> Result<Vec<Collection>, ConfigError> {
        self.site
            .collections
            .iter()
            .map(|entry| {
                Url::parse(&entry.url)
                    .map(|url| Collection::new(entry.id.clone(), url))
                    .map_err(|e| ConfigError::Validation {
                        message: format!("collection '{}' has an invalid URL: {}", entry.id, e),
                    })
            })
            .collect()
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.site.base_url).map_err(|e| ConfigError::Validation {
            message: format!("site.base_url is not a valid URL: {}", e),
        })
    }
}

/// Liga SWU storefront constants
pub mod ligaswu {
    /// Storefront origin
    pub const BASE_URL: &str = "https://www.ligaswu.com.br";

    /// Brand collections harvested by default
    pub const COLLECTIONS: [(&str, &str); 5] = [
        ("marca_79", "https://www.ligaswu.com.br/?view=cards%2Fsearch&card=marca%3D79+searchprod%3D1&tipo=1"),
        ("marca_2", "https://www.ligaswu.com.br/?view=cards%2Fsearch&card=marca%3D2+searchprod%3D1&tipo=1"),
        ("marca_4", "https://www.ligaswu.com.br/?view=cards%2Fsearch&card=marca%3D4+searchprod%3D1&tipo=1"),
        ("marca_9", "https://www.ligaswu.com.br/?view=cards%2Fsearch&card=marca%3D9+searchprod%3D1&tipo=1"),
        ("marca_11", "https://www.ligaswu.com.br/?view=cards%2Fsearch&card=marca%3D11+searchprod%3D1&tipo=1"),
    ];
}

/// Default configuration values
pub mod defaults {
    /// Config file looked up in the working directory
    pub const CONFIG_FILE: &str = "harvester";

    /// Prefix for environment overrides
    pub const ENV_PREFIX: &str = "HARVESTER";

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
    pub const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en;q=0.8";
    pub const CONNECTION: &str = "keep-alive";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;

    /// Default jitter interval before each attempt
    pub const JITTER_MIN_MS: u64 = 1000;
    pub const JITTER_MAX_MS: u64 = 3000;

    /// Default attempts per URL
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Default wait after a failed attempt
    pub const RETRY_COOLDOWN_MS: u64 = 5000;

    pub const PAGE_PARAM: &str = "page";

    /// Records on a full listing page
    pub const FULL_PAGE_THRESHOLD: usize = 40;

    /// Pages 0..=10
    pub const MAX_PAGES: u32 = 11;

    /// Six hours
    pub const SCHEDULE_INTERVAL_SECONDS: u64 = 6 * 60 * 60;

    pub const DATA_DIR: &str = "data";
    pub const FILE_PREFIX: &str = "liga_precos";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_DIR: &str = "logs";
    pub const LOG_MAX_FILES: usize = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.transport.max_attempts, 3);
        assert_eq!(config.pagination.full_page_threshold, 40);
        assert_eq!(config.pagination.max_pages, 11);
        assert_eq!(config.collections().unwrap().len(), 5);
    }

    #[test]
    fn rejects_inverted_jitter() {
        let mut config = AppConfig::default();
        config.transport.jitter_min_ms = 5000;
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn rejects_empty_collections() {
        let mut config = AppConfig::default();
        config.site.collections.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvester.toml");
        std::fs::write(
            &path,
            r#"
[transport]
max_attempts = 5
jitter_min_ms = 0
jitter_max_ms = 0

[pagination]
full_page_threshold = 24

[[site.collections]]
id = "marca_2"
url = "https://www.ligaswu.com.br/?view=cards%2Fsearch&card=marca%3D2+searchprod%3D1&tipo=1"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.transport.max_attempts, 5);
        assert_eq!(config.transport.retry_cooldown_ms, defaults::RETRY_COOLDOWN_MS);
        assert_eq!(config.pagination.full_page_threshold, 24);
        let ids: Vec<&str> = config.site.collections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["marca_2"]);
    }

    #[test]
    fn configured_collections_replace_builtin_ones_and_keep_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvester.toml");
        std::fs::write(
            &path,
            r#"
[[site.collections]]
id = "BrandA"
url = "https://shop.example/a"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        let collections = config.collections().unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].id, "BrandA");
        assert_eq!(collections[0].base_url.as_str(), "https://shop.example/a");
    }

    #[test]
    fn file_without_collections_keeps_builtin_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvester.toml");
        std::fs::write(&path, "[pagination]\nmax_pages = 3\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        let ids: Vec<String> = config.collections().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["marca_79", "marca_2", "marca_4", "marca_9", "marca_11"]);
        assert_eq!(config.pagination.max_pages, 3);
    }

    #[test]
    fn rejects_duplicate_collection_ids() {
        let mut config = AppConfig::default();
        config
            .site
            .collections
            .push(CollectionEntry::new("marca_2", "https://www.ligaswu.com.br/?x=1"));
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn summary_lists_collection_ids() {
        let summary = AppConfig::default().summary();
        assert!(summary.starts_with("5 collections [marca_79, marca_2"));
        assert!(summary.contains("max_pages=11"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/harvester.toml")));
        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }
}
