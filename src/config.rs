use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::dto::UploadOptions;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{BatchLimits, LimitBoundary};
use crate::infrastructure::spool::{SpoolStrategy, DEFAULT_MEMORY_THRESHOLD};
use crate::infrastructure::transport::{CloudSearchConfig, DEFAULT_API_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Packing limits
    pub max_single_document_size: u64,
    pub max_batch_size: u64,
    pub limit_boundary: LimitBoundary,
    // Spooling
    pub spool_strategy: SpoolStrategy,
    pub spool_memory_threshold: u64,
    pub spool_dir: Option<PathBuf>,
    // Document service
    pub document_endpoint: Option<String>,
    pub api_version: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    // Upload loop
    pub stop_on_batch_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_single_document_size: BatchLimits::DEFAULT_MAX_SINGLE_DOCUMENT_SIZE,
            max_batch_size: BatchLimits::DEFAULT_MAX_BATCH_SIZE,
            limit_boundary: LimitBoundary::default(),
            spool_strategy: SpoolStrategy::default(),
            spool_memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            spool_dir: None,
            document_endpoint: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 30_000,
            stop_on_batch_failure: false,
        }
    }
}

impl Config {
    /// Read `SEARCH_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Load a TOML file; keys left out keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        Self::from_toml_str(&content)
            .map_err(|e| format!("Invalid config file {}: {}", path.display(), e))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply `SEARCH_*` overrides looked up through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|s| s.trim().parse().ok())
        }

        if let Some(v) = parsed(&lookup, "SEARCH_MAX_DOCUMENT_BYTES") {
            self.max_single_document_size = v;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_MAX_BATCH_BYTES") {
            self.max_batch_size = v;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_LIMIT_BOUNDARY") {
            self.limit_boundary = v;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_SPOOL_STRATEGY") {
            self.spool_strategy = v;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_SPOOL_MEMORY_THRESHOLD") {
            self.spool_memory_threshold = v;
        }
        if let Some(dir) = lookup("SEARCH_SPOOL_DIR").filter(|s| !s.is_empty()) {
            self.spool_dir = Some(PathBuf::from(dir));
        }
        if let Some(endpoint) = lookup("SEARCH_DOCUMENT_ENDPOINT").filter(|s| !s.is_empty()) {
            self.document_endpoint = Some(endpoint);
        }
        if let Some(version) = lookup("SEARCH_API_VERSION").filter(|s| !s.is_empty()) {
            self.api_version = version;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = v;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_RETRY_BASE_DELAY_MS") {
            self.retry_base_delay_ms = v;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_RETRY_MAX_DELAY_MS") {
            self.retry_max_delay_ms = v;
        }
        if let Some(v) = parsed(&lookup, "SEARCH_STOP_ON_BATCH_FAILURE") {
            self.stop_on_batch_failure = v;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.batch_limits().map_err(|e| e.to_string())?;

        if let Some(endpoint) = &self.document_endpoint {
            if endpoint.trim().is_empty() {
                return Err("SEARCH_DOCUMENT_ENDPOINT cannot be empty".to_string());
            }
        }

        if self.api_version.trim().is_empty() {
            return Err("SEARCH_API_VERSION cannot be empty".to_string());
        }

        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err("Request and connect timeouts must be at least 1 second".to_string());
        }

        if self.max_retries > 10 {
            return Err("SEARCH_MAX_RETRIES must be at most 10".to_string());
        }

        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(
                "SEARCH_RETRY_BASE_DELAY_MS cannot exceed SEARCH_RETRY_MAX_DELAY_MS".to_string(),
            );
        }

        Ok(())
    }

    pub fn batch_limits(&self) -> Result<BatchLimits, DomainError> {
        BatchLimits::with_boundary(
            self.max_single_document_size,
            self.max_batch_size,
            self.limit_boundary,
        )
    }

    /// Transport settings, `None` when no endpoint is configured
    pub fn cloudsearch_config(&self) -> Option<CloudSearchConfig> {
        let endpoint = self.document_endpoint.as_ref()?;
        Some(CloudSearchConfig {
            endpoint: endpoint.clone(),
            api_version: self.api_version.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
            retry_max_delay: Duration::from_millis(self.retry_max_delay_ms),
        })
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            stop_on_batch_failure: self.stop_on_batch_failure,
        }
    }
}
