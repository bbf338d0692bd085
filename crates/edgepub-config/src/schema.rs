// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Publisher settings schema.
//!
//! ```yaml
//! publisher:
//!   id: edge-01
//!   site: plant-a
//! storage:
//!   published_nodes_file: publishednodes.json
//!   create_if_missing: true
//!   pretty: true
//! resolver:
//!   max_concurrency: 8
//!   cache_ttl_secs: 300
//!   cache_capacity: 1000
//!   catalog_file: types.json
//! logging:
//!   level: info
//!   format: text
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default published nodes file name.
pub const DEFAULT_PUBLISHED_NODES_FILE: &str = "publishednodes.json";

/// Default number of event specs resolved concurrently.
pub const DEFAULT_RESOLVER_CONCURRENCY: usize = 8;

/// Default catalog cache entry lifetime in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default catalog cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

// =============================================================================
// Top-Level Settings
// =============================================================================

/// Root settings for an edgepub instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherSettings {
    /// Publisher identification.
    #[serde(default)]
    pub publisher: PublisherSection,

    /// Published nodes file storage.
    #[serde(default)]
    pub storage: StorageSettings,

    /// Event field resolution.
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl PublisherSettings {
    /// Validates every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.publisher.validate()?;
        self.storage.validate()?;
        self.resolver.validate()?;
        Ok(())
    }
}

// =============================================================================
// Publisher
// =============================================================================

/// Publisher identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherSection {
    /// Publisher identifier.
    #[serde(default = "default_publisher_id")]
    pub id: String,

    /// Site label.
    #[serde(default)]
    pub site: Option<String>,
}

fn default_publisher_id() -> String {
    "edgepub".to_string()
}

impl PublisherSection {
    fn validate(&self) -> ConfigResult<()> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::validation("publisher.id", "must not be empty"));
        }
        Ok(())
    }
}

impl Default for PublisherSection {
    fn default() -> Self {
        Self {
            id: default_publisher_id(),
            site: None,
        }
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Published nodes file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSettings {
    /// Path of the published nodes file.
    #[serde(default = "default_published_nodes_file")]
    pub published_nodes_file: PathBuf,

    /// Create an empty file when it does not exist.
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    /// Write indented JSON.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_published_nodes_file() -> PathBuf {
    PathBuf::from(DEFAULT_PUBLISHED_NODES_FILE)
}

fn default_true() -> bool {
    true
}

impl StorageSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.published_nodes_file.as_os_str().is_empty() {
            return Err(ConfigError::validation(
                "storage.published_nodes_file",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            published_nodes_file: default_published_nodes_file(),
            create_if_missing: true,
            pretty: true,
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Event field resolver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverSettings {
    /// Event specs resolved concurrently.
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,

    /// Catalog cache entry lifetime in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Catalog cache capacity.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// JSON file with additional type nodes.
    #[serde(default)]
    pub catalog_file: Option<PathBuf>,
}

fn default_concurrency() -> usize {
    DEFAULT_RESOLVER_CONCURRENCY
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl ResolverSettings {
    /// Cache entry lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::validation(
                "resolver.max_concurrency",
                "must be at least 1",
            ));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::validation(
                "resolver.cache_capacity",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_RESOLVER_CONCURRENCY,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            catalog_file: None,
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level name, accepting `warning` for `warn`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable.
    #[default]
    Text,
    /// Single line.
    Compact,
    /// JSON for log shippers.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = PublisherSettings::default();
        settings.validate().unwrap();
        assert_eq!(
            settings.storage.published_nodes_file,
            PathBuf::from(DEFAULT_PUBLISHED_NODES_FILE)
        );
        assert_eq!(settings.resolver.cache_ttl(), Duration::from_secs(300));
        assert_eq!(settings.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_validation_failures() {
        let mut settings = PublisherSettings::default();
        settings.storage.published_nodes_file = PathBuf::new();
        assert!(settings.validate().unwrap_err().is_validation_error());

        let mut settings = PublisherSettings::default();
        settings.resolver.max_concurrency = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("resolver.max_concurrency"));
    }

    #[test]
    fn test_deserialize_partial_json() {
        let settings: PublisherSettings =
            serde_json::from_str(r#"{"logging": {"level": "debug", "format": "json"}}"#).unwrap();
        assert_eq!(settings.logging.level, LogLevel::Debug);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert!(settings.storage.create_if_missing);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<PublisherSettings, _> = serde_json::from_str(r#"{"unknown": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
    }
}
