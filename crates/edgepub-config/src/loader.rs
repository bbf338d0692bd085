// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Settings loading.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and resolve `${VAR}` / `${VAR:default}` placeholders
//! 2. Parse YAML, TOML or JSON by extension
//! 3. Apply environment variable overrides
//! 4. Resolve relative paths against the settings file directory
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! EDGEPUB_PUBLISHED_NODES_FILE=/data/publishednodes.json
//! EDGEPUB_LOG_LEVEL=debug
//! EDGEPUB_SITE=plant-a
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{LogLevel, PublisherSettings};

// =============================================================================
// SettingsLoader
// =============================================================================

/// Loads [`PublisherSettings`] from files or strings.
///
/// # Examples
///
/// ```no_run
/// use edgepub_config::loader::SettingsLoader;
///
/// let settings = SettingsLoader::new().load("edgepub.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    /// Base directory for resolving relative paths.
    base_path: Option<PathBuf>,

    /// Environment variable prefix.
    env_prefix: String,

    /// Whether placeholders and overrides are read from the environment.
    resolve_env_vars: bool,

    /// Whether relative paths are resolved.
    resolve_paths: bool,
}

impl SettingsLoader {
    /// Creates a loader with default behavior.
    pub fn new() -> Self {
        Self {
            base_path: None,
            env_prefix: "EDGEPUB".to_string(),
            resolve_env_vars: true,
            resolve_paths: true,
        }
    }

    /// Sets the base path for resolving relative paths.
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Enables or disables relative path resolution.
    pub fn with_path_resolution(mut self, enabled: bool) -> Self {
        self.resolve_paths = enabled;
        self
    }

    /// Loads settings from a file.
    ///
    /// The format follows the extension: `.yaml`/`.yml`, `.toml` or `.json`.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<PublisherSettings> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading settings");

        let base_path = self.base_path.clone().unwrap_or_else(|| {
            path.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        });

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(&content)
        } else {
            content
        };

        let format = ConfigFormat::from_path(path)?;
        let mut settings: PublisherSettings =
            parse_str(&content, format).map_err(|e| match e {
                ConfigError::Serialization { message } => ConfigError::parse(path, message),
                other => other,
            })?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut settings)?;
        }
        if self.resolve_paths {
            resolve_relative_paths(&mut settings, &base_path);
        }

        settings.validate()?;

        debug!(
            nodes_file = %settings.storage.published_nodes_file.display(),
            level = settings.logging.level.as_str(),
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Loads settings from a string. Relative paths are left as written.
    pub fn load_from_str(
        &self,
        content: &str,
        format: ConfigFormat,
    ) -> ConfigResult<PublisherSettings> {
        let mut settings: PublisherSettings = parse_str(content, format)?;
        if self.resolve_env_vars {
            self.apply_env_overrides(&mut settings)?;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env_overrides(&self, settings: &mut PublisherSettings) -> ConfigResult<()> {
        if let Ok(value) = env::var(format!("{}_PUBLISHED_NODES_FILE", self.env_prefix)) {
            settings.storage.published_nodes_file = PathBuf::from(value);
        }
        if let Ok(value) = env::var(format!("{}_SITE", self.env_prefix)) {
            settings.publisher.site = Some(value);
        }
        let level_var = format!("{}_LOG_LEVEL", self.env_prefix);
        if let Ok(value) = env::var(&level_var) {
            settings.logging.level = LogLevel::parse(&value).ok_or_else(|| {
                ConfigError::invalid_env_var(&level_var, "expected trace, debug, info, warn or error")
            })?;
        }
        Ok(())
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported settings file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => {
            let config = config::Config::builder()
                .add_source(config::File::from_str(content, config::FileFormat::Yaml))
                .build()
                .map_err(|e| ConfigError::serialization(e.to_string()))?;
            config
                .try_deserialize()
                .map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// Replaces `${VAR}` and `${VAR:default}`. Unknown variables without a
/// default are kept verbatim.
fn resolve_env_placeholders(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let body = &after[..end];
        let (name, default) = match body.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (body, None),
        };
        match (env::var(name), default) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                warn!(variable = name, "Environment variable not found");
                result.push_str(&rest[start..start + 2 + end + 1]);
            }
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

fn resolve_relative_paths(settings: &mut PublisherSettings, base_path: &Path) {
    let nodes_file = &mut settings.storage.published_nodes_file;
    if nodes_file.is_relative() {
        *nodes_file = base_path.join(&*nodes_file);
    }
    if let Some(catalog) = settings.resolver.catalog_file.as_mut() {
        if catalog.is_relative() {
            *catalog = base_path.join(&*catalog);
        }
    }
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads settings from a file with default loader behavior.
pub fn load_settings(path: impl AsRef<Path>) -> ConfigResult<PublisherSettings> {
    SettingsLoader::new().load(path)
}

// =============================================================================
// Tests
// =============================================================================
