// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! File-backed entry store.
//!
//! Saves write the whole array to `<file>.tmp` and rename it over the
//! target, so readers see either the old or the new content.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use edgepub_core::{content_fingerprint, EntryStore, PublishEntry, PublisherResult};

use crate::error::{ConfigError, ConfigResult};
use crate::parser::{parse_entries, render_entries};
use crate::schema::StorageSettings;

/// Stores entries in a published nodes file.
#[derive(Debug)]
pub struct FileEntryStore {
    path: PathBuf,
    create_if_missing: bool,
    pretty: bool,
    last_skipped: AtomicUsize,
}

impl FileEntryStore {
    /// Creates a store for a file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            pretty: true,
            last_skipped: AtomicUsize::new(0),
        }
    }

    /// Creates a store from storage settings.
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(&settings.published_nodes_file)
            .with_create_if_missing(settings.create_if_missing)
            .with_pretty(settings.pretty)
    }

    /// Creates an empty file on first load when none exists.
    pub fn with_create_if_missing(mut self, enabled: bool) -> Self {
        self.create_if_missing = enabled;
        self
    }

    /// Writes indented JSON.
    pub fn with_pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }

    /// Path of the published nodes file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Malformed elements dropped by the last load.
    pub fn last_skipped(&self) -> usize {
        self.last_skipped.load(Ordering::Relaxed)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn read(&self) -> ConfigResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::io(&self.path, e)),
        }
    }

    async fn write(&self, bytes: &[u8]) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::io(parent, e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|e| ConfigError::io(&temp, e))?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(ConfigError::io(&self.path, e));
        }
        Ok(())
    }

    async fn load(&self) -> ConfigResult<Vec<PublishEntry>> {
        let Some(bytes) = self.read().await? else {
            if self.create_if_missing {
                tracing::info!(file = %self.path.display(), "Creating empty published nodes file");
                self.write(b"[]").await?;
            }
            self.last_skipped.store(0, Ordering::Relaxed);
            return Ok(Vec::new());
        };

        let content = String::from_utf8(bytes)
            .map_err(|e| ConfigError::parse(&self.path, e.to_string()))?;
        let parsed = parse_entries(&content, &self.path)?;
        self.last_skipped.store(parsed.skipped.len(), Ordering::Relaxed);

        tracing::debug!(
            file = %self.path.display(),
            entries = parsed.entries.len(),
            skipped = parsed.skipped.len(),
            "Read published nodes file"
        );
        Ok(parsed.entries)
    }
}

#[async_trait]
impl EntryStore for FileEntryStore {
    async fn load_entries(&self) -> PublisherResult<Vec<PublishEntry>> {
        Ok(self.load().await?)
    }

    async fn save_entries(&self, entries: &[PublishEntry]) -> PublisherResult<()> {
        let bytes = render_entries(entries, self.pretty)?;
        self.write(&bytes).await?;
        tracing::debug!(
            file = %self.path.display(),
            entries = entries.len(),
            bytes = bytes.len(),
            "Wrote published nodes file"
        );
        Ok(())
    }

    async fn fingerprint(&self) -> PublisherResult<Option<String>> {
        Ok(self.read().await?.map(|bytes| content_fingerprint(&bytes)))
    }

    fn undecodable_entries(&self) -> usize {
        self.last_skipped()
    }

    fn name(&self) -> &str {
        "file"
    }
}
