// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persistence of the authoritative entry list.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::error::{PublisherError, PublisherResult};
use crate::model::PublishEntry;

/// Hex SHA-256 of persisted content.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// =============================================================================
// EntryStore
// =============================================================================

/// Loads and saves the flat, user-authored entry list.
///
/// Implementations must make `save_entries` near-atomic: a concurrent
/// reader sees either the previous or the new list, never a mix.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Loads entries in stored order.
    async fn load_entries(&self) -> PublisherResult<Vec<PublishEntry>>;

    /// Replaces the stored entries.
    async fn save_entries(&self, entries: &[PublishEntry]) -> PublisherResult<()>;

    /// Fingerprint of the currently stored content, if the store can tell.
    ///
    /// The engine skips a reload when the fingerprint has not changed since
    /// the last load or save.
    async fn fingerprint(&self) -> PublisherResult<Option<String>> {
        Ok(None)
    }

    /// Stored elements the last `load_entries` dropped because they could
    /// not be decoded.
    fn undecodable_entries(&self) -> usize {
        0
    }

    /// Store name for logs.
    fn name(&self) -> &str {
        "entry_store"
    }
}

// =============================================================================
// MemoryEntryStore
// =============================================================================

/// In-memory store for tests and ephemeral deployments.
///
/// Saves can be made to fail on demand to exercise rollback paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryEntryStore {
    entries: Arc<RwLock<Vec<PublishEntry>>>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
    undecodable: Arc<AtomicUsize>,
}

impl MemoryEntryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with entries.
    pub fn with_entries(entries: Vec<PublishEntry>) -> Self {
        let store = Self::new();
        *store.entries.write() = entries;
        store
    }

    /// Makes subsequent saves fail with an I/O error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Reports stored elements as undecodable on every load.
    pub fn set_undecodable(&self, count: usize) {
        self.undecodable.store(count, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Returns a copy of the stored entries.
    pub fn entries(&self) -> Vec<PublishEntry> {
        self.entries.read().clone()
    }

    /// Replaces the stored entries without going through the engine.
    pub fn replace(&self, entries: Vec<PublishEntry>) {
        *self.entries.write() = entries;
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn load_entries(&self) -> PublisherResult<Vec<PublishEntry>> {
        Ok(self.entries.read().clone())
    }

    async fn save_entries(&self, entries: &[PublishEntry]) -> PublisherResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PublisherError::io(
                "memory store",
                std::io::Error::new(std::io::ErrorKind::Other, "save disabled"),
            ));
        }
        *self.entries.write() = entries.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fingerprint(&self) -> PublisherResult<Option<String>> {
        let bytes = serde_json::to_vec(&*self.entries.read())?;
        Ok(Some(content_fingerprint(&bytes)))
    }

    fn undecodable_entries(&self) -> usize {
        self.undecodable.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryEntryStore::new();
        assert!(store.load_entries().await.unwrap().is_empty());

        store
            .save_entries(&[PublishEntry::new("opc.tcp://plc:4840")])
            .await
            .unwrap();
        assert_eq!(store.load_entries().await.unwrap().len(), 1);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_failure_toggle() {
        let store = MemoryEntryStore::new();
        store.set_fail_saves(true);
        let err = store.save_entries(&[]).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_fingerprint_tracks_content() {
        let store = MemoryEntryStore::new();
        let empty = store.fingerprint().await.unwrap();
        store.replace(vec![PublishEntry::new("opc.tcp://plc:4840")]);
        let filled = store.fingerprint().await.unwrap();
        assert!(empty.is_some());
        assert_ne!(empty, filled);
    }

    #[tokio::test]
    async fn test_undecodable_count() {
        let store = MemoryEntryStore::new();
        assert_eq!(store.undecodable_entries(), 0);
        store.set_undecodable(2);
        assert_eq!(store.undecodable_entries(), 2);
    }
}
