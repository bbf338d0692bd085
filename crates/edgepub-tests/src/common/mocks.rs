// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! - Configurable failures for error paths
//! - Recording of interactions for verification
//! - Thread-safe for concurrent tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use edgepub_core::{
    DerivedModel, EntryStore, MemoryEntryStore, ModelChange, PublishEntry, PublisherError,
    PublisherResult, WriterGroupSink,
};
use edgepub_opcua::{CatalogNode, NodeId, OpcUaError, OpcUaResult, StaticTypeCatalog, TypeCatalog};

// =============================================================================
// Mock Type Catalog
// =============================================================================

/// A catalog that counts fetches and can fail or stall on chosen nodes.
#[derive(Debug, Default)]
pub struct MockTypeCatalog {
    inner: StaticTypeCatalog,
    fetches: AtomicUsize,
    fetched: Mutex<Vec<NodeId>>,
    failing: Mutex<HashSet<NodeId>>,
    latency: Mutex<Duration>,
}

impl MockTypeCatalog {
    /// Wraps a static catalog.
    pub fn new(inner: StaticTypeCatalog) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    /// The standard catalog.
    pub fn standard() -> Self {
        Self::new(StaticTypeCatalog::standard())
    }

    /// Makes fetches of `node_id` fail with a catalog error.
    pub fn fail_on(&self, node_id: NodeId) {
        self.failing.lock().insert(node_id);
    }

    /// Delays every fetch.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Number of fetches served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of fetches for one node.
    pub fn fetches_of(&self, node_id: &NodeId) -> usize {
        self.fetched.lock().iter().filter(|id| *id == node_id).count()
    }
}

#[async_trait]
impl TypeCatalog for MockTypeCatalog {
    async fn fetch_node(
        &self,
        node_id: &NodeId,
        cancel: &CancellationToken,
    ) -> OpcUaResult<Arc<CatalogNode>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().push(node_id.clone());

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(OpcUaError::Cancelled),
                _ = tokio::time::sleep(latency) => {}
            }
        }
        if self.failing.lock().contains(node_id) {
            return Err(OpcUaError::catalog(node_id.to_string(), "injected failure"));
        }
        self.inner.fetch_node(node_id, cancel).await
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Recording Sink
// =============================================================================

/// A sink that records every applied model.
#[derive(Debug, Default)]
pub struct RecordingSink {
    models: Mutex<Vec<DerivedModel>>,
    changes: Mutex<Vec<Vec<ModelChange>>>,
    fail: AtomicBool,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent applies fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of applies received.
    pub fn apply_count(&self) -> usize {
        self.models.lock().len()
    }

    /// The most recent model.
    pub fn last_model(&self) -> Option<DerivedModel> {
        self.models.lock().last().cloned()
    }

    /// The changes of the most recent apply.
    pub fn last_changes(&self) -> Vec<ModelChange> {
        self.changes.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl WriterGroupSink for RecordingSink {
    async fn apply(&self, model: &DerivedModel, changes: &[ModelChange]) -> PublisherResult<()> {
        self.models.lock().push(model.clone());
        self.changes.lock().push(changes.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublisherError::bad_request("sink rejected model"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// =============================================================================
// Flaky Store
// =============================================================================

/// A memory store whose next saves fail a configurable number of times.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: MemoryEntryStore,
    failures_left: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
}

impl FlakyStore {
    /// Creates an empty flaky store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next `count` saves.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Save attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Stored entries.
    pub fn entries(&self) -> Vec<PublishEntry> {
        self.inner.entries()
    }
}

#[async_trait]
impl EntryStore for FlakyStore {
    async fn load_entries(&self) -> PublisherResult<Vec<PublishEntry>> {
        self.inner.load_entries().await
    }

    async fn save_entries(&self, entries: &[PublishEntry]) -> PublisherResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(PublisherError::io(
                "flaky store",
                std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
            ));
        }
        self.inner.save_entries(entries).await
    }

    async fn fingerprint(&self) -> PublisherResult<Option<String>> {
        self.inner.fingerprint().await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}
