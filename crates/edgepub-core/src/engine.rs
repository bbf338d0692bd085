// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration reconciliation engine.
//!
//! The engine owns the authoritative list of publish entries (one per live
//! dataset, unique under [`same_writer`]) and the writer group model derived
//! from it.
//!
//! # Concurrency
//!
//! ```text
//!  mutation ──► tokio::Mutex ──► copy entries ──► edit copy
//!                                                   │
//!                                  store.save_entries(copy)
//!                                                   │ ok
//!                       RwLock<Arc<Snapshot>> ◄─────┘ swap
//!                                                   │
//!                                               sink.apply
//!  query ──► RwLock read ──► Arc<Snapshot> (consistent view)
//! ```
//!
//! Mutations edit a copy and swap it in only after persistence succeeds, so
//! a failed call leaves both memory and storage untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use edgepub_core::{MemoryEntryStore, PublisherEngine};
//!
//! let engine = PublisherEngine::new(Arc::new(MemoryEntryStore::new()));
//! engine.reload().await?;
//! engine.publish_nodes(Some(entry)).await?;
//! let endpoints = engine.get_configured_endpoints(false);
//! ```

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::equality::{contains_node, same_writer};
use crate::error::{PublisherError, PublisherResult};
use crate::model::{NodeSpec, PublishEntry};
use crate::sink::{NullSink, WriterGroupSink};
use crate::store::EntryStore;
use crate::writer_group::DerivedModel;

// =============================================================================
// Snapshot
// =============================================================================

#[derive(Debug, Default)]
struct Snapshot {
    entries: Vec<PublishEntry>,
    model: DerivedModel,
    fingerprint: Option<String>,
    persisted_at: Option<DateTime<Utc>>,
    loaded_at: Option<DateTime<Utc>>,
}

/// Point-in-time engine statistics.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    /// Live datasets.
    pub entries: usize,
    /// Writer groups.
    pub groups: usize,
    /// Dataset writers.
    pub writers: usize,
    /// Published nodes.
    pub nodes: usize,
    /// Fingerprint of the last loaded or saved content.
    pub fingerprint: Option<String>,
    /// Last successful save.
    pub persisted_at: Option<DateTime<Utc>>,
    /// Last reload that changed state.
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Result of [`PublisherEngine::reload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReloadOutcome {
    /// Stored content matched the last known fingerprint.
    Unchanged,
    /// Entries were replayed.
    Reloaded {
        /// Live datasets after replay.
        entries: usize,
        /// Stored elements discarded, whether undecodable or malformed.
        skipped: usize,
    },
}

// =============================================================================
// PublisherEngine
// =============================================================================

/// Serializes configuration changes, persists them and publishes the
/// derived model.
pub struct PublisherEngine {
    store: Arc<dyn EntryStore>,
    sink: Arc<dyn WriterGroupSink>,
    state: RwLock<Arc<Snapshot>>,
    mutation: Mutex<()>,
}

impl std::fmt::Debug for PublisherEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherEngine")
            .field("store", &self.store.name())
            .field("sink", &self.sink.name())
            .field("entries", &self.state.read().entries.len())
            .finish()
    }
}

impl PublisherEngine {
    /// Creates an empty engine. Call [`reload`](Self::reload) to load
    /// persisted state.
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            sink: Arc::new(NullSink),
            state: RwLock::new(Arc::new(Snapshot::default())),
            mutation: Mutex::new(()),
        }
    }

    /// Sets the sink receiving committed models.
    pub fn with_sink(mut self, sink: Arc<dyn WriterGroupSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Creates an engine and loads persisted state.
    pub async fn open(
        store: Arc<dyn EntryStore>,
        sink: Arc<dyn WriterGroupSink>,
    ) -> PublisherResult<Self> {
        let engine = Self::new(store).with_sink(sink);
        engine.reload().await?;
        Ok(engine)
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.read())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds nodes to a dataset, creating it if needed.
    ///
    /// Nodes already present (by [`same_node`](crate::equality::same_node))
    /// are not duplicated.
    pub async fn publish_nodes(&self, request: Option<PublishEntry>) -> PublisherResult<()> {
        let request = normalize_request(request)?;
        if request.has_no_nodes() {
            return Err(PublisherError::bad_request(format!(
                "Request contains no nodes for endpoint {}",
                request.endpoint()
            )));
        }

        let _guard = self.mutation.lock().await;
        let mut entries = self.snapshot().entries.clone();
        let added = merge_entry(&mut entries, request.clone());

        self.commit(entries).await?;
        tracing::info!(
            endpoint = %request.endpoint(),
            requested = request.nodes().len(),
            added = added,
            "Published nodes"
        );
        Ok(())
    }

    /// Removes nodes from a dataset.
    ///
    /// A request without nodes removes the whole dataset. Every requested
    /// node must exist, otherwise nothing is removed.
    pub async fn unpublish_nodes(&self, request: Option<PublishEntry>) -> PublisherResult<()> {
        let request = normalize_request(request)?;

        let _guard = self.mutation.lock().await;
        let mut entries = self.snapshot().entries.clone();
        let index = find_entry(&entries, &request)?;

        if request.has_no_nodes() {
            entries.remove(index);
        } else {
            let existing = entries[index].nodes();
            let missing: Vec<NodeSpec> = request
                .nodes()
                .iter()
                .filter(|node| !contains_node(existing, node))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(PublisherError::not_found(format!(
                    "Nodes not found: {}",
                    describe(&request.with_nodes(missing))
                )));
            }

            let remaining: Vec<NodeSpec> = existing
                .iter()
                .filter(|node| !contains_node(request.nodes(), node))
                .cloned()
                .collect();
            if remaining.is_empty() {
                entries.remove(index);
            } else {
                entries[index].opc_nodes = Some(remaining);
            }
        }

        self.commit(entries).await?;
        tracing::info!(
            endpoint = %request.endpoint(),
            nodes = request.nodes().len(),
            "Unpublished nodes"
        );
        Ok(())
    }

    /// Removes every dataset matching the request, or everything when the
    /// request is absent or names no endpoint.
    pub async fn unpublish_all_nodes(&self, request: Option<PublishEntry>) -> PublisherResult<()> {
        let _guard = self.mutation.lock().await;
        let current = self.snapshot();

        let entries = match request {
            Some(request) if !request.endpoint().is_empty() => {
                let request = normalize_request(Some(request))?;
                if !request.has_no_nodes() {
                    return Err(PublisherError::bad_request(
                        "Nodes must be empty when unpublishing all nodes of an endpoint",
                    ));
                }
                let remaining: Vec<PublishEntry> = current
                    .entries
                    .iter()
                    .filter(|entry| !same_writer(entry, &request))
                    .cloned()
                    .collect();
                if remaining.len() == current.entries.len() {
                    return Err(endpoint_not_found(&request));
                }
                remaining
            }
            _ => Vec::new(),
        };

        let removed = current.entries.len() - entries.len();
        self.commit(entries).await?;
        tracing::info!(removed = removed, "Unpublished all nodes");
        Ok(())
    }

    /// Applies a batch of replace-or-delete requests atomically.
    ///
    /// An entry with nodes replaces the dataset's node set wholesale; an
    /// entry without nodes deletes the dataset. Any failure leaves the
    /// engine unchanged.
    pub async fn add_or_update_endpoints(
        &self,
        requests: Option<Vec<PublishEntry>>,
    ) -> PublisherResult<()> {
        let requests = requests.ok_or_else(|| PublisherError::bad_request("Request is null"))?;
        let requests = requests
            .into_iter()
            .map(|request| normalize_request(Some(request)))
            .collect::<PublisherResult<Vec<_>>>()?;

        for (i, a) in requests.iter().enumerate() {
            for (j, b) in requests.iter().enumerate().skip(i + 1) {
                if same_writer(a, b) {
                    return Err(PublisherError::bad_request(format!(
                        "Request contains two entries for the same endpoint at index {} and {}",
                        i, j
                    )));
                }
            }
        }

        let _guard = self.mutation.lock().await;
        let mut entries = self.snapshot().entries.clone();

        for request in &requests {
            let found = entries.iter().position(|entry| same_writer(entry, request));
            match (found, request.has_no_nodes()) {
                (Some(index), true) => {
                    entries.remove(index);
                }
                (None, true) => return Err(endpoint_not_found(request)),
                (Some(index), false) => {
                    entries[index].opc_nodes = Some(distinct_nodes(request.nodes()));
                }
                (None, false) => {
                    let mut entry = request.clone();
                    entry.opc_nodes = Some(distinct_nodes(request.nodes()));
                    entries.push(entry);
                }
            }
        }

        self.commit(entries).await?;
        tracing::info!(requests = requests.len(), "Updated endpoints");
        Ok(())
    }

    /// Replaces the whole configuration.
    ///
    /// Entries are replayed through the publish merge path, so duplicates
    /// collapse into one dataset.
    pub async fn set_configured_endpoints(&self, entries: Vec<PublishEntry>) -> PublisherResult<()> {
        let mut normalized = Vec::with_capacity(entries.len());
        for entry in entries {
            normalized.push(normalize_request(Some(entry))?);
        }

        let _guard = self.mutation.lock().await;
        let (entries, _) = replay(normalized);
        let count = entries.len();
        self.commit(entries).await?;
        tracing::info!(entries = count, "Replaced configuration");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns one entry per live dataset in first-seen order.
    pub fn get_configured_endpoints(&self, include_nodes: bool) -> Vec<PublishEntry> {
        let snapshot = self.snapshot();
        snapshot
            .entries
            .iter()
            .map(|entry| {
                if include_nodes {
                    entry.clone()
                } else {
                    entry.to_metadata()
                }
            })
            .collect()
    }

    /// Returns the nodes of the dataset matching the request.
    ///
    /// Nodes carry the effective publishing interval.
    pub fn get_configured_nodes_on_endpoint(
        &self,
        request: Option<PublishEntry>,
    ) -> PublisherResult<Vec<NodeSpec>> {
        let request = normalize_request(request)?;
        let snapshot = self.snapshot();
        let index = find_entry(&snapshot.entries, &request)?;
        Ok(snapshot.entries[index].nodes().to_vec())
    }

    /// Returns the derived writer group model.
    pub fn writer_groups(&self) -> DerivedModel {
        self.snapshot().model.clone()
    }

    /// Returns engine statistics.
    pub fn status(&self) -> EngineStatus {
        let snapshot = self.snapshot();
        EngineStatus {
            entries: snapshot.entries.len(),
            groups: snapshot.model.groups.len(),
            writers: snapshot.model.writer_count(),
            nodes: snapshot.model.node_count(),
            fingerprint: snapshot.fingerprint.clone(),
            persisted_at: snapshot.persisted_at,
            loaded_at: snapshot.loaded_at,
        }
    }

    // =========================================================================
    // Reload & Commit
    // =========================================================================

    /// Replays persisted entries, replacing the in-memory state.
    ///
    /// Malformed entries are logged and skipped. Nothing happens when the
    /// store reports the same fingerprint as the last load or save.
    pub async fn reload(&self) -> PublisherResult<ReloadOutcome> {
        let _guard = self.mutation.lock().await;
        let current = self.snapshot();

        let fingerprint = self.store.fingerprint().await?;
        if fingerprint.is_some() && fingerprint == current.fingerprint {
            tracing::debug!(store = %self.store.name(), "Stored entries unchanged, skipping reload");
            return Ok(ReloadOutcome::Unchanged);
        }

        let started = Instant::now();
        let stored = self.store.load_entries().await?;
        let (entries, malformed) = replay(stored);
        let skipped = malformed + self.store.undecodable_entries();
        let model = DerivedModel::expand(&entries);

        let outcome = ReloadOutcome::Reloaded {
            entries: entries.len(),
            skipped,
        };
        tracing::info!(
            store = %self.store.name(),
            entries = entries.len(),
            skipped = skipped,
            writers = model.writer_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Reloaded published nodes"
        );

        *self.state.write() = Arc::new(Snapshot {
            entries,
            model,
            fingerprint,
            persisted_at: current.persisted_at,
            loaded_at: Some(Utc::now()),
        });
        self.notify_from(&current.model).await;
        Ok(outcome)
    }

    /// Persists `entries`, then swaps them in. Caller holds the mutation lock.
    async fn commit(&self, entries: Vec<PublishEntry>) -> PublisherResult<()> {
        let current = self.snapshot();

        if let Err(e) = self.store.save_entries(&entries).await {
            tracing::error!(store = %self.store.name(), error = %e, "Failed to persist entries");
            return Err(e);
        }
        let fingerprint = match self.store.fingerprint().await {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fingerprint stored entries");
                None
            }
        };

        let model = DerivedModel::expand(&entries);
        tracing::debug!(
            groups = model.groups.len(),
            writers = model.writer_count(),
            changes = current.model.diff(&model).len(),
            "Committed entries"
        );

        *self.state.write() = Arc::new(Snapshot {
            entries,
            model,
            fingerprint,
            persisted_at: Some(Utc::now()),
            loaded_at: current.loaded_at,
        });
        self.notify_from(&current.model).await;
        Ok(())
    }

    async fn notify_from(&self, previous: &DerivedModel) {
        let snapshot = self.snapshot();
        let changes = previous.diff(&snapshot.model);
        if let Err(e) = self.sink.apply(&snapshot.model, &changes).await {
            tracing::warn!(sink = %self.sink.name(), error = %e, "Sink rejected writer groups");
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Validates presence, converts legacy shapes and moves the dataset
/// publishing interval into the nodes.
fn normalize_request(request: Option<PublishEntry>) -> PublisherResult<PublishEntry> {
    let request = request.ok_or_else(|| PublisherError::bad_request("Request is null"))?;
    let mut request = request.into_current_shape()?;
    request.propagate_publishing_interval();
    Ok(request)
}

fn find_entry(entries: &[PublishEntry], request: &PublishEntry) -> PublisherResult<usize> {
    entries
        .iter()
        .position(|entry| same_writer(entry, request))
        .ok_or_else(|| endpoint_not_found(request))
}

/// Merges a normalized entry into the list. Returns the number of nodes added.
fn merge_entry(entries: &mut Vec<PublishEntry>, request: PublishEntry) -> usize {
    match entries.iter().position(|entry| same_writer(entry, &request)) {
        Some(index) => {
            let nodes = entries[index].opc_nodes.get_or_insert_with(Vec::new);
            let mut added = 0;
            for node in request.nodes() {
                if !contains_node(nodes, node) {
                    nodes.push(node.clone());
                    added += 1;
                }
            }
            added
        }
        None => {
            let mut entry = request;
            let nodes = distinct_nodes(entry.nodes());
            let added = nodes.len();
            entry.opc_nodes = Some(nodes);
            entries.push(entry);
            added
        }
    }
}

/// Replays stored entries through the merge path. Returns the live entries
/// and the number of malformed entries skipped.
fn replay(stored: Vec<PublishEntry>) -> (Vec<PublishEntry>, usize) {
    let mut entries = Vec::new();
    let mut skipped = 0;

    for (index, entry) in stored.into_iter().enumerate() {
        let mut entry = match entry.into_current_shape() {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(index = index, error = %e, "Skipping malformed entry");
                skipped += 1;
                continue;
            }
        };
        if entry.has_no_nodes() {
            tracing::debug!(index = index, endpoint = %entry.endpoint(), "Entry has no nodes");
            continue;
        }
        entry.propagate_publishing_interval();
        merge_entry(&mut entries, entry);
    }

    (entries, skipped)
}

fn distinct_nodes(nodes: &[NodeSpec]) -> Vec<NodeSpec> {
    let mut distinct: Vec<NodeSpec> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if !contains_node(&distinct, node) {
            distinct.push(node.clone());
        }
    }
    distinct
}

fn endpoint_not_found(request: &PublishEntry) -> PublisherError {
    PublisherError::not_found(format!(
        "Endpoint not found: {} ({})",
        request.endpoint(),
        describe(request)
    ))
}

/// JSON form of a request for error messages, without the password.
fn describe(request: &PublishEntry) -> String {
    serde_json::to_string(&request.redacted()).unwrap_or_else(|_| request.endpoint().to_string())
}

// =============================================================================
// Tests
// =============================================================================
