// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Type catalog access.
//!
//! A type catalog is the lazily fetched view of a server's type hierarchy.
//! The resolver only ever reads it.
//!
//! ```text
//! ┌────────────────────────────┐
//! │     TypeCatalog (trait)    │  fetch_node(id, cancel)
//! └────────────────────────────┘
//!        ▲                ▲
//!        │                │
//! StaticTypeCatalog   CachedCatalog ──► inner TypeCatalog
//! (in-memory / JSON)  (TTL + statistics)
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{OpcUaError, OpcUaResult};
use crate::types::{ids, NodeClass, NodeId, QualifiedName};

// =============================================================================
// CatalogNode
// =============================================================================

/// One reference of a catalog node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReference {
    /// Reference type.
    pub reference_type_id: NodeId,
    /// `true` for forward references.
    #[serde(default = "default_true")]
    pub is_forward: bool,
    /// Target node.
    pub target_id: NodeId,
}

fn default_true() -> bool {
    true
}

/// A node as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogNode {
    /// Node id.
    pub node_id: NodeId,
    /// Node class.
    #[serde(default)]
    pub node_class: NodeClass,
    /// Browse name.
    pub browse_name: QualifiedName,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Reference table.
    #[serde(default)]
    pub references: Vec<CatalogReference>,
}

impl CatalogNode {
    /// Creates an object type node with an optional supertype.
    pub fn object_type(node_id: NodeId, name: &str, super_type: Option<NodeId>) -> Self {
        let mut node = Self {
            node_id,
            node_class: NodeClass::ObjectType,
            browse_name: QualifiedName::standard(name),
            display_name: name.to_string(),
            references: Vec::new(),
        };
        if let Some(parent) = super_type {
            node.references.push(CatalogReference {
                reference_type_id: ids::HAS_SUBTYPE,
                is_forward: false,
                target_id: parent,
            });
        }
        node
    }

    /// Creates an instance declaration variable.
    pub fn variable(node_id: NodeId, browse_name: QualifiedName) -> Self {
        Self {
            node_id,
            node_class: NodeClass::Variable,
            display_name: browse_name.name.clone(),
            browse_name,
            references: Vec::new(),
        }
    }

    /// Adds a forward `HasProperty` reference.
    pub fn with_property(mut self, target: NodeId) -> Self {
        self.references.push(CatalogReference {
            reference_type_id: ids::HAS_PROPERTY,
            is_forward: true,
            target_id: target,
        });
        self
    }

    /// Adds a forward `HasComponent` reference.
    pub fn with_component(mut self, target: NodeId) -> Self {
        self.references.push(CatalogReference {
            reference_type_id: ids::HAS_COMPONENT,
            is_forward: true,
            target_id: target,
        });
        self
    }

    /// The supertype, from the inverse `HasSubtype` reference.
    pub fn super_type(&self) -> Option<&NodeId> {
        self.references
            .iter()
            .find(|r| !r.is_forward && r.reference_type_id == ids::HAS_SUBTYPE)
            .map(|r| &r.target_id)
    }

    /// Forward references of the given type, in table order.
    pub fn forward(&self, reference_type_id: &NodeId) -> impl Iterator<Item = &NodeId> {
        let reference_type_id = reference_type_id.clone();
        self.references
            .iter()
            .filter(move |r| r.is_forward && r.reference_type_id == reference_type_id)
            .map(|r| &r.target_id)
    }
}

// =============================================================================
// TypeCatalog
// =============================================================================

/// Read access to a server's type hierarchy.
#[async_trait]
pub trait TypeCatalog: Send + Sync {
    /// Fetches a node. Fails with [`OpcUaError::TypeNotFound`] when absent.
    async fn fetch_node(
        &self,
        node_id: &NodeId,
        cancel: &CancellationToken,
    ) -> OpcUaResult<Arc<CatalogNode>>;

    /// Catalog name for logs.
    fn name(&self) -> &str {
        "catalog"
    }
}

// =============================================================================
// StaticTypeCatalog
// =============================================================================

/// Event and condition types of the standard namespace, reduced to the
/// fields the publisher selects by default.
static STANDARD_NODES: Lazy<Vec<CatalogNode>> = Lazy::new(|| {
    const MESSAGE: NodeId = NodeId::numeric(0, 2050);
    const COMMENT: NodeId = NodeId::numeric(0, 9098);
    const CONDITION_NAME: NodeId = NodeId::numeric(0, 9099);
    const ENABLED_STATE: NodeId = NodeId::numeric(0, 9118);
    const ENABLED_STATE_ID: NodeId = NodeId::numeric(0, 9119);
    const CHANGES: NodeId = NodeId::numeric(0, 2134);

    vec![
        CatalogNode::object_type(ids::BASE_EVENT_TYPE, "BaseEventType", Some(ids::BASE_OBJECT_TYPE))
            .with_property(MESSAGE),
        CatalogNode::variable(MESSAGE, QualifiedName::standard("Message")),
        CatalogNode::object_type(ids::CONDITION_TYPE, "ConditionType", Some(ids::BASE_EVENT_TYPE))
            .with_component(COMMENT)
            .with_property(CONDITION_NAME)
            .with_component(ENABLED_STATE),
        CatalogNode::variable(COMMENT, QualifiedName::standard("Comment")),
        CatalogNode::variable(CONDITION_NAME, QualifiedName::standard("ConditionName")),
        CatalogNode::variable(ENABLED_STATE, QualifiedName::standard("EnabledState"))
            .with_property(ENABLED_STATE_ID),
        CatalogNode::variable(ENABLED_STATE_ID, QualifiedName::standard("Id")),
        CatalogNode::object_type(
            ids::BASE_MODEL_CHANGE_EVENT_TYPE,
            "BaseModelChangeEventType",
            Some(ids::BASE_EVENT_TYPE),
        ),
        CatalogNode::object_type(
            ids::GENERAL_MODEL_CHANGE_EVENT_TYPE,
            "GeneralModelChangeEventType",
            Some(ids::BASE_MODEL_CHANGE_EVENT_TYPE),
        )
        .with_property(CHANGES),
        CatalogNode::variable(CHANGES, QualifiedName::standard("Changes")),
    ]
});

/// An in-memory catalog.
///
/// The walk stops at `BaseEventType`, so `BaseObjectType` need not be
/// present.
#[derive(Debug, Clone, Default)]
pub struct StaticTypeCatalog {
    nodes: HashMap<NodeId, Arc<CatalogNode>>,
}

impl StaticTypeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the standard event and condition types.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.extend(STANDARD_NODES.iter().cloned());
        catalog
    }

    /// Parses a JSON array of nodes.
    pub fn from_json(json: &str) -> OpcUaResult<Self> {
        let nodes: Vec<CatalogNode> = serde_json::from_str(json)
            .map_err(|e| OpcUaError::catalog("<json>", e.to_string()))?;
        let mut catalog = Self::new();
        catalog.extend(nodes);
        Ok(catalog)
    }

    /// Loads a JSON catalog file, layered over the standard types.
    pub async fn load(path: impl AsRef<Path>) -> OpcUaResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| OpcUaError::catalog(path.display().to_string(), e.to_string()))?;
        let mut catalog = Self::standard();
        let custom = Self::from_json(&content)?;
        catalog.nodes.extend(custom.nodes);
        Ok(catalog)
    }

    /// Adds or replaces a node.
    pub fn insert(&mut self, node: CatalogNode) {
        self.nodes.insert(node.node_id.clone(), Arc::new(node));
    }

    /// Adds or replaces several nodes.
    pub fn extend(&mut self, nodes: impl IntoIterator<Item = CatalogNode>) {
        for node in nodes {
            self.insert(node);
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
impl TypeCatalog for StaticTypeCatalog {
    async fn fetch_node(
        &self,
        node_id: &NodeId,
        cancel: &CancellationToken,
    ) -> OpcUaResult<Arc<CatalogNode>> {
        if cancel.is_cancelled() {
            return Err(OpcUaError::Cancelled);
        }
        self.nodes
            .get(node_id)
            .cloned()
            .ok_or_else(|| OpcUaError::type_not_found(node_id.to_string()))
    }

    fn name(&self) -> &str {
        "static"
    }
}

// =============================================================================
// CachedCatalog
// =============================================================================

/// Cache hit/miss counters.
#[derive(Debug, Default)]
pub struct CatalogStatistics {
    /// Fetches served from the cache.
    pub cache_hits: AtomicU64,
    /// Fetches forwarded to the inner catalog.
    pub cache_misses: AtomicU64,
    /// Failed fetches.
    pub errors: AtomicU64,
}

impl CatalogStatistics {
    /// Returns the cache hit rate.
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    node: Arc<CatalogNode>,
    timestamp: Instant,
}

/// A TTL cache in front of another catalog, shared across resolution
/// passes. Failures are not cached.
pub struct CachedCatalog {
    inner: Arc<dyn TypeCatalog>,
    cache: RwLock<HashMap<NodeId, CacheEntry>>,
    max_entries: usize,
    ttl: Duration,
    stats: CatalogStatistics,
}

impl CachedCatalog {
    /// Wraps a catalog with default settings (1000 entries, 5 minutes).
    pub fn new(inner: Arc<dyn TypeCatalog>) -> Self {
        Self::with_config(inner, 1000, Duration::from_secs(300))
    }

    /// Wraps a catalog with custom capacity and TTL.
    pub fn with_config(inner: Arc<dyn TypeCatalog>, max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            ttl,
            stats: CatalogStatistics::default(),
        }
    }

    /// Returns the statistics.
    pub fn stats(&self) -> &CatalogStatistics {
        &self.stats
    }

    /// Number of cached nodes.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Clears the cache.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    async fn get(&self, node_id: &NodeId) -> Option<Arc<CatalogNode>> {
        let cache = self.cache.read().await;
        cache
            .get(node_id)
            .filter(|entry| entry.timestamp.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.node))
    }

    async fn put(&self, node: Arc<CatalogNode>) {
        let mut cache = self.cache.write().await;
        if cache.len() >= self.max_entries {
            Self::evict_oldest(&mut cache);
        }
        cache.insert(
            node.node_id.clone(),
            CacheEntry {
                node,
                timestamp: Instant::now(),
            },
        );
    }

    fn evict_oldest(cache: &mut HashMap<NodeId, CacheEntry>) {
        // Oldest 10%, at least one.
        let to_remove = (cache.len() / 10).max(1);
        let mut entries: Vec<(NodeId, Instant)> = cache
            .iter()
            .map(|(k, e)| (k.clone(), e.timestamp))
            .collect();
        entries.sort_by_key(|(_, t)| *t);
        for (key, _) in entries.into_iter().take(to_remove) {
            cache.remove(&key);
        }
    }
}

#[async_trait]
impl TypeCatalog for CachedCatalog {
    async fn fetch_node(
        &self,
        node_id: &NodeId,
        cancel: &CancellationToken,
    ) -> OpcUaResult<Arc<CatalogNode>> {
        if let Some(node) = self.get(node_id).await {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(node);
        }
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        match self.inner.fetch_node(node_id, cancel).await {
            Ok(node) => {
                self.put(Arc::clone(&node)).await;
                Ok(node)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "cached"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_standard_catalog() {
        let catalog = StaticTypeCatalog::standard();
        let cancel = CancellationToken::new();

        let condition = catalog.fetch_node(&ids::CONDITION_TYPE, &cancel).await.unwrap();
        assert_eq!(condition.super_type(), Some(&ids::BASE_EVENT_TYPE));
        assert_eq!(condition.forward(&ids::HAS_COMPONENT).count(), 2);

        let err = catalog
            .fetch_node(&NodeId::numeric(0, 9999), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, OpcUaError::TypeNotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_fetch() {
        let catalog = StaticTypeCatalog::standard();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = catalog
            .fetch_node(&ids::BASE_EVENT_TYPE, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, OpcUaError::Cancelled));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {
                "node_id": "ns=2;i=5000",
                "browse_name": "2:BoilerEventType",
                "references": [
                    { "reference_type_id": "i=45", "is_forward": false, "target_id": "i=2041" },
                    { "reference_type_id": "i=46", "target_id": "ns=2;i=5001" }
                ]
            },
            { "node_id": "ns=2;i=5001", "node_class": "Variable", "browse_name": "2:Pressure" }
        ]"#;
        let catalog = StaticTypeCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let err = StaticTypeCatalog::from_json("{").unwrap_err();
        assert!(matches!(err, OpcUaError::Catalog { .. }));
    }

    #[tokio::test]
    async fn test_cached_catalog_counts() {
        let cached = CachedCatalog::new(Arc::new(StaticTypeCatalog::standard()));
        let cancel = CancellationToken::new();

        cached.fetch_node(&ids::BASE_EVENT_TYPE, &cancel).await.unwrap();
        cached.fetch_node(&ids::BASE_EVENT_TYPE, &cancel).await.unwrap();
        let _ = cached.fetch_node(&NodeId::numeric(0, 1), &cancel).await;

        assert_eq!(cached.stats().cache_hits.load(Ordering::Relaxed), 1);
        assert_eq!(cached.stats().cache_misses.load(Ordering::Relaxed), 2);
        assert_eq!(cached.stats().errors.load(Ordering::Relaxed), 1);
        assert_eq!(cached.len().await, 1);
        assert!((cached.stats().cache_hit_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_cached_catalog_expires() {
        let cached = CachedCatalog::with_config(
            Arc::new(StaticTypeCatalog::standard()),
            10,
            Duration::ZERO,
        );
        let cancel = CancellationToken::new();
        cached.fetch_node(&ids::BASE_EVENT_TYPE, &cancel).await.unwrap();
        cached.fetch_node(&ids::BASE_EVENT_TYPE, &cancel).await.unwrap();
        assert_eq!(cached.stats().cache_hits.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_cached_catalog_evicts() {
        let cached = CachedCatalog::with_config(
            Arc::new(StaticTypeCatalog::standard()),
            2,
            Duration::from_secs(60),
        );
        let cancel = CancellationToken::new();
        for id in [ids::BASE_EVENT_TYPE, ids::CONDITION_TYPE, NodeId::numeric(0, 2050)] {
            cached.fetch_node(&id, &cancel).await.unwrap();
        }
        assert!(cached.len().await <= 2);
    }
}
