// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-pass view over a type catalog.
//!
//! A `TypeTable` remembers every node fetched during one resolution pass so
//! that event specs sharing supertypes fetch each node once. It is dropped
//! when the pass ends; cross-pass caching belongs to
//! [`CachedCatalog`](crate::catalog::CachedCatalog).

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::catalog::{CatalogNode, TypeCatalog};
use crate::error::{OpcUaError, OpcUaResult};
use crate::types::NodeId;

/// Upper bound on supertype chain length, guarding against cyclic catalogs.
const MAX_DEPTH: usize = 64;

/// Memoizing type lookups for one resolution pass.
pub struct TypeTable {
    catalog: Arc<dyn TypeCatalog>,
    nodes: DashMap<NodeId, Arc<CatalogNode>>,
}

impl TypeTable {
    /// Creates an empty table over a catalog.
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self {
            catalog,
            nodes: DashMap::new(),
        }
    }

    /// Fetches a node, from memory when already seen in this pass.
    ///
    /// Cancellation interrupts an in-flight catalog fetch.
    pub async fn fetch(
        &self,
        node_id: &NodeId,
        cancel: &CancellationToken,
    ) -> OpcUaResult<Arc<CatalogNode>> {
        if let Some(node) = self.nodes.get(node_id) {
            return Ok(Arc::clone(node.value()));
        }

        let node = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OpcUaError::Cancelled),
            result = self.catalog.fetch_node(node_id, cancel) => result?,
        };
        self.nodes.insert(node_id.clone(), Arc::clone(&node));
        Ok(node)
    }

    /// Returns the supertype of a type.
    pub async fn super_type(
        &self,
        type_id: &NodeId,
        cancel: &CancellationToken,
    ) -> OpcUaResult<Option<NodeId>> {
        Ok(self.fetch(type_id, cancel).await?.super_type().cloned())
    }

    /// Returns `true` if `child` equals `parent` or derives from it.
    ///
    /// Missing supertypes end the walk rather than failing it.
    pub async fn is_subtype_of(
        &self,
        child: &NodeId,
        parent: &NodeId,
        cancel: &CancellationToken,
    ) -> OpcUaResult<bool> {
        let mut current = child.clone();
        for _ in 0..MAX_DEPTH {
            if &current == parent {
                return Ok(true);
            }
            match self.fetch(&current, cancel).await {
                Ok(node) => match node.super_type() {
                    Some(next) => current = next.clone(),
                    None => return Ok(false),
                },
                Err(OpcUaError::TypeNotFound { .. }) if &current != child => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }

    /// Returns the chain from `type_id` up to and including `root`, most
    /// basic first.
    ///
    /// Fails with [`OpcUaError::TypeNotFound`] if `type_id` does not derive
    /// from `root`.
    pub async fn chain_to(
        &self,
        type_id: &NodeId,
        root: &NodeId,
        cancel: &CancellationToken,
    ) -> OpcUaResult<Vec<Arc<CatalogNode>>> {
        let mut chain = Vec::new();
        let mut current = type_id.clone();

        for _ in 0..MAX_DEPTH {
            let node = self.fetch(&current, cancel).await?;
            let next = node.super_type().cloned();
            chain.push(node);

            if &current == root {
                chain.reverse();
                return Ok(chain);
            }
            match next {
                Some(next) => current = next,
                None => break,
            }
        }

        Err(OpcUaError::type_not_found(format!(
            "{} (not derived from {})",
            type_id, root
        )))
    }

    /// Number of nodes fetched in this pass.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing was fetched yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticTypeCatalog;
    use crate::types::ids;

    fn table() -> TypeTable {
        TypeTable::new(Arc::new(StaticTypeCatalog::standard()))
    }

    #[tokio::test]
    async fn test_chain_to_root() {
        let table = table();
        let cancel = CancellationToken::new();
        let chain = table
            .chain_to(&ids::CONDITION_TYPE, &ids::BASE_EVENT_TYPE, &cancel)
            .await
            .unwrap();
        let chain_ids: Vec<&NodeId> = chain.iter().map(|n| &n.node_id).collect();
        assert_eq!(chain_ids, vec![&ids::BASE_EVENT_TYPE, &ids::CONDITION_TYPE]);
    }

    #[tokio::test]
    async fn test_chain_not_derived() {
        let table = table();
        let cancel = CancellationToken::new();
        let err = table
            .chain_to(&ids::CONDITION_TYPE, &ids::GENERAL_MODEL_CHANGE_EVENT_TYPE, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, OpcUaError::TypeNotFound { .. }));
    }

    #[tokio::test]
    async fn test_is_subtype_of() {
        let table = table();
        let cancel = CancellationToken::new();
        assert!(table
            .is_subtype_of(&ids::CONDITION_TYPE, &ids::BASE_EVENT_TYPE, &cancel)
            .await
            .unwrap());
        assert!(!table
            .is_subtype_of(&ids::BASE_EVENT_TYPE, &ids::CONDITION_TYPE, &cancel)
            .await
            .unwrap());
        assert_eq!(
            table.super_type(&ids::CONDITION_TYPE, &cancel).await.unwrap(),
            Some(ids::BASE_EVENT_TYPE)
        );
    }

    #[tokio::test]
    async fn test_memoizes_fetches() {
        let table = table();
        let cancel = CancellationToken::new();
        table.fetch(&ids::BASE_EVENT_TYPE, &cancel).await.unwrap();
        table.fetch(&ids::BASE_EVENT_TYPE, &cancel).await.unwrap();
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled() {
        let table = table();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = table.fetch(&ids::BASE_EVENT_TYPE, &cancel).await.unwrap_err();
        assert!(matches!(err, OpcUaError::Cancelled));
    }
}
