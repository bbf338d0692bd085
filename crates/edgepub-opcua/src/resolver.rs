// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Event field resolution.
//!
//! Turns an event template (a type reference plus options) into concrete
//! select clauses and an `OfType` where clause by walking the type's
//! supertype chain.
//!
//! ```text
//! EventSpec { TypeDefinitionId: "i=2782" }
//!        │
//!        ▼  chain_to(BaseEventType)
//! [BaseEventType, ConditionType]
//!        │  collect HasProperty / HasComponent variables (recursive)
//!        ▼  distinct, ordered by joined browse name
//! [ConditionId, Comment, ConditionName, EnabledState, EnabledState/Id, Message]
//!        +
//! WhereClause: OfType("i=2782")
//! ```
//!
//! Fetches along one chain are sequential. Event specs are resolved
//! concurrently, share one [`TypeTable`] per pass and fail independently.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use edgepub_core::{
    ConditionHandlingOptions, ContentFilter, DerivedModel, EventSpec, NodeAttribute, NodeSpec,
    SelectedField,
};

use crate::catalog::{CatalogNode, TypeCatalog};
use crate::error::{OpcUaError, OpcUaResult};
use crate::table::TypeTable;
use crate::types::{ids, NodeClass, NodeId, QualifiedName};

/// Display name of the leading condition id field.
pub const CONDITION_ID_FIELD: &str = "ConditionId";

/// Nesting limit for instance declarations.
const MAX_FIELD_DEPTH: usize = 16;

// =============================================================================
// ResolveReport
// =============================================================================

/// An event spec that could not be resolved.
#[derive(Debug)]
pub struct ResolveFailure {
    /// Identifier of the node carrying the template.
    pub node: String,
    /// Requested event type.
    pub type_id: String,
    /// Cause.
    pub error: OpcUaError,
}

/// Outcome of a resolution pass.
#[derive(Debug, Default)]
pub struct ResolveReport {
    /// Event specs resolved.
    pub resolved: usize,
    /// Event specs left untouched because resolution failed.
    pub failures: Vec<ResolveFailure>,
}

impl ResolveReport {
    /// Returns `true` if nothing failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// FieldResolver
// =============================================================================

/// Resolves event templates against a type catalog.
#[derive(Clone)]
pub struct FieldResolver {
    catalog: Arc<dyn TypeCatalog>,
    max_concurrency: usize,
}

impl std::fmt::Debug for FieldResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldResolver")
            .field("catalog", &self.catalog.name())
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

struct Job {
    slot: usize,
    node: String,
    template: EventSpec,
    condition_handling: Option<ConditionHandlingOptions>,
}

impl FieldResolver {
    /// Creates a resolver.
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self {
            catalog,
            max_concurrency: 8,
        }
    }

    /// Limits concurrently resolving event specs.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Resolves one template.
    ///
    /// The result is regenerated from scratch, so resolving a resolved spec
    /// yields the same fields and filter.
    pub async fn resolve_event(
        &self,
        table: &TypeTable,
        template: &EventSpec,
        condition_handling: Option<&ConditionHandlingOptions>,
        cancel: &CancellationToken,
    ) -> OpcUaResult<EventSpec> {
        let type_text = match template.type_definition_id.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Ok(template.clone()),
        };
        let type_id: NodeId = type_text.parse()?;

        let chain = table.chain_to(&type_id, &ids::BASE_EVENT_TYPE, cancel).await?;
        let is_condition = chain.iter().any(|node| node.node_id == ids::CONDITION_TYPE);

        // (path, declaring type), first declaration wins.
        let mut fields: Vec<(Vec<QualifiedName>, NodeId)> = Vec::new();
        for type_node in &chain {
            for path in collect_fields(table, type_node, cancel).await? {
                if !fields.iter().any(|(existing, _)| existing == &path) {
                    fields.push((path, type_node.node_id.clone()));
                }
            }
        }
        fields.sort_by_cached_key(|(path, _)| joined(path, "|"));

        let mut select_clauses = Vec::with_capacity(fields.len() + 1);
        if is_condition {
            select_clauses.push(SelectedField {
                type_definition_id: Some(ids::CONDITION_TYPE.to_string()),
                browse_path: Some(Vec::new()),
                attribute_id: Some(NodeAttribute::NodeId),
                display_name: Some(CONDITION_ID_FIELD.to_string()),
                ..Default::default()
            });
        }
        for (path, declaring) in fields {
            select_clauses.push(SelectedField {
                type_definition_id: Some(declaring.to_string()),
                display_name: Some(joined(&path, "/")),
                browse_path: Some(path.iter().map(ToString::to_string).collect()),
                attribute_id: Some(NodeAttribute::Value),
                ..Default::default()
            });
        }

        let condition_handling = condition_handling
            .filter(|options| is_condition && !options.is_disabled())
            .cloned();

        Ok(EventSpec {
            type_definition_id: template.type_definition_id.clone(),
            select_clauses: Some(select_clauses),
            where_clause: Some(ContentFilter::of_type(type_id.to_string())),
            condition_handling,
        })
    }

    /// Resolves every event template in a node list, in place.
    pub async fn resolve_nodes(
        &self,
        nodes: &mut [NodeSpec],
        cancel: &CancellationToken,
    ) -> ResolveReport {
        let mut targets: Vec<&mut NodeSpec> = nodes.iter_mut().collect();
        self.resolve_targets(&mut targets, cancel).await
    }

    /// Resolves every event template in a derived model, in place.
    pub async fn resolve_model(
        &self,
        model: &mut DerivedModel,
        cancel: &CancellationToken,
    ) -> ResolveReport {
        let mut targets: Vec<&mut NodeSpec> = model
            .groups
            .iter_mut()
            .flat_map(|group| group.writers.iter_mut())
            .flat_map(|writer| writer.events_mut())
            .collect();
        self.resolve_targets(&mut targets, cancel).await
    }

    async fn resolve_targets(
        &self,
        targets: &mut [&mut NodeSpec],
        cancel: &CancellationToken,
    ) -> ResolveReport {
        let jobs: Vec<Job> = targets
            .iter()
            .enumerate()
            .filter_map(|(slot, node)| {
                let template = node.event_filter.as_ref()?;
                template
                    .type_definition_id
                    .as_deref()
                    .filter(|id| !id.trim().is_empty())?;
                Some(Job {
                    slot,
                    node: node.identifier().unwrap_or("<unnamed>").to_string(),
                    template: template.clone(),
                    condition_handling: node.condition_handling.clone(),
                })
            })
            .collect();

        if jobs.is_empty() {
            return ResolveReport::default();
        }

        let table = TypeTable::new(Arc::clone(&self.catalog));
        let semaphore = Semaphore::new(self.max_concurrency);

        let results = join_all(jobs.iter().map(|job| {
            let table = &table;
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await.map_err(|_| OpcUaError::Cancelled)?;
                if cancel.is_cancelled() {
                    return Err(OpcUaError::Cancelled);
                }
                self.resolve_event(table, &job.template, job.condition_handling.as_ref(), cancel)
                    .await
            }
        }))
        .await;

        let mut report = ResolveReport::default();
        for (job, result) in jobs.into_iter().zip(results) {
            let type_id = job.template.type_definition_id.clone().unwrap_or_default();
            match result {
                Ok(resolved) => {
                    tracing::debug!(
                        node = %job.node,
                        type_id = %type_id,
                        fields = resolved.fields().len(),
                        "Resolved event fields"
                    );
                    targets[job.slot].event_filter = Some(resolved);
                    report.resolved += 1;
                }
                Err(error) => {
                    error.log("resolve event fields");
                    report.failures.push(ResolveFailure {
                        node: job.node,
                        type_id,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            resolved = report.resolved,
            failed = report.failures.len(),
            fetched = table.len(),
            "Event resolution pass finished"
        );
        report
    }
}

/// Variables declared on a type node, as browse paths relative to it.
///
/// Components are followed into their own declarations; properties are
/// leaves.
async fn collect_fields(
    table: &TypeTable,
    type_node: &Arc<CatalogNode>,
    cancel: &CancellationToken,
) -> OpcUaResult<Vec<Vec<QualifiedName>>> {
    let mut fields = Vec::new();
    let mut pending: Vec<(Arc<CatalogNode>, Vec<QualifiedName>)> =
        vec![(Arc::clone(type_node), Vec::new())];

    while let Some((node, prefix)) = pending.pop() {
        if prefix.len() >= MAX_FIELD_DEPTH {
            continue;
        }

        for target in node.forward(&ids::HAS_COMPONENT) {
            let child = table.fetch(target, cancel).await?;
            if child.node_class == NodeClass::Variable {
                let mut path = prefix.clone();
                path.push(child.browse_name.clone());
                fields.push(path.clone());
                pending.push((child, path));
            }
        }
        for target in node.forward(&ids::HAS_PROPERTY) {
            let child = table.fetch(target, cancel).await?;
            let mut path = prefix.clone();
            path.push(child.browse_name.clone());
            fields.push(path);
        }
    }

    Ok(fields)
}

fn joined(path: &[QualifiedName], separator: &str) -> String {
    path.iter()
        .map(|name| name.name.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticTypeCatalog;
    use edgepub_core::FilterOperator;

    fn resolver() -> FieldResolver {
        FieldResolver::new(Arc::new(StaticTypeCatalog::standard()))
    }

    fn table() -> TypeTable {
        TypeTable::new(Arc::new(StaticTypeCatalog::standard()))
    }

    fn names(spec: &EventSpec) -> Vec<String> {
        spec.fields()
            .iter()
            .map(|f| f.display_name.clone().unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_root_event_type() {
        let cancel = CancellationToken::new();
        let spec = resolver()
            .resolve_event(&table(), &EventSpec::of_type("i=2041"), None, &cancel)
            .await
            .unwrap();

        assert_eq!(spec.fields().len(), 1);
        let message = &spec.fields()[0];
        assert_eq!(message.path(), ["Message".to_string()]);
        assert_eq!(message.type_definition_id.as_deref(), Some("i=2041"));

        let filter = spec.where_clause.unwrap();
        assert_eq!(filter.elements.len(), 1);
        assert_eq!(filter.elements[0].filter_operator, FilterOperator::OfType);
        assert_eq!(
            filter.elements[0].filter_operands[0].value,
            Some(serde_json::Value::String("i=2041".into()))
        );
    }

    #[tokio::test]
    async fn test_condition_type_order() {
        let cancel = CancellationToken::new();
        let spec = resolver()
            .resolve_event(&table(), &EventSpec::of_type("i=2782"), None, &cancel)
            .await
            .unwrap();

        assert_eq!(
            names(&spec),
            vec![
                "ConditionId",
                "Comment",
                "ConditionName",
                "EnabledState",
                "EnabledState/Id",
                "Message"
            ]
        );
        let first = &spec.fields()[0];
        assert_eq!(first.attribute_id, Some(NodeAttribute::NodeId));
        assert!(first.path().is_empty());
        assert_eq!(spec.fields()[4].path(), ["EnabledState".to_string(), "Id".to_string()]);
        assert_eq!(spec.fields()[5].type_definition_id.as_deref(), Some("i=2041"));
    }

    #[tokio::test]
    async fn test_model_change_event_has_no_condition_id() {
        let cancel = CancellationToken::new();
        let spec = resolver()
            .resolve_event(&table(), &EventSpec::of_type("i=2133"), None, &cancel)
            .await
            .unwrap();

        assert_eq!(names(&spec), vec!["Changes", "Message"]);
        assert!(spec
            .fields()
            .iter()
            .all(|f| f.attribute_id == Some(NodeAttribute::Value)));
        assert_eq!(spec.fields()[0].type_definition_id.as_deref(), Some("i=2133"));
        assert_eq!(spec.fields()[1].type_definition_id.as_deref(), Some("i=2041"));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let cancel = CancellationToken::new();
        let resolver = resolver();
        let once = resolver
            .resolve_event(&table(), &EventSpec::of_type("i=2782"), None, &cancel)
            .await
            .unwrap();
        let twice = resolver
            .resolve_event(&table(), &once, None, &cancel)
            .await
            .unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_condition_handling_retained_for_conditions_only() {
        let cancel = CancellationToken::new();
        let options = ConditionHandlingOptions {
            update_interval: Some(10),
            snapshot_interval: Some(30),
        };

        let condition = resolver()
            .resolve_event(&table(), &EventSpec::of_type("i=2782"), Some(&options), &cancel)
            .await
            .unwrap();
        assert_eq!(condition.condition_handling, Some(options.clone()));

        let plain = resolver()
            .resolve_event(&table(), &EventSpec::of_type("i=2041"), Some(&options), &cancel)
            .await
            .unwrap();
        assert_eq!(plain.condition_handling, None);
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let cancel = CancellationToken::new();
        let err = resolver()
            .resolve_event(&table(), &EventSpec::of_type("ns=2;i=1"), None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, OpcUaError::TypeNotFound { .. }));

        let err = resolver()
            .resolve_event(&table(), &EventSpec::of_type("garbage"), None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, OpcUaError::InvalidNodeId { .. }));

        let err = resolver()
            .resolve_event(
                &table(),
                &EventSpec::of_type("nsu=http://opcfoundation.org/UA/;i=2782"),
                None,
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OpcUaError::InvalidNodeId { .. }));
    }

    #[tokio::test]
    async fn test_resolve_nodes_isolates_failures() {
        let cancel = CancellationToken::new();
        let mut good = NodeSpec::new("i=2253");
        good.event_filter = Some(EventSpec::of_type("i=2782"));
        let mut bad = NodeSpec::new("i=2254");
        bad.event_filter = Some(EventSpec::of_type("ns=9;i=404"));
        let variable = NodeSpec::new("ns=2;s=Temp");
        let mut nodes = vec![good, bad, variable];

        let report = resolver().resolve_nodes(&mut nodes, &cancel).await;

        assert_eq!(report.resolved, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].node, "i=2254");
        assert_eq!(nodes[0].event_filter.as_ref().unwrap().fields().len(), 6);
        assert!(!nodes[1].event_filter.as_ref().unwrap().is_resolved());
        assert!(nodes[2].event_filter.is_none());
    }

    #[tokio::test]
    async fn test_resolve_nodes_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut node = NodeSpec::new("i=2253");
        node.event_filter = Some(EventSpec::of_type("i=2041"));
        let mut nodes = vec![node];

        let report = resolver().resolve_nodes(&mut nodes, &cancel).await;
        assert_eq!(report.resolved, 0);
        assert!(matches!(report.failures[0].error, OpcUaError::Cancelled));
        assert!(!nodes[0].event_filter.as_ref().unwrap().is_resolved());
    }
}
