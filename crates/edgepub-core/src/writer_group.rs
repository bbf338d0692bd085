// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Derived writer group model.
//!
//! The flat entry list is expanded into writer groups keyed by
//! [`group_key`], each owning dataset writers keyed by [`writer_key`]. An
//! entry whose nodes use several publishing intervals yields one writer per
//! interval. The derived model is never persisted; it is rebuilt from the
//! entries whenever they change and compared against the previous model to
//! produce a change set for the sink.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::duration::canonical;
use crate::equality::{contains_node, node_set_equals};
use crate::identity::{group_key, writer_key, DataSetWriterKey, WriterGroupKey};
use crate::model::{
    MessageEncoding, MessagingMode, NodeSpec, PublishEntry, QualityOfService, WriterGroupTransport,
};

/// Writer id used when an entry does not name its writer.
pub const DEFAULT_WRITER_NAME: &str = "<default>";

// =============================================================================
// WriterGroup
// =============================================================================

/// Transport level settings shared by all writers of a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriterGroupSettings {
    /// Transport.
    pub transport: WriterGroupTransport,
    /// Quality of service.
    pub quality_of_service: QualityOfService,
    /// Queue name.
    pub queue_name: Option<String>,
    /// Message encoding.
    pub encoding: MessageEncoding,
    /// Messaging mode.
    pub messaging_mode: MessagingMode,
    /// Notifications per batch.
    pub batch_size: Option<u32>,
    /// Batch trigger interval.
    pub batch_trigger_interval: Option<Duration>,
    /// Partition count.
    pub partitions: Option<u32>,
}

impl WriterGroupSettings {
    fn from_entry(entry: &PublishEntry) -> Self {
        Self {
            transport: entry.writer_group_transport.unwrap_or_default(),
            quality_of_service: entry.writer_group_quality_of_service.unwrap_or_default(),
            queue_name: entry.writer_group_queue_name.clone().filter(|s| !s.is_empty()),
            encoding: entry.message_encoding.unwrap_or_default(),
            messaging_mode: entry.messaging_mode.unwrap_or_default(),
            batch_size: entry.batch_size,
            batch_trigger_interval: entry.batch_trigger_interval(),
            partitions: entry.writer_group_partitions,
        }
    }
}

/// A named bundle of dataset writers sharing transport settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriterGroup {
    /// Content-addressed identity.
    pub key: WriterGroupKey,
    /// User supplied group id.
    pub id: Option<String>,
    /// Transport settings.
    pub settings: WriterGroupSettings,
    /// Writers in first-seen order.
    pub writers: Vec<DataSetWriter>,
}

impl WriterGroup {
    /// Finds a writer by key.
    pub fn writer(&self, key: &DataSetWriterKey) -> Option<&DataSetWriter> {
        self.writers.iter().find(|w| &w.key == key)
    }

    /// Total number of nodes across writers.
    pub fn node_count(&self) -> usize {
        self.writers.iter().map(|w| w.nodes.len()).sum()
    }
}

// =============================================================================
// DataSetWriter
// =============================================================================

/// Publishes a fixed set of nodes and events from one endpoint at one cadence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSetWriter {
    /// Content-addressed identity.
    pub key: DataSetWriterKey,
    /// Writer id, unique within its group.
    pub id: String,
    /// Effective publishing interval.
    pub publishing_interval: Option<Duration>,
    /// Dataset settings (the source entry without nodes).
    pub settings: PublishEntry,
    /// Published nodes, unique by semantic equality.
    pub nodes: Vec<NodeSpec>,
}

impl DataSetWriter {
    /// Nodes publishing variable values.
    pub fn variables(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.iter().filter(|n| !n.is_event())
    }

    /// Nodes subscribing to events.
    pub fn events(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.iter().filter(|n| n.is_event())
    }

    /// Mutable access to event nodes, for field resolution.
    pub fn events_mut(&mut self) -> impl Iterator<Item = &mut NodeSpec> {
        self.nodes.iter_mut().filter(|n| n.is_event())
    }
}

// =============================================================================
// ModelChange
// =============================================================================

/// A change between two derived models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ModelChange {
    /// A group appeared.
    GroupCreated {
        /// Group key.
        group: WriterGroupKey,
    },
    /// A group disappeared with its last writer.
    GroupRemoved {
        /// Group key.
        group: WriterGroupKey,
    },
    /// A writer appeared.
    WriterCreated {
        /// Owning group.
        group: WriterGroupKey,
        /// Writer key.
        writer: DataSetWriterKey,
    },
    /// A writer's node set changed.
    WriterUpdated {
        /// Owning group.
        group: WriterGroupKey,
        /// Writer key.
        writer: DataSetWriterKey,
    },
    /// A writer disappeared.
    WriterRemoved {
        /// Owning group.
        group: WriterGroupKey,
        /// Writer key.
        writer: DataSetWriterKey,
    },
}

impl fmt::Display for ModelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupCreated { group } => write!(f, "group {} created", group.short()),
            Self::GroupRemoved { group } => write!(f, "group {} removed", group.short()),
            Self::WriterCreated { writer, .. } => write!(f, "writer {} created", writer.short()),
            Self::WriterUpdated { writer, .. } => write!(f, "writer {} updated", writer.short()),
            Self::WriterRemoved { writer, .. } => write!(f, "writer {} removed", writer.short()),
        }
    }
}

// =============================================================================
// DerivedModel
// =============================================================================

/// The live writer group tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedModel {
    /// Groups in first-seen order.
    pub groups: Vec<WriterGroup>,
}

impl DerivedModel {
    /// Expands a flat entry list.
    pub fn expand(entries: &[PublishEntry]) -> Self {
        let mut groups: Vec<WriterGroup> = Vec::new();

        for entry in entries {
            let batches = partition_by_interval(entry);
            if batches.is_empty() {
                continue;
            }

            let gk = group_key(entry);
            let group_index = match groups.iter().position(|g| g.key == gk) {
                Some(index) => index,
                None => {
                    groups.push(WriterGroup {
                        key: gk,
                        id: entry.data_set_writer_group.clone().filter(|s| !s.is_empty()),
                        settings: WriterGroupSettings::from_entry(entry),
                        writers: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[group_index];

            let split = batches.len() > 1;
            for (interval, nodes) in batches {
                let wk = writer_key(entry, interval);
                match group.writers.iter_mut().find(|w| w.key == wk) {
                    Some(writer) => {
                        for node in nodes {
                            if !contains_node(&writer.nodes, &node) {
                                writer.nodes.push(node);
                            }
                        }
                    }
                    None => group.writers.push(DataSetWriter {
                        key: wk,
                        id: writer_id(entry, interval, split),
                        publishing_interval: interval,
                        settings: entry.to_metadata(),
                        nodes,
                    }),
                }
            }
        }

        Self { groups }
    }

    /// Finds a group by key.
    pub fn group(&self, key: &WriterGroupKey) -> Option<&WriterGroup> {
        self.groups.iter().find(|g| &g.key == key)
    }

    /// Iterates all writers with their group.
    pub fn writers(&self) -> impl Iterator<Item = (&WriterGroup, &DataSetWriter)> {
        self.groups
            .iter()
            .flat_map(|g| g.writers.iter().map(move |w| (g, w)))
    }

    /// Number of writers.
    pub fn writer_count(&self) -> usize {
        self.groups.iter().map(|g| g.writers.len()).sum()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.groups.iter().map(WriterGroup::node_count).sum()
    }

    /// Computes the changes turning `self` into `next`.
    pub fn diff(&self, next: &DerivedModel) -> Vec<ModelChange> {
        let mut changes = Vec::new();

        let before: HashMap<&DataSetWriterKey, (&WriterGroupKey, &DataSetWriter)> = self
            .writers()
            .map(|(g, w)| (&w.key, (&g.key, w)))
            .collect();
        let after: HashMap<&DataSetWriterKey, (&WriterGroupKey, &DataSetWriter)> = next
            .writers()
            .map(|(g, w)| (&w.key, (&g.key, w)))
            .collect();

        for group in &next.groups {
            if self.group(&group.key).is_none() {
                changes.push(ModelChange::GroupCreated {
                    group: group.key.clone(),
                });
            }
        }

        for (group, writer) in next.writers() {
            match before.get(&writer.key) {
                None => changes.push(ModelChange::WriterCreated {
                    group: group.key.clone(),
                    writer: writer.key.clone(),
                }),
                Some((_, previous)) if !node_set_equals(&previous.nodes, &writer.nodes, true) => {
                    changes.push(ModelChange::WriterUpdated {
                        group: group.key.clone(),
                        writer: writer.key.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        for (group, writer) in self.writers() {
            if !after.contains_key(&writer.key) {
                changes.push(ModelChange::WriterRemoved {
                    group: group.key.clone(),
                    writer: writer.key.clone(),
                });
            }
        }

        for group in &self.groups {
            if next.group(&group.key).is_none() {
                changes.push(ModelChange::GroupRemoved {
                    group: group.key.clone(),
                });
            }
        }

        changes
    }
}

/// Splits an entry's nodes by effective publishing interval, dropping
/// duplicates. Interval order follows first appearance.
fn partition_by_interval(entry: &PublishEntry) -> Vec<(Option<Duration>, Vec<NodeSpec>)> {
    let fallback = entry.publishing_interval();
    let mut batches: Vec<(Option<Duration>, Vec<NodeSpec>)> = Vec::new();

    for node in entry.nodes() {
        let interval = node.publishing_interval().or(fallback);
        let index = match batches.iter().position(|(i, _)| *i == interval) {
            Some(index) => index,
            None => {
                batches.push((interval, Vec::new()));
                batches.len() - 1
            }
        };
        let batch = &mut batches[index].1;
        if !contains_node(batch, node) {
            let mut node = node.clone();
            node.set_publishing_interval(interval);
            batch.push(node);
        }
    }

    batches
}

fn writer_id(entry: &PublishEntry, interval: Option<Duration>, split: bool) -> String {
    let base = entry
        .data_set_writer_id
        .as_deref()
        .filter(|s| !s.is_empty());

    match base {
        Some(id) if !split => id.to_string(),
        _ => {
            let seed = interval.map(canonical).unwrap_or_default();
            let digest = hex::encode(Sha256::digest(seed.as_bytes()));
            format!("{}_({})", base.unwrap_or(DEFAULT_WRITER_NAME), &digest[..16])
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(writer: &str, nodes: &[&str]) -> PublishEntry {
        let mut entry = PublishEntry::new("opc.tcp://plc:4840");
        entry.data_set_writer_id = Some(writer.to_string());
        entry.opc_nodes = Some(nodes.iter().map(|n| NodeSpec::new(*n)).collect());
        entry
    }

    #[test]
    fn test_expand_single_entry() {
        let model = DerivedModel::expand(&[entry("w1", &["A", "B"])]);
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.writer_count(), 1);
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.groups[0].writers[0].id, "w1");
    }

    #[test]
    fn test_expand_shares_group() {
        let model = DerivedModel::expand(&[entry("w1", &["A"]), entry("w2", &["B"])]);
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.writer_count(), 2);
    }

    #[test]
    fn test_expand_splits_by_interval() {
        let mut e = entry("w1", &["A", "B"]);
        if let Some(nodes) = e.opc_nodes.as_mut() {
            nodes[1].opc_publishing_interval = Some(5000);
        }
        let model = DerivedModel::expand(&[e]);
        assert_eq!(model.writer_count(), 2);
        let ids: Vec<&str> = model.writers().map(|(_, w)| w.id.as_str()).collect();
        assert!(ids.iter().all(|id| id.starts_with("w1_(")));
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_expand_default_writer_id() {
        let mut e = entry("", &["A"]);
        e.data_set_writer_id = None;
        let model = DerivedModel::expand(&[e]);
        assert!(model.groups[0].writers[0].id.starts_with(DEFAULT_WRITER_NAME));
    }

    #[test]
    fn test_expand_skips_empty_entries() {
        let model = DerivedModel::expand(&[PublishEntry::new("opc.tcp://plc:4840")]);
        assert!(model.groups.is_empty());
    }

    #[test]
    fn test_expand_deduplicates_nodes() {
        let model = DerivedModel::expand(&[entry("w1", &["A", "A"])]);
        assert_eq!(model.node_count(), 1);
    }

    #[test]
    fn test_writer_keys_unique() {
        let model = DerivedModel::expand(&[
            entry("w1", &["A"]),
            entry("w1", &["B"]),
            entry("w2", &["C"]),
        ]);
        let mut keys: Vec<_> = model.writers().map(|(_, w)| w.key.clone()).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(model.writer_count(), 2);
    }

    #[test]
    fn test_diff() {
        let before = DerivedModel::expand(&[entry("w1", &["A"]), entry("w2", &["B"])]);
        let after = DerivedModel::expand(&[entry("w1", &["A", "C"]), entry("w3", &["D"])]);

        let changes = before.diff(&after);
        assert!(changes.iter().any(|c| matches!(c, ModelChange::WriterUpdated { .. })));
        assert!(changes.iter().any(|c| matches!(c, ModelChange::WriterCreated { .. })));
        assert!(changes.iter().any(|c| matches!(c, ModelChange::WriterRemoved { .. })));
        assert!(!changes.iter().any(|c| matches!(c, ModelChange::GroupCreated { .. })));

        let empty = DerivedModel::default();
        let removal = before.diff(&empty);
        assert!(removal.iter().any(|c| matches!(c, ModelChange::GroupRemoved { .. })));
        assert!(before.diff(&before).is_empty());
    }
}
