// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Semantic equality of configuration entries and nodes.
//!
//! Two entries may be formatted differently and still denote the same
//! resource: a timespan and the equivalent millisecond count, an empty string
//! and an absent one, an explicit `false` and an omitted flag. Every predicate
//! here compares the normalized form of each field.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::duration::canonical;
use crate::identity::{choice, flag, text};
use crate::model::{
    ConditionHandlingOptions, EventSpec, ModelChangeHandlingOptions, NodeSpec, PublishEntry,
};

// =============================================================================
// Entry Predicates
// =============================================================================

/// Returns `true` if both entries map to the same writer group.
pub fn same_writer_group(a: &PublishEntry, b: &PublishEntry) -> bool {
    text(&a.data_set_writer_group) == text(&b.data_set_writer_group)
        && choice(a.writer_group_transport) == choice(b.writer_group_transport)
        && choice(a.writer_group_quality_of_service) == choice(b.writer_group_quality_of_service)
        && text(&a.writer_group_queue_name) == text(&b.writer_group_queue_name)
        && choice(a.message_encoding) == choice(b.message_encoding)
        && choice(a.messaging_mode) == choice(b.messaging_mode)
        && a.batch_size == b.batch_size
        && a.batch_trigger_interval() == b.batch_trigger_interval()
        && a.writer_group_partitions == b.writer_group_partitions
}

/// Returns `true` if both entries describe the same dataset.
///
/// Node lists and the publishing interval are not compared.
pub fn same_data_set(a: &PublishEntry, b: &PublishEntry) -> bool {
    same_connection(a, b)
        && text(&a.data_set_writer_id) == text(&b.data_set_writer_id)
        && text(&a.data_set_name) == text(&b.data_set_name)
        && a.data_set_class_id.filter(|id| !id.is_nil())
            == b.data_set_class_id.filter(|id| !id.is_nil())
        && a.data_set_key_frame_count == b.data_set_key_frame_count
        && a.priority == b.priority
        && a.meta_data_update_time() == b.meta_data_update_time()
        && text(&a.meta_data_queue_name) == text(&b.meta_data_queue_name)
        && a.sampling_interval() == b.sampling_interval()
        && choice(a.quality_of_service) == choice(b.quality_of_service)
        && text(&a.queue_name) == text(&b.queue_name)
        && choice(a.data_set_routing) == choice(b.data_set_routing)
        && flag(a.send_keep_alive_data_set_messages) == flag(b.send_keep_alive_data_set_messages)
        && flag(a.data_set_fetch_display_names) == flag(b.data_set_fetch_display_names)
        && a.default_heartbeat_interval() == b.default_heartbeat_interval()
        && choice(a.default_heartbeat_behavior) == choice(b.default_heartbeat_behavior)
        && a.opc_node_watchdog_timespan == b.opc_node_watchdog_timespan
        && choice(a.data_set_writer_watchdog_behavior)
            == choice(b.data_set_writer_watchdog_behavior)
        && choice(a.opc_node_watchdog_condition) == choice(b.opc_node_watchdog_condition)
}

/// Returns `true` if both entries address the same dataset of the same group.
pub fn same_writer(a: &PublishEntry, b: &PublishEntry) -> bool {
    same_writer_group(a, b) && same_data_set(a, b)
}

fn same_connection(a: &PublishEntry, b: &PublishEntry) -> bool {
    text(&a.endpoint_url) == text(&b.endpoint_url)
        && flag(a.use_reverse_connect) == flag(b.use_reverse_connect)
        && flag(a.disable_subscription_transfer) == flag(b.disable_subscription_transfer)
        && a.effective_security_mode() == b.effective_security_mode()
        && text(&a.endpoint_security_policy) == text(&b.endpoint_security_policy)
        && a.effective_authentication_mode() == b.effective_authentication_mode()
        && text(&a.opc_authentication_username) == text(&b.opc_authentication_username)
        && text(&a.opc_authentication_password) == text(&b.opc_authentication_password)
}

// =============================================================================
// Node Predicates
// =============================================================================

/// Returns `true` if both nodes denote the same published item.
///
/// Triggered nodes are compared as sets when `include_triggered` is set; the
/// nested comparison never descends further.
pub fn same_node(a: &NodeSpec, b: &NodeSpec, include_triggered: bool) -> bool {
    if a.identifier() != b.identifier()
        || text(&a.display_name) != text(&b.display_name)
        || text(&a.data_set_field_id) != text(&b.data_set_field_id)
        || a.data_set_class_field_id.filter(|id| !id.is_nil())
            != b.data_set_class_field_id.filter(|id| !id.is_nil())
        || text(&a.topic) != text(&b.topic)
        || a.publishing_interval() != b.publishing_interval()
        || a.sampling_interval() != b.sampling_interval()
        || a.heartbeat_interval() != b.heartbeat_interval()
        || choice(a.heartbeat_behavior) != choice(b.heartbeat_behavior)
        || flag(a.skip_first) != flag(b.skip_first)
        || a.queue_size != b.queue_size
        || flag(a.discard_new) != flag(b.discard_new)
        || choice(a.data_change_trigger) != choice(b.data_change_trigger)
        || a.deadband_type != b.deadband_type
        || a.deadband_value.map(f64::to_bits) != b.deadband_value.map(f64::to_bits)
        || choice(a.attribute_id) != choice(b.attribute_id)
        || text(&a.index_range) != text(&b.index_range)
        || a.browse_path.as_deref().unwrap_or(&[]) != b.browse_path.as_deref().unwrap_or(&[])
        || flag(a.use_cyclic_read) != flag(b.use_cyclic_read)
        || flag(a.register_node) != flag(b.register_node)
        || flag(a.fetch_display_name) != flag(b.fetch_display_name)
    {
        return false;
    }

    if !same_event_spec(a.event_filter.as_ref(), b.event_filter.as_ref())
        || !same_condition_handling(a.condition_handling.as_ref(), b.condition_handling.as_ref())
        || !same_model_change_handling(
            a.model_change_handling.as_ref(),
            b.model_change_handling.as_ref(),
        )
    {
        return false;
    }

    if include_triggered {
        return node_set_equals(a.triggered(), b.triggered(), false);
    }
    true
}

/// Compares event templates; a missing template equals the default one.
pub fn same_event_spec(a: Option<&EventSpec>, b: Option<&EventSpec>) -> bool {
    let default = EventSpec::default();
    let a = a.unwrap_or(&default);
    let b = b.unwrap_or(&default);

    text(&a.type_definition_id) == text(&b.type_definition_id)
        && a.fields() == b.fields()
        && a.where_clause.clone().unwrap_or_default() == b.where_clause.clone().unwrap_or_default()
        && same_condition_handling(a.condition_handling.as_ref(), b.condition_handling.as_ref())
}

/// Compares condition handling options; missing equals default.
pub fn same_condition_handling(
    a: Option<&ConditionHandlingOptions>,
    b: Option<&ConditionHandlingOptions>,
) -> bool {
    let a = a.cloned().unwrap_or_default();
    let b = b.cloned().unwrap_or_default();
    a.update_interval == b.update_interval && a.snapshot_interval == b.snapshot_interval
}

/// Compares model change handling options; missing equals default.
pub fn same_model_change_handling(
    a: Option<&ModelChangeHandlingOptions>,
    b: Option<&ModelChangeHandlingOptions>,
) -> bool {
    let a = a.cloned().unwrap_or_default();
    let b = b.cloned().unwrap_or_default();
    a.rebrowse_interval_timespan == b.rebrowse_interval_timespan
}

/// Hash consistent with [`same_node`]: equal nodes hash equally.
pub fn node_hash(node: &NodeSpec) -> u64 {
    let mut hasher = DefaultHasher::new();
    node.identifier().hash(&mut hasher);
    node.publishing_interval().map(canonical).hash(&mut hasher);
    text(&node.data_set_field_id).hash(&mut hasher);
    text(&node.display_name).hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// Node Sets
// =============================================================================

/// A node viewed through [`same_node`] equality, for use in hash sets.
#[derive(Debug, Clone, Copy)]
pub struct NodeKey<'a>(pub &'a NodeSpec);

impl PartialEq for NodeKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        same_node(self.0, other.0, true)
    }
}

impl Eq for NodeKey<'_> {}

impl Hash for NodeKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(node_hash(self.0));
    }
}

/// Returns `true` if both lists contain the same nodes regardless of order.
pub fn node_set_equals(a: &[NodeSpec], b: &[NodeSpec], include_triggered: bool) -> bool {
    if include_triggered {
        let left: HashSet<NodeKey<'_>> = a.iter().map(NodeKey).collect();
        let right: HashSet<NodeKey<'_>> = b.iter().map(NodeKey).collect();
        return left == right;
    }
    a.iter().all(|x| b.iter().any(|y| same_node(x, y, false)))
        && b.iter().all(|y| a.iter().any(|x| same_node(x, y, false)))
}

/// Returns `true` if `nodes` contains a node equal to `node`.
pub fn contains_node(nodes: &[NodeSpec], node: &NodeSpec) -> bool {
    nodes.iter().any(|n| same_node(n, node, true))
}

// =============================================================================
// Tests
// =============================================================================
