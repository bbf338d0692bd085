// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Builders
//!
//! Fluent construction of publish requests.

use std::time::Duration;

use edgepub_core::{ConditionHandlingOptions, EventSpec, NodeSpec, PublishEntry};

// =============================================================================
// EntryBuilder
// =============================================================================

/// Builds a [`PublishEntry`].
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    entry: PublishEntry,
    nodes: Vec<NodeSpec>,
}

impl EntryBuilder {
    /// Starts a request for an endpoint.
    pub fn new(endpoint: &str) -> Self {
        Self {
            entry: PublishEntry::new(endpoint),
            nodes: Vec::new(),
        }
    }

    /// Sets the dataset writer id.
    pub fn writer(mut self, id: &str) -> Self {
        self.entry.data_set_writer_id = Some(id.to_string());
        self
    }

    /// Sets the writer group id.
    pub fn group(mut self, id: &str) -> Self {
        self.entry.data_set_writer_group = Some(id.to_string());
        self
    }

    /// Sets the dataset publishing interval in milliseconds.
    pub fn interval_ms(mut self, millis: u32) -> Self {
        self.entry.data_set_publishing_interval = Some(millis);
        self
    }

    /// Sets username credentials.
    pub fn credentials(mut self, user: &str, password: &str) -> Self {
        self.entry.opc_authentication_username = Some(user.to_string());
        self.entry.opc_authentication_password = Some(password.to_string());
        self
    }

    /// Adds a variable node without its own interval.
    pub fn node(mut self, id: &str) -> Self {
        self.nodes.push(NodeSpec::new(id));
        self
    }

    /// Adds a variable node with a publishing interval timespan.
    pub fn node_every(mut self, id: &str, millis: u64) -> Self {
        let mut node = NodeSpec::new(id);
        node.opc_publishing_interval_timespan = Some(Duration::from_millis(millis));
        self.nodes.push(node);
        self
    }

    /// Adds a variable node with an integer publishing interval.
    pub fn node_every_ms(mut self, id: &str, millis: u32) -> Self {
        let mut node = NodeSpec::new(id);
        node.opc_publishing_interval = Some(millis);
        self.nodes.push(node);
        self
    }

    /// Adds an event subscription.
    pub fn event(mut self, id: &str, type_id: &str) -> Self {
        let mut node = NodeSpec::new(id);
        node.event_filter = Some(EventSpec::of_type(type_id));
        self.nodes.push(node);
        self
    }

    /// Adds an event subscription with condition handling.
    pub fn condition(mut self, id: &str, type_id: &str, update_secs: u32) -> Self {
        let mut node = NodeSpec::new(id);
        node.event_filter = Some(EventSpec::of_type(type_id));
        node.condition_handling = Some(ConditionHandlingOptions {
            update_interval: Some(update_secs),
            snapshot_interval: None,
        });
        self.nodes.push(node);
        self
    }

    /// Builds the entry; without nodes the node list is absent.
    pub fn build(self) -> PublishEntry {
        let mut entry = self.entry;
        if !self.nodes.is_empty() {
            entry.opc_nodes = Some(self.nodes);
        }
        entry
    }
}
