// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Domain-specific assertion helpers with informative failure messages.

use edgepub_core::{DerivedModel, ErrorKind, EventSpec, PublisherResult};

// =============================================================================
// Model Assertions
// =============================================================================

/// Assertion extensions for [`DerivedModel`].
pub trait ModelAssertions {
    /// Assert group, writer and node totals.
    fn assert_shape(&self, groups: usize, writers: usize, nodes: usize);

    /// Assert that a writer with the given id exists and return its node count.
    fn assert_writer(&self, id: &str) -> usize;
}

impl ModelAssertions for DerivedModel {
    fn assert_shape(&self, groups: usize, writers: usize, nodes: usize) {
        assert_eq!(
            (self.groups.len(), self.writer_count(), self.node_count()),
            (groups, writers, nodes),
            "Expected (groups, writers, nodes) = ({}, {}, {}), model: {:#?}",
            groups,
            writers,
            nodes,
            self
        );
    }

    fn assert_writer(&self, id: &str) -> usize {
        let writer = self.writers().map(|(_, w)| w).find(|w| w.id == id);
        match writer {
            Some(writer) => writer.nodes.len(),
            None => {
                let ids: Vec<&str> = self.writers().map(|(_, w)| w.id.as_str()).collect();
                panic!("Expected writer '{}', found {:?}", id, ids)
            }
        }
    }
}

// =============================================================================
// Event Assertions
// =============================================================================

/// Assertion extensions for [`EventSpec`].
pub trait EventSpecAssertions {
    /// Assert selected field display names in order.
    fn assert_field_names(&self, expected: &[&str]);
}

impl EventSpecAssertions for EventSpec {
    fn assert_field_names(&self, expected: &[&str]) {
        let names: Vec<&str> = self
            .fields()
            .iter()
            .map(|f| f.display_name.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(names, expected, "Unexpected select clauses");
    }
}

// =============================================================================
// Error Assertions
// =============================================================================

/// Assert that a result failed with the given kind, returning the message.
pub fn assert_error_kind<T: std::fmt::Debug>(result: PublisherResult<T>, kind: ErrorKind) -> String {
    match result {
        Ok(value) => panic!("Expected {:?} error, got Ok({:?})", kind, value),
        Err(e) => {
            assert_eq!(e.kind(), kind, "Unexpected error: {}", e);
            e.to_string()
        }
    }
}
