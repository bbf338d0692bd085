// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Downstream consumer of the derived writer group model.
//!
//! The engine hands every committed model to exactly one sink chosen at
//! construction. Transports, batching and message encoding live behind this
//! trait.

use async_trait::async_trait;

use crate::error::PublisherResult;
use crate::writer_group::{DerivedModel, ModelChange};

/// Receives the live writer group model after each commit.
#[async_trait]
pub trait WriterGroupSink: Send + Sync {
    /// Applies a committed model.
    ///
    /// `changes` lists what differs from the model previously applied.
    async fn apply(&self, model: &DerivedModel, changes: &[ModelChange]) -> PublisherResult<()>;

    /// Sink name for logs.
    fn name(&self) -> &str {
        "sink"
    }
}

/// A sink that discards every model.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl WriterGroupSink for NullSink {
    async fn apply(&self, _model: &DerivedModel, _changes: &[ModelChange]) -> PublisherResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// A sink that logs every change and the resulting totals.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait]
impl WriterGroupSink for LoggingSink {
    async fn apply(&self, model: &DerivedModel, changes: &[ModelChange]) -> PublisherResult<()> {
        for change in changes {
            tracing::info!(change = %change, "Writer group model changed");
        }
        tracing::info!(
            groups = model.groups.len(),
            writers = model.writer_count(),
            nodes = model.node_count(),
            changes = changes.len(),
            "Writer groups applied"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "logging"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeSpec, PublishEntry};

    #[tokio::test]
    async fn test_builtin_sinks_accept_models() {
        let empty = DerivedModel::default();
        let model = DerivedModel::expand(&[
            PublishEntry::new("opc.tcp://a:4840").with_nodes(vec![NodeSpec::new("i=1")])
        ]);
        let changes = empty.diff(&model);
        assert!(!changes.is_empty());

        NullSink.apply(&model, &changes).await.unwrap();
        LoggingSink.apply(&model, &changes).await.unwrap();
        assert_eq!(LoggingSink.name(), "logging");
    }
}
