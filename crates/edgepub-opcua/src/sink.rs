// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! A sink decorator that resolves event fields before forwarding.
//!
//! The engine stores templates as authored. `ResolvingSink` resolves every
//! event template on a copy of the committed model and hands the copy to
//! the wrapped sink, so failed resolutions never touch persisted state.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use edgepub_core::{DerivedModel, ModelChange, PublisherResult, WriterGroupSink};

use crate::resolver::FieldResolver;

/// Resolves event templates, then delegates.
pub struct ResolvingSink {
    resolver: FieldResolver,
    inner: Arc<dyn WriterGroupSink>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ResolvingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvingSink")
            .field("resolver", &self.resolver)
            .field("inner", &self.inner.name())
            .finish()
    }
}

impl ResolvingSink {
    /// Wraps a sink.
    pub fn new(resolver: FieldResolver, inner: Arc<dyn WriterGroupSink>) -> Self {
        Self {
            resolver,
            inner,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses a token that cancels in-flight resolutions on shutdown.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[async_trait]
impl WriterGroupSink for ResolvingSink {
    async fn apply(&self, model: &DerivedModel, changes: &[ModelChange]) -> PublisherResult<()> {
        let mut resolved = model.clone();
        let report = self.resolver.resolve_model(&mut resolved, &self.cancel).await;
        for failure in &report.failures {
            tracing::warn!(
                node = %failure.node,
                type_id = %failure.type_id,
                error = %failure.error,
                "Event template forwarded unresolved"
            );
        }
        self.inner.apply(&resolved, changes).await
    }

    fn name(&self) -> &str {
        "resolving"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticTypeCatalog;
    use edgepub_core::{EventSpec, NodeSpec, PublishEntry};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Capture {
        models: Mutex<Vec<DerivedModel>>,
    }

    #[async_trait]
    impl WriterGroupSink for Capture {
        async fn apply(&self, model: &DerivedModel, _changes: &[ModelChange]) -> PublisherResult<()> {
            self.models.lock().push(model.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_forwards_resolved_copy() {
        let capture = Arc::new(Capture::default());
        let sink = ResolvingSink::new(
            FieldResolver::new(Arc::new(StaticTypeCatalog::standard())),
            capture.clone(),
        );

        let mut node = NodeSpec::new("i=2253");
        node.event_filter = Some(EventSpec::of_type("i=2041"));
        let model = DerivedModel::expand(&[PublishEntry::new("opc.tcp://a:4840").with_nodes(vec![node])]);

        sink.apply(&model, &[]).await.unwrap();

        let (_, original) = model.writers().next().unwrap();
        assert!(!original.nodes[0].event_filter.as_ref().unwrap().is_resolved());

        let models = capture.models.lock();
        let (_, forwarded) = models[0].writers().next().unwrap();
        assert_eq!(forwarded.nodes[0].event_filter.as_ref().unwrap().fields().len(), 1);
    }
}
