// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Engine Integration Tests
//!
//! Integration tests for the publisher engine including:
//!
//! - Publish and unpublish flows
//! - Writer group derivation across publishing intervals
//! - Sink notification
//! - Rollback on persistence failure
//! - Concurrent mutations
//!
//! ## Test Categories
//!
//! - `test_engine_*`: Mutation and query tests
//! - `test_model_*`: Derived model tests
//! - `test_sink_*`: Sink notification tests
//! - `test_rollback_*`: Persistence failure tests

use std::sync::Arc;

use edgepub_core::{
    ErrorKind, MemoryEntryStore, ModelChange, PublishEntry, PublisherEngine, ReloadOutcome,
    DEFAULT_WRITER_NAME,
};

use edgepub_tests::common::{
    assert_error_kind, init_test_logging, EntryBuilder, EntryFixtures, FlakyStore,
    ModelAssertions, RecordingSink, MIXER_ENDPOINT, PLC_ENDPOINT,
};

// =============================================================================
// Test Helpers
// =============================================================================

async fn engine_with_sink() -> (PublisherEngine, MemoryEntryStore, Arc<RecordingSink>) {
    init_test_logging();
    let store = MemoryEntryStore::new();
    let sink = Arc::new(RecordingSink::new());
    let engine = PublisherEngine::open(Arc::new(store.clone()), sink.clone())
        .await
        .expect("Failed to open engine");
    (engine, store, sink)
}

fn identifiers(entry: &PublishEntry) -> Vec<String> {
    entry
        .nodes()
        .iter()
        .filter_map(|n| n.identifier())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Publish / Unpublish Tests
// =============================================================================

#[tokio::test]
async fn test_engine_publish_then_query() {
    let (engine, store, _) = engine_with_sink().await;

    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    let endpoints = engine.get_configured_endpoints(false);
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].endpoint(), PLC_ENDPOINT);
    assert!(endpoints[0].has_no_nodes());

    let with_nodes = engine.get_configured_endpoints(true);
    assert_eq!(
        identifiers(&with_nodes[0]),
        vec!["ns=2;s=Line1.Temp", "ns=2;s=Line2.Temp"]
    );
    assert_eq!(store.entries().len(), 1);
}

#[tokio::test]
async fn test_engine_publish_is_idempotent() {
    let (engine, store, _) = engine_with_sink().await;

    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    let nodes = engine
        .get_configured_nodes_on_endpoint(Some(EntryFixtures::temperatures()))
        .unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(store.entries().len(), 1);
}

#[tokio::test]
async fn test_engine_distinct_writers_stay_separate() {
    let (engine, _, _) = engine_with_sink().await;

    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    let other = EntryBuilder::new(PLC_ENDPOINT)
        .group("plant")
        .writer("pressures")
        .node("ns=2;s=Line1.Pressure")
        .build();
    engine.publish_nodes(Some(other)).await.unwrap();

    assert_eq!(engine.get_configured_endpoints(false).len(), 2);
    engine.writer_groups().assert_shape(1, 2, 3);
}

#[tokio::test]
async fn test_engine_unpublish_partial_and_last() {
    let (engine, store, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    let first = EntryBuilder::new(PLC_ENDPOINT)
        .group("plant")
        .writer("temperatures")
        .node("ns=2;s=Line1.Temp")
        .build();
    engine.unpublish_nodes(Some(first)).await.unwrap();
    let remaining = engine.get_configured_endpoints(true);
    assert_eq!(identifiers(&remaining[0]), vec!["ns=2;s=Line2.Temp"]);

    let second = EntryBuilder::new(PLC_ENDPOINT)
        .group("plant")
        .writer("temperatures")
        .node("ns=2;s=Line2.Temp")
        .build();
    engine.unpublish_nodes(Some(second)).await.unwrap();
    assert!(engine.get_configured_endpoints(true).is_empty());
    assert!(store.entries().is_empty());
}

#[tokio::test]
async fn test_engine_unpublish_missing_node_changes_nothing() {
    let (engine, store, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    let saves = store.save_count();

    let request = EntryBuilder::new(PLC_ENDPOINT)
        .group("plant")
        .writer("temperatures")
        .node("ns=2;s=Line1.Temp")
        .node("ns=2;s=Unknown")
        .build();
    let message = assert_error_kind(
        engine.unpublish_nodes(Some(request)).await,
        ErrorKind::ResourceNotFound,
    );
    assert!(message.contains("ns=2;s=Unknown"));
    assert_eq!(engine.status().nodes, 2);
    assert_eq!(store.save_count(), saves);
}

#[tokio::test]
async fn test_engine_unpublish_unknown_endpoint() {
    let (engine, _, _) = engine_with_sink().await;
    let request = EntryBuilder::new(MIXER_ENDPOINT).node("i=2258").build();
    assert_error_kind(
        engine.unpublish_nodes(Some(request)).await,
        ErrorKind::ResourceNotFound,
    );
}

#[tokio::test]
async fn test_engine_unpublish_all() {
    let (engine, _, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    engine
        .publish_nodes(Some(EntryFixtures::mixer_events()))
        .await
        .unwrap();

    let mixer = EntryBuilder::new(MIXER_ENDPOINT).writer("events").build();
    engine.unpublish_all_nodes(Some(mixer)).await.unwrap();
    let remaining = engine.get_configured_endpoints(false);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].endpoint(), PLC_ENDPOINT);

    engine.unpublish_all_nodes(None).await.unwrap();
    assert!(engine.get_configured_endpoints(false).is_empty());
}

#[tokio::test]
async fn test_engine_unpublish_all_rejects_nodes() {
    let (engine, _, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    assert_error_kind(
        engine
            .unpublish_all_nodes(Some(EntryFixtures::temperatures()))
            .await,
        ErrorKind::BadRequest,
    );
    assert_eq!(engine.status().entries, 1);
}

#[tokio::test]
async fn test_engine_add_or_update_replaces_and_deletes() {
    let (engine, _, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    engine
        .publish_nodes(Some(EntryFixtures::mixer_events()))
        .await
        .unwrap();

    let replace = EntryBuilder::new(PLC_ENDPOINT)
        .group("plant")
        .writer("temperatures")
        .node("ns=2;s=Line3.Temp")
        .build();
    let delete = EntryBuilder::new(MIXER_ENDPOINT).writer("events").build();
    engine
        .add_or_update_endpoints(Some(vec![replace, delete]))
        .await
        .unwrap();

    let endpoints = engine.get_configured_endpoints(true);
    assert_eq!(endpoints.len(), 1);
    assert_eq!(identifiers(&endpoints[0]), vec!["ns=2;s=Line3.Temp"]);
}

#[tokio::test]
async fn test_engine_add_or_update_rejects_duplicates() {
    let (engine, store, _) = engine_with_sink().await;

    let a = EntryBuilder::new(PLC_ENDPOINT).writer("w").node("A").build();
    let other = EntryBuilder::new(MIXER_ENDPOINT).writer("w").node("X").build();
    let b = EntryBuilder::new(PLC_ENDPOINT).writer("w").node("B").build();
    let message = assert_error_kind(
        engine.add_or_update_endpoints(Some(vec![a, other, b])).await,
        ErrorKind::BadRequest,
    );
    assert!(message.contains("index 0 and 2"), "{}", message);
    assert_eq!(store.save_count(), 0);
    assert_eq!(engine.status().writers, 0);
}

#[tokio::test]
async fn test_engine_add_or_update_is_all_or_nothing() {
    let (engine, _, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    let replace = EntryBuilder::new(PLC_ENDPOINT)
        .group("plant")
        .writer("temperatures")
        .node("ns=2;s=Other")
        .build();
    let delete_unknown = EntryBuilder::new(MIXER_ENDPOINT).writer("ghost").build();
    assert_error_kind(
        engine
            .add_or_update_endpoints(Some(vec![replace, delete_unknown]))
            .await,
        ErrorKind::ResourceNotFound,
    );

    let endpoints = engine.get_configured_endpoints(true);
    assert_eq!(
        identifiers(&endpoints[0]),
        vec!["ns=2;s=Line1.Temp", "ns=2;s=Line2.Temp"]
    );
}

#[tokio::test]
async fn test_engine_set_configured_endpoints_collapses() {
    let (engine, _, _) = engine_with_sink().await;

    let a = EntryBuilder::new(PLC_ENDPOINT).writer("w").node("A").build();
    let b = EntryBuilder::new(PLC_ENDPOINT).writer("w").node("B").node("A").build();
    engine.set_configured_endpoints(vec![a, b]).await.unwrap();

    let endpoints = engine.get_configured_endpoints(true);
    assert_eq!(endpoints.len(), 1);
    assert_eq!(identifiers(&endpoints[0]), vec!["A", "B"]);
}

// =============================================================================
// Derived Model Tests
// =============================================================================

#[tokio::test]
async fn test_model_splits_by_interval() {
    let (engine, _, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::mixed_intervals()))
        .await
        .unwrap();

    let model = engine.writer_groups();
    model.assert_shape(1, 2, 3);

    let mut sizes: Vec<usize> = model
        .writers()
        .map(|(_, w)| {
            assert!(w.id.starts_with("mixed_("), "unexpected writer id {}", w.id);
            w.nodes.len()
        })
        .collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![1, 2]);

    // Persisted form is still one dataset.
    assert_eq!(engine.get_configured_endpoints(false).len(), 1);
}

#[tokio::test]
async fn test_model_single_interval_keeps_writer_id() {
    let (engine, _, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    let model = engine.writer_groups();
    assert_eq!(model.assert_writer("temperatures"), 2);
    assert_eq!(model.groups[0].id.as_deref(), Some("plant"));
}

#[tokio::test]
async fn test_model_split_without_writer_id_uses_default_name() {
    let (engine, _, _) = engine_with_sink().await;
    let entry = EntryBuilder::new(PLC_ENDPOINT)
        .node_every_ms("A", 1000)
        .node_every_ms("B", 2000)
        .build();
    engine.publish_nodes(Some(entry)).await.unwrap();

    let model = engine.writer_groups();
    model.assert_shape(1, 2, 2);
    assert!(model
        .writers()
        .all(|(_, w)| w.id.starts_with(&format!("{}_(", DEFAULT_WRITER_NAME))));
}

#[tokio::test]
async fn test_model_status_counts() {
    let (engine, _, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::mixed_intervals()))
        .await
        .unwrap();
    engine
        .publish_nodes(Some(EntryFixtures::mixer_events()))
        .await
        .unwrap();

    let status = engine.status();
    assert_eq!(status.entries, 2);
    assert_eq!(status.writers, 3);
    assert_eq!(status.nodes, 4);
    assert!(status.persisted_at.is_some());
}

// =============================================================================
// Sink Tests
// =============================================================================

#[tokio::test]
async fn test_sink_receives_changes() {
    let (engine, _, sink) = engine_with_sink().await;
    let opened = sink.apply_count();

    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    assert_eq!(sink.apply_count(), opened + 1);
    let changes = sink.last_changes();
    assert!(changes
        .iter()
        .any(|c| matches!(c, ModelChange::GroupCreated { .. })));
    assert!(changes
        .iter()
        .any(|c| matches!(c, ModelChange::WriterCreated { .. })));

    let more = EntryBuilder::new(PLC_ENDPOINT)
        .group("plant")
        .writer("temperatures")
        .node("ns=2;s=Line3.Temp")
        .build();
    engine.publish_nodes(Some(more)).await.unwrap();
    assert!(sink
        .last_changes()
        .iter()
        .any(|c| matches!(c, ModelChange::WriterUpdated { .. })));

    engine.unpublish_all_nodes(None).await.unwrap();
    let changes = sink.last_changes();
    assert!(changes
        .iter()
        .any(|c| matches!(c, ModelChange::WriterRemoved { .. })));
    assert!(changes
        .iter()
        .any(|c| matches!(c, ModelChange::GroupRemoved { .. })));
    assert_eq!(sink.last_model().map(|m| m.writer_count()), Some(0));
}

#[tokio::test]
async fn test_sink_failure_does_not_fail_mutation() {
    let (engine, store, sink) = engine_with_sink().await;
    sink.set_fail(true);

    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    assert_eq!(store.entries().len(), 1);
    assert_eq!(engine.status().writers, 1);
}

// =============================================================================
// Rollback Tests
// =============================================================================

#[tokio::test]
async fn test_rollback_on_save_failure() {
    init_test_logging();
    let store = FlakyStore::new();
    let sink = Arc::new(RecordingSink::new());
    let engine = PublisherEngine::open(Arc::new(store.clone()), sink.clone())
        .await
        .unwrap();

    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    let applies = sink.apply_count();

    store.fail_next(1);
    assert_error_kind(
        engine
            .publish_nodes(Some(EntryFixtures::mixer_events()))
            .await,
        ErrorKind::Io,
    );

    assert_eq!(engine.get_configured_endpoints(false).len(), 1);
    assert_eq!(store.entries().len(), 1);
    assert_eq!(sink.apply_count(), applies);

    engine
        .publish_nodes(Some(EntryFixtures::mixer_events()))
        .await
        .unwrap();
    assert_eq!(engine.get_configured_endpoints(false).len(), 2);
    assert_eq!(store.attempts(), 3);
}

#[tokio::test]
async fn test_rollback_reload_replaces_state() {
    let (engine, store, _) = engine_with_sink().await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    store.replace(vec![EntryFixtures::mixer_events()]);
    let outcome = engine.reload().await.unwrap();
    assert_eq!(
        outcome,
        ReloadOutcome::Reloaded {
            entries: 1,
            skipped: 0
        }
    );
    assert_eq!(
        engine.get_configured_endpoints(false)[0].endpoint(),
        MIXER_ENDPOINT
    );
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_engine_concurrent_publishes() {
    let (engine, store, _) = engine_with_sink().await;
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let entry = EntryBuilder::new(PLC_ENDPOINT)
                    .writer("bulk")
                    .node(&format!("ns=2;s=Tag{}", i))
                    .build();
                engine.publish_nodes(Some(entry)).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let endpoints = engine.get_configured_endpoints(true);
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].nodes().len(), 16);
    assert_eq!(store.save_count(), 16);
}
