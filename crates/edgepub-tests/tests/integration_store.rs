// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Store Integration Tests
//!
//! Integration tests for the file-backed entry store including:
//!
//! - Persistence across engine restarts
//! - Fingerprint based reload skipping
//! - Detection of external edits
//! - Tolerance of malformed entries
//! - Settings driven store construction
//!
//! ## Test Categories
//!
//! - `test_file_store_*`: Engine over the file store
//! - `test_settings_*`: Settings loader tests

use std::sync::Arc;

use edgepub_config::{ConfigError, FileEntryStore, SettingsLoader};
use edgepub_core::{EntryStore, ErrorKind, PublisherEngine, PublisherError, ReloadOutcome};

use edgepub_tests::common::{
    init_test_logging, temp_test_dir, EntryFixtures, RecordingSink, MIXER_ENDPOINT, PLC_ENDPOINT,
};

// =============================================================================
// Test Helpers
// =============================================================================

async fn open(store: &Arc<FileEntryStore>) -> PublisherEngine {
    PublisherEngine::open(store.clone(), Arc::new(RecordingSink::new()))
        .await
        .expect("Failed to open engine")
}

// =============================================================================
// File Store Tests
// =============================================================================

#[tokio::test]
async fn test_file_store_persists_across_restarts() {
    init_test_logging();
    let dir = temp_test_dir("edgepub-store");
    let store = Arc::new(FileEntryStore::new(dir.path().join("publishednodes.json")));

    let engine = open(&store).await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    engine
        .publish_nodes(Some(EntryFixtures::mixed_intervals()))
        .await
        .unwrap();
    let before = engine.writer_groups();
    drop(engine);

    let reopened = open(&store).await;
    assert_eq!(reopened.get_configured_endpoints(true).len(), 2);
    assert_eq!(reopened.writer_groups(), before);
}

#[tokio::test]
async fn test_file_store_skips_unchanged_reload() {
    init_test_logging();
    let dir = temp_test_dir("edgepub-store");
    let store = Arc::new(FileEntryStore::new(dir.path().join("publishednodes.json")));

    let engine = open(&store).await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    assert_eq!(engine.reload().await.unwrap(), ReloadOutcome::Unchanged);
    assert!(engine.status().fingerprint.is_some());
}

#[tokio::test]
async fn test_file_store_detects_external_edit() {
    init_test_logging();
    let dir = temp_test_dir("edgepub-store");
    let path = dir.path().join("publishednodes.json");
    let store = Arc::new(FileEntryStore::new(&path));

    let engine = open(&store).await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    let edited = format!(
        r#"[{{"EndpointUrl": "{}", "OpcNodes": [{{"Id": "i=2258"}}]}}]"#,
        MIXER_ENDPOINT
    );
    std::fs::write(&path, edited).unwrap();

    assert_eq!(
        engine.reload().await.unwrap(),
        ReloadOutcome::Reloaded {
            entries: 1,
            skipped: 0
        }
    );
    let endpoints = engine.get_configured_endpoints(false);
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].endpoint(), MIXER_ENDPOINT);
}

#[tokio::test]
async fn test_file_store_tolerates_malformed_entries() {
    init_test_logging();
    let dir = temp_test_dir("edgepub-store");
    let path = dir.path().join("publishednodes.json");
    let content = format!(
        r#"[
            {{"EndpointUrl": "{plc}", "OpcNodes": [{{"Id": "ns=2;s=A"}}]}},
            {{"EndpointUrl": 42}},
            {{"EndpointUrl": "{plc}", "DataSetPublishingIntervalTimespan": "999999999999999.00:00:00", "OpcNodes": [{{"Id": "ns=2;s=D"}}]}},
            {{"EndpointUrl": "{plc}", "NodeId": {{"Identifier": "ns=2;s=B"}}, "OpcNodes": [{{"Id": "ns=2;s=C"}}]}},
            {{"EndpointUrl": "{mixer}", "NodeId": {{"Identifier": "ns=2;s=Legacy"}}}}
        ]"#,
        plc = PLC_ENDPOINT,
        mixer = MIXER_ENDPOINT
    );
    std::fs::write(&path, content).unwrap();

    let store = Arc::new(FileEntryStore::new(&path));
    let engine = PublisherEngine::new(store.clone());
    let outcome = engine.reload().await.unwrap();

    assert_eq!(
        outcome,
        ReloadOutcome::Reloaded {
            entries: 2,
            skipped: 3
        }
    );
    assert_eq!(store.last_skipped(), 2);

    let legacy = engine
        .get_configured_endpoints(true)
        .into_iter()
        .find(|e| e.endpoint() == MIXER_ENDPOINT)
        .unwrap();
    assert_eq!(legacy.nodes()[0].identifier(), Some("ns=2;s=Legacy"));
}

#[tokio::test]
async fn test_file_store_rejects_non_array() {
    init_test_logging();
    let dir = temp_test_dir("edgepub-store");
    let path = dir.path().join("publishednodes.json");
    std::fs::write(&path, r#"{"EndpointUrl": "opc.tcp://x:4840"}"#).unwrap();

    let store = FileEntryStore::new(&path);
    let err: PublisherError = store.load_entries().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    std::fs::write(&path, "not json").unwrap();
    let engine = PublisherEngine::new(Arc::new(store));
    assert!(engine.reload().await.is_err());
    assert_eq!(engine.status().entries, 0);
}

#[tokio::test]
async fn test_file_store_failed_save_keeps_file() {
    init_test_logging();
    let dir = temp_test_dir("edgepub-store");
    let path = dir.path().join("publishednodes.json");
    let store = Arc::new(FileEntryStore::new(&path));

    let engine = open(&store).await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();
    let saved = std::fs::read_to_string(&path).unwrap();

    // A directory at the temp path makes the write fail.
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    std::fs::create_dir(&temp).unwrap();

    let err = engine
        .publish_nodes(Some(EntryFixtures::mixer_events()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), saved);
    assert_eq!(engine.get_configured_endpoints(false).len(), 1);
}

// =============================================================================
// Settings Tests
// =============================================================================

#[tokio::test]
async fn test_settings_drive_store() {
    init_test_logging();
    let dir = temp_test_dir("edgepub-settings");
    let settings_path = dir.path().join("edgepub.yaml");
    std::fs::write(
        &settings_path,
        "publisher:\n  id: line-7\nstorage:\n  published_nodes_file: data/nodes.json\n  pretty: false\n",
    )
    .unwrap();

    let settings = SettingsLoader::new()
        .with_env_prefix("EDGEPUB_IT_STORE")
        .load(&settings_path)
        .unwrap();
    assert_eq!(
        settings.storage.published_nodes_file,
        dir.path().join("data").join("nodes.json")
    );

    let store = Arc::new(FileEntryStore::from_settings(&settings.storage));
    let engine = open(&store).await;
    engine
        .publish_nodes(Some(EntryFixtures::temperatures()))
        .await
        .unwrap();

    let written = std::fs::read_to_string(dir.path().join("data").join("nodes.json")).unwrap();
    assert!(!written.contains('\n'));
    assert!(written.contains(PLC_ENDPOINT));
}

#[tokio::test]
async fn test_settings_missing_file() {
    let dir = temp_test_dir("edgepub-settings");
    let err = SettingsLoader::new()
        .with_env_prefix("EDGEPUB_IT_MISSING")
        .load(dir.path().join("absent.yaml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));

    let publisher: PublisherError = err.into();
    assert_eq!(publisher.kind(), ErrorKind::Io);
}
