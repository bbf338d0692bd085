// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # edgepub-core
//!
//! Configuration model and reconciliation engine for the edgepub OPC UA
//! publisher.
//!
//! - **Model**: `PublishEntry`, `NodeSpec`, `EventSpec` in the published
//!   nodes file format
//! - **Duration**: millisecond / timespan normalization
//! - **Identity**: content-addressed writer group and dataset writer keys
//! - **Equality**: semantic sameness of entries and nodes
//! - **Writer groups**: the derived `WriterGroup → DataSetWriter` model
//! - **Engine**: publish, unpublish, replace, query and reload
//! - **Store / Sink**: persistence and downstream seams
//!
//! ```text
//! requests ──► PublisherEngine ──► EntryStore (flat entries)
//!                    │
//!                    └──► DerivedModel ──► WriterGroupSink
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use edgepub_core::{MemoryEntryStore, NodeSpec, PublishEntry, PublisherEngine};
//!
//! let engine = PublisherEngine::new(Arc::new(MemoryEntryStore::new()));
//! let entry = PublishEntry::new("opc.tcp://plc:4840")
//!     .with_nodes(vec![NodeSpec::new("ns=2;s=Temperature")]);
//! engine.publish_nodes(Some(entry)).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Model Modules
// =============================================================================

pub mod duration;
pub mod error;
pub mod model;

// =============================================================================
// Identity & Equality
// =============================================================================

pub mod equality;
pub mod identity;

// =============================================================================
// Engine Modules
// =============================================================================

pub mod engine;
pub mod sink;
pub mod store;
pub mod writer_group;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{ErrorKind, PublisherError, PublisherResult};
pub use model::*;

pub use engine::{EngineStatus, PublisherEngine, ReloadOutcome};
pub use equality::{same_data_set, same_node, same_writer, same_writer_group};
pub use identity::{group_key, writer_key, DataSetWriterKey, WriterGroupKey};
pub use sink::{LoggingSink, NullSink, WriterGroupSink};
pub use store::{content_fingerprint, EntryStore, MemoryEntryStore};
pub use writer_group::{
    DataSetWriter, DerivedModel, ModelChange, WriterGroup, WriterGroupSettings, DEFAULT_WRITER_NAME,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
