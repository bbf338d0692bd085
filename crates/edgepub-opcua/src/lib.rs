// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # edgepub-opcua
//!
//! OPC UA type catalogs and event field resolution for the edgepub
//! publisher.
//!
//! - **Types**: `NodeId`, `QualifiedName`, `NodeClass` and well-known ids
//! - **Catalog**: the `TypeCatalog` seam, a static catalog of standard
//!   event types and a TTL cache
//! - **Table**: per-pass memoized supertype walks
//! - **Resolver**: turns event templates into select and where clauses
//! - **Sink**: resolves a committed model before forwarding it
//!
//! ```text
//! PublisherEngine ──► ResolvingSink ──► FieldResolver ──► TypeTable ──► TypeCatalog
//!                           │
//!                           └──► inner WriterGroupSink (resolved copy)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod resolver;
pub mod sink;
pub mod table;
pub mod types;

pub use catalog::{
    CachedCatalog, CatalogNode, CatalogReference, CatalogStatistics, StaticTypeCatalog,
    TypeCatalog,
};
pub use error::{OpcUaError, OpcUaResult};
pub use resolver::{FieldResolver, ResolveFailure, ResolveReport, CONDITION_ID_FIELD};
pub use sink::ResolvingSink;
pub use table::TypeTable;
pub use types::{ids, NodeClass, NodeId, NodeIdentifier, QualifiedName};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
