// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # edgepub Integration Tests
//!
//! Shared test utilities and cross-crate integration suites.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Pre-built entries and catalogs
//!   - `builders`: Fluent construction of publish requests
//!   - `mocks`: Counting catalog, recording sink, flaky store
//!   - `assertions`: Model and error assertion helpers
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p edgepub-tests
//! cargo test -p edgepub-tests --test integration_engine
//! cargo test -p edgepub-tests --test integration_resolver
//! cargo test -p edgepub-tests --test integration_store
//! ```
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use edgepub_tests::common::{EntryBuilder, RecordingSink};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let request = EntryBuilder::new("opc.tcp://plc:4840")
//!         .writer("line-1")
//!         .node_every("ns=2;s=Temp", 1000)
//!         .build();
//!     // ... test logic
//! }
//! ```

pub mod common;
