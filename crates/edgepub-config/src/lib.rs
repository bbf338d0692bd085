// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # edgepub-config
//!
//! Settings and persistence for the edgepub publisher.
//!
//! - **Schema**: [`PublisherSettings`] with publisher, storage, resolver and
//!   logging sections
//! - **Loader**: YAML, TOML or JSON with `${VAR:default}` placeholders and
//!   `EDGEPUB_*` overrides
//! - **Parser**: tolerant reading of the published nodes file
//! - **Store**: [`FileEntryStore`], the file-backed `EntryStore`
//!
//! ```text
//! edgepub.yaml ──► SettingsLoader ──► PublisherSettings
//!                                          │ storage
//!                                          ▼
//! publishednodes.json ◄──► FileEntryStore ◄──► PublisherEngine
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod parser;
pub mod schema;
pub mod store;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_settings, ConfigFormat, SettingsLoader};
pub use parser::{parse_entries, render_entries, ParsedEntries, SkippedEntry};
pub use schema::{
    LogFormat, LogLevel, LoggingSettings, PublisherSection, PublisherSettings, ResolverSettings,
    StorageSettings,
};
pub use store::FileEntryStore;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
