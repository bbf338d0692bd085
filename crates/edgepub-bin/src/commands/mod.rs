// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `validate`: Validate the settings and published nodes files
//! - `list` / `nodes`: Query the live configuration
//! - `publish` / `unpublish` / `unpublish-all`: Edit the published nodes
//! - `resolve`: Resolve event fields
//! - `version`: Show version information

mod edit;
mod list;
mod resolve;
mod validate;
mod version;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use edgepub_config::{FileEntryStore, PublisherSettings};
use edgepub_core::{LoggingSink, PublishEntry, PublisherEngine};

use crate::cli::{Cli, Commands};
use crate::error::{BinError, BinResult};

pub use edit::{publish, unpublish, unpublish_all};
pub use list::{list, nodes};
pub use resolve::resolve;
pub use validate::validate;
pub use version::version;

/// Executes the command selected on the command line.
pub async fn execute(cli: &Cli, settings: &PublisherSettings) -> BinResult<()> {
    match &cli.command {
        Commands::Validate(args) => validate::validate(cli, args).await,
        Commands::List(args) => list::list(settings, args).await,
        Commands::Publish(args) => edit::publish(settings, args).await,
        Commands::Unpublish(args) => edit::unpublish(settings, args).await,
        Commands::UnpublishAll(args) => edit::unpublish_all(settings, args).await,
        Commands::Nodes(args) => list::nodes(settings, args).await,
        Commands::Resolve(args) => resolve::resolve(settings, args).await,
        Commands::Version => version::version(),
    }
}

/// Opens an engine over the configured published nodes file.
pub(crate) async fn open_engine(settings: &PublisherSettings) -> BinResult<PublisherEngine> {
    let store = Arc::new(FileEntryStore::from_settings(&settings.storage));
    let engine = PublisherEngine::open(store, Arc::new(LoggingSink)).await?;
    Ok(engine)
}

/// Reads a request file holding one entry.
pub(crate) async fn read_request(path: &Path) -> BinResult<PublishEntry> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BinError::io(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| BinError::from(e).with_context(format!("reading {}", path.display())))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> BinResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
