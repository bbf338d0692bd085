// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # edgepub-bin
//!
//! Command line interface for the edgepub publisher core.
//!
//! ```text
//! main.rs ──► cli.rs ──► settings ──► logging
//!                │
//!                ▼
//!           commands ──► PublisherEngine / FieldResolver
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Validate settings and the published nodes file
//! edgepub -c /etc/edgepub/edgepub.yaml validate
//!
//! # Publish the nodes of a request
//! edgepub publish request.json
//!
//! # Show derived writer groups
//! edgepub list --groups -f json
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;

use edgepub_config::{PublisherSettings, SettingsLoader};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Loads settings, initializes logging and runs the selected command.
///
/// A missing settings file falls back to defaults, except for `validate`
/// which reports it.
pub async fn run(cli: Cli) -> BinResult<()> {
    let settings = load_settings(&cli)?;

    let format = cli
        .log_format
        .unwrap_or_else(|| settings.logging.format.into());
    init_logging(cli.effective_log_level(settings.logging.level.as_str()), format);

    tracing::debug!(
        config = %cli.config.display(),
        nodes_file = %settings.storage.published_nodes_file.display(),
        "Starting edgepub"
    );
    commands::execute(&cli, &settings).await
}

fn load_settings(cli: &Cli) -> BinResult<PublisherSettings> {
    if matches!(cli.command, Commands::Validate(_)) || !cli.config.exists() {
        return Ok(PublisherSettings::default());
    }
    Ok(SettingsLoader::new().load(&cli.config)?)
}
