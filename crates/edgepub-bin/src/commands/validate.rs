// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use std::sync::Arc;

use edgepub_config::{FileEntryStore, SettingsLoader};
use edgepub_core::{PublisherEngine, ReloadOutcome};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Validates the settings file and replays the published nodes file
/// without modifying it.
pub async fn validate(cli: &Cli, args: &ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;
    if !config_path.exists() {
        return Err(BinError::Configuration(format!(
            "Settings file not found: {}",
            config_path.display()
        )));
    }

    let settings = SettingsLoader::new().load(config_path).map_err(|e| {
        BinError::Configuration(format!("Settings validation failed: {}", e))
    })?;

    let nodes_file = &settings.storage.published_nodes_file;
    let store = FileEntryStore::from_settings(&settings.storage).with_create_if_missing(false);
    let engine = PublisherEngine::new(Arc::new(store));
    let skipped = match engine.reload().await? {
        ReloadOutcome::Reloaded { skipped, .. } => skipped,
        ReloadOutcome::Unchanged => 0,
    };
    let status = engine.status();

    let mut warnings: Vec<String> = Vec::new();
    if !nodes_file.exists() {
        warnings.push(format!("Published nodes file does not exist: {}", nodes_file.display()));
    }
    if skipped > 0 {
        warnings.push(format!("{} malformed entr(y/ies) will be ignored", skipped));
    }
    if let Some(catalog) = &settings.resolver.catalog_file {
        if !catalog.exists() {
            warnings.push(format!("Type catalog file does not exist: {}", catalog.display()));
        }
    }

    match args.format {
        OutputFormat::Text => {
            println!("✓ Settings are valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Publisher ID:   {}", settings.publisher.id);
            println!("  Site:           {}", settings.publisher.site.as_deref().unwrap_or("-"));
            println!("  Nodes file:     {}", nodes_file.display());
            println!("  Datasets:       {}", status.entries);
            println!("  Writer groups:  {}", status.groups);
            println!("  Writers:        {}", status.writers);
            println!("  Nodes:          {}", status.nodes);

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "settings": settings,
                "status": status,
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
