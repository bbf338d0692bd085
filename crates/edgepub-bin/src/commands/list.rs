// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `list` and `nodes` commands.

use std::time::Duration;

use edgepub_config::PublisherSettings;
use edgepub_core::{PublishEntry, DEFAULT_WRITER_NAME};

use super::{open_engine, print_json, read_request};
use crate::cli::{ListArgs, NodesArgs, OutputFormat};
use crate::error::BinResult;

/// Lists configured endpoints or derived writer groups.
pub async fn list(settings: &PublisherSettings, args: &ListArgs) -> BinResult<()> {
    let engine = open_engine(settings).await?;

    if args.groups {
        let model = engine.writer_groups();
        return match args.format {
            OutputFormat::Json => print_json(&model),
            OutputFormat::Text => {
                for group in &model.groups {
                    println!(
                        "{} ({} writer(s), {} node(s))",
                        group.id.as_deref().unwrap_or(DEFAULT_WRITER_NAME),
                        group.writers.len(),
                        group.node_count()
                    );
                    for writer in &group.writers {
                        println!(
                            "  {} {} every {} - {} node(s)",
                            writer.id,
                            writer.settings.endpoint(),
                            interval(writer.publishing_interval),
                            writer.nodes.len()
                        );
                    }
                }
                Ok(())
            }
        };
    }

    let entries: Vec<PublishEntry> = engine
        .get_configured_endpoints(args.nodes)
        .iter()
        .map(PublishEntry::redacted)
        .collect();

    match args.format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Text => {
            let status = engine.status();
            println!(
                "{} dataset(s), {} writer group(s), {} node(s)",
                status.entries, status.groups, status.nodes
            );
            for entry in &entries {
                println!(
                    "  {} group={} writer={}",
                    entry.endpoint(),
                    entry.data_set_writer_group.as_deref().unwrap_or("-"),
                    entry.data_set_writer_id.as_deref().unwrap_or("-"),
                );
                for node in entry.nodes() {
                    println!(
                        "    {} every {}",
                        node.identifier().unwrap_or("<unnamed>"),
                        interval(node.publishing_interval())
                    );
                }
            }
            Ok(())
        }
    }
}

/// Shows the nodes of the dataset matching a request file.
pub async fn nodes(settings: &PublisherSettings, args: &NodesArgs) -> BinResult<()> {
    let request = read_request(&args.file).await?;
    let engine = open_engine(settings).await?;
    let nodes = engine.get_configured_nodes_on_endpoint(Some(request))?;

    match args.format {
        OutputFormat::Json => print_json(&nodes),
        OutputFormat::Text => {
            for node in &nodes {
                let kind = if node.is_event() { "event" } else { "variable" };
                println!("{} ({})", node.identifier().unwrap_or("<unnamed>"), kind);
            }
            Ok(())
        }
    }
}

fn interval(value: Option<Duration>) -> String {
    value
        .map(|d| format!("{}ms", d.as_millis()))
        .unwrap_or_else(|| "default".to_string())
}
