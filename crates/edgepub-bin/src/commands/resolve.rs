// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `resolve` command.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use edgepub_config::PublisherSettings;
use edgepub_opcua::{CachedCatalog, FieldResolver, StaticTypeCatalog};

use super::{open_engine, print_json};
use crate::cli::{OutputFormat, ResolveArgs};
use crate::error::{BinError, BinResult};

/// Resolves the event fields of every configured event subscription.
pub async fn resolve(settings: &PublisherSettings, args: &ResolveArgs) -> BinResult<()> {
    let catalog = match args.catalog.as_ref().or(settings.resolver.catalog_file.as_ref()) {
        Some(path) => StaticTypeCatalog::load(path).await?,
        None => StaticTypeCatalog::standard(),
    };
    let cached = Arc::new(CachedCatalog::with_config(
        Arc::new(catalog),
        settings.resolver.cache_capacity,
        settings.resolver.cache_ttl(),
    ));
    let resolver =
        FieldResolver::new(cached.clone()).with_max_concurrency(settings.resolver.max_concurrency);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let engine = open_engine(settings).await?;
    let mut model = engine.writer_groups();
    let report = resolver.resolve_model(&mut model, &cancel).await;

    tracing::debug!(
        hits = cached.stats().cache_hits.load(Ordering::Relaxed),
        misses = cached.stats().cache_misses.load(Ordering::Relaxed),
        "Catalog cache usage"
    );

    match args.format {
        OutputFormat::Json => print_json(&model)?,
        OutputFormat::Text => {
            for (_, writer) in model.writers() {
                for node in writer.events() {
                    let Some(spec) = node.event_filter.as_ref() else {
                        continue;
                    };
                    println!(
                        "{} {} type={}",
                        writer.id,
                        node.identifier().unwrap_or("<unnamed>"),
                        spec.type_definition_id.as_deref().unwrap_or("-")
                    );
                    for field in spec.fields() {
                        println!(
                            "  {} (declared by {})",
                            field.display_name.as_deref().unwrap_or("-"),
                            field.type_definition_id.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
            println!("✓ Resolved {} event subscription(s)", report.resolved);
        }
    }

    let failed = report.failures.len();
    for failure in report.failures.iter().skip(1) {
        eprintln!("✗ {} ({}): {}", failure.node, failure.type_id, failure.error);
    }
    match report.failures.into_iter().next() {
        None => Ok(()),
        Some(first) => Err(BinError::from(first.error).with_context(format!(
            "{} of {} event subscription(s) failed, first {} ({})",
            failed,
            failed + report.resolved,
            first.node,
            first.type_id
        ))),
    }
}
