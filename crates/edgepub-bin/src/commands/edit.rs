// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `publish`, `unpublish` and `unpublish-all` commands.

use edgepub_config::PublisherSettings;

use super::{open_engine, read_request};
use crate::cli::{RequestArgs, UnpublishAllArgs};
use crate::error::BinResult;

/// Publishes the nodes of a request file.
pub async fn publish(settings: &PublisherSettings, args: &RequestArgs) -> BinResult<()> {
    let request = read_request(&args.file).await?;
    let endpoint = request.endpoint().to_string();
    let count = request.nodes().len();

    let engine = open_engine(settings).await?;
    engine.publish_nodes(Some(request)).await?;

    println!("✓ Published {} node(s) on {}", count, endpoint);
    Ok(())
}

/// Unpublishes the nodes of a request file.
pub async fn unpublish(settings: &PublisherSettings, args: &RequestArgs) -> BinResult<()> {
    let request = read_request(&args.file).await?;
    let endpoint = request.endpoint().to_string();
    let count = request.nodes().len();

    let engine = open_engine(settings).await?;
    engine.unpublish_nodes(Some(request)).await?;

    if count == 0 {
        println!("✓ Removed dataset on {}", endpoint);
    } else {
        println!("✓ Unpublished {} node(s) on {}", count, endpoint);
    }
    Ok(())
}

/// Removes matching datasets, or everything without a request file.
pub async fn unpublish_all(settings: &PublisherSettings, args: &UnpublishAllArgs) -> BinResult<()> {
    let request = match &args.file {
        Some(path) => Some(read_request(path).await?),
        None => None,
    };

    let engine = open_engine(settings).await?;
    let before = engine.status().entries;
    engine.unpublish_all_nodes(request).await?;
    let after = engine.status().entries;

    println!("✓ Removed {} dataset(s)", before.saturating_sub(after));
    Ok(())
}
