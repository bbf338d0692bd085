// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Published nodes file parsing.
//!
//! The file is a JSON array of entries. Each element is parsed on its own
//! so one malformed entry does not discard the rest:
//!
//! ```text
//! [ {entry}, {garbage}, {entry} ]
//!      │         │         │
//!      ▼         ▼         ▼
//!    Ok(e)   warn + skip  Ok(e)
//! ```

use std::path::Path;

use serde_json::Value;

use edgepub_core::PublishEntry;

use crate::error::{ConfigError, ConfigResult};

/// An element that was dropped while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position in the array.
    pub index: usize,
    /// Why it was dropped.
    pub message: String,
}

/// Entries read from a published nodes file.
#[derive(Debug, Clone, Default)]
pub struct ParsedEntries {
    /// Entries in file order.
    pub entries: Vec<PublishEntry>,
    /// Elements that failed to parse.
    pub skipped: Vec<SkippedEntry>,
}

/// Parses file content.
///
/// Blank content is an empty list. Content that is not JSON fails with
/// [`ConfigError::Parse`]; JSON that is not an array fails validation.
pub fn parse_entries(content: &str, source: &Path) -> ConfigResult<ParsedEntries> {
    if content.trim().is_empty() {
        return Ok(ParsedEntries::default());
    }

    let value: Value =
        serde_json::from_str(content).map_err(|e| ConfigError::parse(source, e.to_string()))?;
    let Value::Array(elements) = value else {
        return Err(ConfigError::validation(
            source.display().to_string(),
            "expected a JSON array of entries",
        ));
    };

    let mut parsed = ParsedEntries::default();
    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value::<PublishEntry>(element) {
            Ok(entry) => parsed.entries.push(entry),
            Err(e) => {
                tracing::warn!(
                    file = %source.display(),
                    index,
                    error = %e,
                    "Skipping malformed published nodes entry"
                );
                parsed.skipped.push(SkippedEntry {
                    index,
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(parsed)
}

/// Serializes entries as a JSON array.
pub fn render_entries(entries: &[PublishEntry], pretty: bool) -> ConfigResult<Vec<u8>> {
    let rendered = if pretty {
        serde_json::to_vec_pretty(entries)
    } else {
        serde_json::to_vec(entries)
    };
    rendered.map_err(|e| ConfigError::serialization(e.to_string()))
}
