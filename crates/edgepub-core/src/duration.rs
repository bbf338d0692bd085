// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Normalized durations.
//!
//! Intervals in published nodes files can be written either as integer
//! milliseconds (`OpcPublishingInterval: 1000`) or as a timespan string
//! (`OpcPublishingIntervalTimespan: "00:00:01"`). The timespan always wins
//! when both are present; when neither is present the interval is absent,
//! which is a distinct state from zero.

use std::time::Duration;

/// Resolves a timespan / millisecond pair into a single optional duration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use edgepub_core::duration::normalize;
///
/// assert_eq!(normalize(None, Some(500)), Some(Duration::from_millis(500)));
/// assert_eq!(
///     normalize(Some(Duration::from_secs(2)), Some(500)),
///     Some(Duration::from_secs(2))
/// );
/// assert_eq!(normalize(None, None), None);
/// ```
#[inline]
pub fn normalize(timespan: Option<Duration>, millis: Option<u32>) -> Option<Duration> {
    timespan.or_else(|| millis.map(|ms| Duration::from_millis(u64::from(ms))))
}

/// Stable textual form of a normalized duration used when hashing.
///
/// Two durations that compare equal always render identically.
pub fn canonical(duration: Duration) -> String {
    format!("{}ns", duration.as_nanos())
}

/// Formats a duration as a constant-format timespan (`[d.]hh:mm:ss[.fffffff]`).
pub fn format_timespan(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    // Timespan ticks are 100ns.
    let ticks = duration.subsec_nanos() / 100;

    let mut out = String::with_capacity(20);
    if days > 0 {
        out.push_str(&format!("{}.", days));
    }
    out.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    if ticks > 0 {
        out.push_str(&format!(".{:07}", ticks));
    }
    out
}

/// Parses a constant-format timespan (`[d.]hh:mm:ss[.fffffff]`).
pub fn parse_timespan(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.starts_with('-') {
        return Err(format!("negative timespan '{}' is not supported", input));
    }

    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected [d.]hh:mm:ss[.fffffff], got '{}'", input));
    }

    let (days, hours) = match parts[0].split_once('.') {
        Some((d, h)) => (parse_component(d, input)?, parse_component(h, input)?),
        None => (0, parse_component(parts[0], input)?),
    };
    let minutes = parse_component(parts[1], input)?;
    let (seconds, nanos) = match parts[2].split_once('.') {
        Some((s, fraction)) => (parse_component(s, input)?, parse_fraction(fraction, input)?),
        None => (parse_component(parts[2], input)?, 0),
    };

    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(format!("timespan component out of range in '{}'", input));
    }

    let secs = days
        .checked_mul(86_400)
        .and_then(|d| d.checked_add(hours * 3_600 + minutes * 60 + seconds))
        .ok_or_else(|| format!("timespan out of range in '{}'", input))?;
    Ok(Duration::new(secs, nanos))
}

fn parse_component(value: &str, input: &str) -> Result<u64, String> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid timespan '{}'", input));
    }
    value
        .parse()
        .map_err(|_| format!("invalid timespan '{}'", input))
}

fn parse_fraction(value: &str, input: &str) -> Result<u32, String> {
    if value.is_empty() || value.len() > 7 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid timespan fraction in '{}'", input));
    }
    let padded = format!("{:0<9}", value);
    padded
        .parse()
        .map_err(|_| format!("invalid timespan fraction in '{}'", input))
}

/// Serde adapter for `Option<Duration>` fields stored as timespan strings.
pub mod timespan {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an optional duration as a timespan string.
    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => serializer.serialize_str(&super::format_timespan(*duration)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional timespan string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) if !s.trim().is_empty() => super::parse_timespan(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
