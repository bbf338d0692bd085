// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Content-addressed identities for writer groups and dataset writers.
//!
//! A key is the SHA-256 digest of a fixed-order concatenation of the fields
//! that make a resource distinct. Node lists never participate, durations are
//! hashed in normalized form and empty or default values are skipped, so an
//! explicit default and an omitted field produce the same key.
//!
//! Keys agree with the predicates in [`crate::equality`]:
//!
//! - `same_writer_group(a, b)` ⇔ `group_key(a) == group_key(b)`
//! - `same_writer_group(a, b) && same_data_set(a, b) && ia == ib`
//!   ⇔ `writer_key(a, ia) == writer_key(b, ib)`

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::duration::canonical;
use crate::model::PublishEntry;

// =============================================================================
// Key Types
// =============================================================================

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Returns the hex digest.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the first characters of the digest for display.
            pub fn short(&self) -> &str {
                &self.0[..self.0.len().min(12)]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

key_type! {
    /// Identity of a writer group.
    WriterGroupKey
}

key_type! {
    /// Identity of a dataset writer.
    DataSetWriterKey
}

// =============================================================================
// Normalization Helpers
// =============================================================================

/// A string field, with empty strings treated as absent.
#[inline]
pub(crate) fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// An optional boolean with `false` as default.
#[inline]
pub(crate) fn flag(value: Option<bool>) -> bool {
    value.unwrap_or(false)
}

/// An optional enumeration with its default applied.
#[inline]
pub(crate) fn choice<E: Default + Copy>(value: Option<E>) -> E {
    value.unwrap_or_default()
}

/// Hex SHA-256 of a secret, so credentials never appear in a key input.
pub fn secret_digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

// =============================================================================
// KeyBuilder
// =============================================================================

/// Accumulates identity fields in a fixed order and digests them.
///
/// Each field is written as `label:len:value;` so values containing
/// separators cannot collide with other fields.
#[derive(Debug, Default)]
struct KeyBuilder {
    buffer: String,
}

impl KeyBuilder {
    fn push(&mut self, label: &str, value: &str) {
        self.buffer.push_str(label);
        self.buffer.push(':');
        self.buffer.push_str(&value.len().to_string());
        self.buffer.push(':');
        self.buffer.push_str(value);
        self.buffer.push(';');
    }

    fn text(&mut self, label: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(label, value);
        }
    }

    fn flag(&mut self, label: &str, value: bool) {
        if value {
            self.push(label, "true");
        }
    }

    fn number<T: fmt::Display>(&mut self, label: &str, value: Option<T>) {
        if let Some(value) = value {
            self.push(label, &value.to_string());
        }
    }

    fn duration(&mut self, label: &str, value: Option<Duration>) {
        if let Some(value) = value {
            self.push(label, &canonical(value));
        }
    }

    fn choice<E>(&mut self, label: &str, value: Option<E>)
    where
        E: Default + Copy + PartialEq + fmt::Display,
    {
        let value = choice(value);
        if value != E::default() {
            self.push(label, &value.to_string());
        }
    }

    fn finish(self) -> String {
        hex::encode(Sha256::digest(self.buffer.as_bytes()))
    }
}

// =============================================================================
// Key Computation
// =============================================================================

/// Computes the writer group key of an entry.
pub fn group_key(entry: &PublishEntry) -> WriterGroupKey {
    let mut key = KeyBuilder::default();
    append_group_fields(&mut key, entry);
    WriterGroupKey(key.finish())
}

/// Computes the dataset writer key of an entry for a publishing interval.
///
/// The interval is passed explicitly because one entry expands into one
/// writer per distinct node publishing interval.
pub fn writer_key(entry: &PublishEntry, publishing_interval: Option<Duration>) -> DataSetWriterKey {
    let mut key = KeyBuilder::default();
    key.push("Group", group_key(entry).as_str());
    append_data_set_fields(&mut key, entry);
    key.duration("DataSetPublishingInterval", publishing_interval);
    DataSetWriterKey(key.finish())
}

fn append_group_fields(key: &mut KeyBuilder, entry: &PublishEntry) {
    key.text("DataSetWriterGroup", text(&entry.data_set_writer_group));
    key.choice("WriterGroupTransport", entry.writer_group_transport);
    key.choice("WriterGroupQualityOfService", entry.writer_group_quality_of_service);
    key.text("WriterGroupQueueName", text(&entry.writer_group_queue_name));
    key.choice("MessageEncoding", entry.message_encoding);
    key.choice("MessagingMode", entry.messaging_mode);
    key.number("BatchSize", entry.batch_size);
    key.duration("BatchTriggerInterval", entry.batch_trigger_interval());
    key.number("WriterGroupPartitions", entry.writer_group_partitions);
}

fn append_data_set_fields(key: &mut KeyBuilder, entry: &PublishEntry) {
    key.text("DataSetWriterId", text(&entry.data_set_writer_id));

    // Connection
    key.text("EndpointUrl", text(&entry.endpoint_url));
    key.flag("UseReverseConnect", flag(entry.use_reverse_connect));
    key.flag(
        "DisableSubscriptionTransfer",
        flag(entry.disable_subscription_transfer),
    );
    key.choice("EndpointSecurityMode", Some(entry.effective_security_mode()));
    key.text("EndpointSecurityPolicy", text(&entry.endpoint_security_policy));
    key.choice("OpcAuthenticationMode", entry.opc_authentication_mode);
    key.text(
        "OpcAuthenticationUsername",
        text(&entry.opc_authentication_username),
    );
    if let Some(password) = text(&entry.opc_authentication_password) {
        key.push("OpcAuthenticationPassword", &secret_digest(password));
    }

    // Dataset
    key.text("DataSetName", text(&entry.data_set_name));
    key.number(
        "DataSetClassId",
        entry.data_set_class_id.filter(|id| !id.is_nil()),
    );
    key.number("DataSetKeyFrameCount", entry.data_set_key_frame_count);
    key.number("Priority", entry.priority);
    key.duration("MetaDataUpdateTime", entry.meta_data_update_time());
    key.text("MetaDataQueueName", text(&entry.meta_data_queue_name));
    key.duration("DataSetSamplingInterval", entry.sampling_interval());
    key.choice("QualityOfService", entry.quality_of_service);
    key.text("QueueName", text(&entry.queue_name));
    key.choice("DataSetRouting", entry.data_set_routing);
    key.flag(
        "SendKeepAliveDataSetMessages",
        flag(entry.send_keep_alive_data_set_messages),
    );
    key.flag(
        "DataSetFetchDisplayNames",
        flag(entry.data_set_fetch_display_names),
    );
    key.duration("DefaultHeartbeatInterval", entry.default_heartbeat_interval());
    key.choice("DefaultHeartbeatBehavior", entry.default_heartbeat_behavior);

    // Watchdog
    key.duration("OpcNodeWatchdogTimespan", entry.opc_node_watchdog_timespan);
    key.choice(
        "DataSetWriterWatchdogBehavior",
        entry.data_set_writer_watchdog_behavior,
    );
    key.choice("OpcNodeWatchdogCondition", entry.opc_node_watchdog_condition);
}

// =============================================================================
// Tests
// =============================================================================
