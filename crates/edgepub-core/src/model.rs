// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User-facing configuration model.
//!
//! These types mirror the published nodes file format: PascalCase JSON
//! objects, every field optional, intervals expressed either in integer
//! milliseconds or as timespan strings.
//!
//! ```text
//! PublishEntry
//! ├── endpoint, security, credentials
//! ├── writer group settings
//! ├── dataset settings
//! └── OpcNodes: [NodeSpec]
//!     ├── sampling / publishing / heartbeat intervals
//!     ├── EventFilter: EventSpec
//!     │   ├── SelectClauses: [SelectedField]
//!     │   └── WhereClause: ContentFilter
//!     └── TriggeredNodes: [NodeSpec]
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::duration::normalize;
use crate::error::{PublisherError, PublisherResult};

// =============================================================================
// String Enums
// =============================================================================

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
        default = $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Returns the wire name of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Message security mode requested for the endpoint.
    SecurityMode {
        /// Most secure mode the endpoint offers.
        Best => "Best",
        /// Messages are signed.
        Sign => "Sign",
        /// Messages are signed and encrypted.
        SignAndEncrypt => "SignAndEncrypt",
        /// No message security.
        None => "None",
    }
    default = None
}

string_enum! {
    /// How the publisher authenticates to the endpoint.
    AuthenticationMode {
        /// Anonymous session.
        Anonymous => "Anonymous",
        /// User name and password.
        UsernamePassword => "UsernamePassword",
        /// X.509 user certificate.
        Certificate => "Certificate",
    }
    default = Anonymous
}

string_enum! {
    /// Network message layout.
    MessagingMode {
        /// OPC UA PubSub network messages.
        PubSub => "PubSub",
        /// Monitored item samples.
        Samples => "Samples",
        /// Network messages with all headers.
        FullNetworkMessages => "FullNetworkMessages",
        /// Samples with all fields.
        FullSamples => "FullSamples",
        /// Dataset messages without network header.
        DataSetMessages => "DataSetMessages",
        /// One dataset message per network message.
        SingleDataSetMessage => "SingleDataSetMessage",
        /// Raw dataset payloads.
        RawDataSets => "RawDataSets",
    }
    default = PubSub
}

string_enum! {
    /// Message encoding.
    MessageEncoding {
        /// JSON.
        Json => "Json",
        /// UADP binary.
        Uadp => "Uadp",
        /// Avro binary.
        Avro => "Avro",
        /// Gzip compressed JSON.
        JsonGzip => "JsonGzip",
        /// Gzip compressed Avro.
        AvroGzip => "AvroGzip",
    }
    default = Json
}

string_enum! {
    /// Delivery guarantee.
    QualityOfService {
        /// Fire and forget.
        AtMostOnce => "AtMostOnce",
        /// Acknowledged delivery.
        AtLeastOnce => "AtLeastOnce",
        /// Exactly once delivery.
        ExactlyOnce => "ExactlyOnce",
    }
    default = AtLeastOnce
}

string_enum! {
    /// Transport used by a writer group.
    WriterGroupTransport {
        /// Cloud hub client.
        IoTHub => "IoTHub",
        /// MQTT broker.
        Mqtt => "Mqtt",
        /// Event hub.
        EventHub => "EventHub",
        /// Dapr pub/sub.
        Dapr => "Dapr",
        /// HTTP webhook.
        Http => "Http",
        /// Local file system.
        FileSystem => "FileSystem",
        /// Discard messages.
        Null => "Null",
    }
    default = IoTHub
}

string_enum! {
    /// How dataset field names are routed to topics.
    DataSetRoutingMode {
        /// No routing.
        None => "None",
        /// Use browse names.
        UseBrowseNames => "UseBrowseNames",
        /// Use browse names including the namespace index.
        UseBrowseNamesWithNamespaceIndex => "UseBrowseNamesWithNamespaceIndex",
    }
    default = None
}

string_enum! {
    /// Action taken when the writer watchdog fires.
    WatchdogBehavior {
        /// Emit diagnostics only.
        Diagnostic => "Diagnostic",
        /// Recreate the subscription.
        Reset => "Reset",
        /// Fail the writer.
        FailFast => "FailFast",
        /// Exit the publisher process.
        ExitProcess => "ExitProcess",
    }
    default = Diagnostic
}

string_enum! {
    /// When the node watchdog considers the writer late.
    WatchdogCondition {
        /// All monitored items are late.
        WhenAllAreLate => "WhenAllAreLate",
        /// Any monitored item is late.
        WhenAnyIsLate => "WhenAnyIsLate",
    }
    default = WhenAllAreLate
}

string_enum! {
    /// Heartbeat emission behaviour.
    HeartbeatBehavior {
        /// Re-send last known value when no change arrives.
        WatchdogLkv => "WatchdogLKV",
        /// Re-send last known good value when no change arrives.
        WatchdogLkg => "WatchdogLKG",
        /// Periodically send last known value.
        PeriodicLkv => "PeriodicLKV",
        /// Periodically send last known good value.
        PeriodicLkg => "PeriodicLKG",
    }
    default = WatchdogLkv
}

string_enum! {
    /// Data change notification trigger.
    DataChangeTrigger {
        /// Status changes only.
        Status => "Status",
        /// Status or value changes.
        StatusValue => "StatusValue",
        /// Status, value or source timestamp changes.
        StatusValueTimestamp => "StatusValueTimestamp",
    }
    default = StatusValue
}

string_enum! {
    /// Deadband filter kind.
    DeadbandType {
        /// Absolute deadband.
        Absolute => "Absolute",
        /// Percent of the EU range.
        Percent => "Percent",
    }
    default = Absolute
}

string_enum! {
    /// Node attribute selected by an operand or published item.
    NodeAttribute {
        /// NodeId attribute.
        NodeId => "NodeId",
        /// NodeClass attribute.
        NodeClass => "NodeClass",
        /// BrowseName attribute.
        BrowseName => "BrowseName",
        /// DisplayName attribute.
        DisplayName => "DisplayName",
        /// Description attribute.
        Description => "Description",
        /// Value attribute.
        Value => "Value",
        /// DataType attribute.
        DataType => "DataType",
        /// EventNotifier attribute.
        EventNotifier => "EventNotifier",
    }
    default = Value
}

string_enum! {
    /// Content filter operator.
    FilterOperator {
        /// Operands are equal.
        Equals => "Equals",
        /// Operand is null.
        IsNull => "IsNull",
        /// Greater than.
        GreaterThan => "GreaterThan",
        /// Less than.
        LessThan => "LessThan",
        /// Greater than or equal.
        GreaterThanOrEqual => "GreaterThanOrEqual",
        /// Less than or equal.
        LessThanOrEqual => "LessThanOrEqual",
        /// Pattern match.
        Like => "Like",
        /// Logical negation.
        Not => "Not",
        /// Range check.
        Between => "Between",
        /// Membership check.
        InList => "InList",
        /// Logical and.
        And => "And",
        /// Logical or.
        Or => "Or",
        /// Type cast.
        Cast => "Cast",
        /// Event type is, or derives from, the operand type.
        OfType => "OfType",
    }
    default = Equals
}

// =============================================================================
// Event Model
// =============================================================================

/// A field selected from an event notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SelectedField {
    /// Type that declares the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_definition_id: Option<String>,

    /// Browse path from the declaring type to the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_path: Option<Vec<String>>,

    /// Selected attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_id: Option<NodeAttribute>,

    /// Index range for array values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_range: Option<String>,

    /// Field name in emitted messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Dataset class field id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_class_field_id: Option<Uuid>,
}

impl SelectedField {
    /// Browse path as a slice (empty when absent).
    pub fn path(&self) -> &[String] {
        self.browse_path.as_deref().unwrap_or(&[])
    }
}

/// An operand of a content filter element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterOperand {
    /// Index of another element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    /// Literal value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    /// Node id operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,

    /// Attribute of an attribute operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_id: Option<NodeAttribute>,

    /// Browse path of an attribute operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_path: Option<Vec<String>>,

    /// Alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl FilterOperand {
    /// Creates a literal operand.
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }
}

/// One element of a content filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentFilterElement {
    /// Operator.
    pub filter_operator: FilterOperator,

    /// Operands.
    #[serde(default)]
    pub filter_operands: Vec<FilterOperand>,
}

/// A content filter (where clause).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentFilter {
    /// Filter elements.
    #[serde(default)]
    pub elements: Vec<ContentFilterElement>,
}

impl ContentFilter {
    /// Creates a filter matching events of the given type or its subtypes.
    pub fn of_type(type_id: impl Into<String>) -> Self {
        Self {
            elements: vec![ContentFilterElement {
                filter_operator: FilterOperator::OfType,
                filter_operands: vec![FilterOperand::literal(type_id.into())],
            }],
        }
    }
}

/// Condition refresh handling options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConditionHandlingOptions {
    /// Seconds between pending condition updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<u32>,

    /// Seconds between pending condition snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_interval: Option<u32>,
}

impl ConditionHandlingOptions {
    /// Returns `true` if neither interval is configured.
    pub fn is_disabled(&self) -> bool {
        self.update_interval.is_none() && self.snapshot_interval.is_none()
    }
}

/// Model change event handling options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelChangeHandlingOptions {
    /// Interval at which the address space is browsed again.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub rebrowse_interval_timespan: Option<Duration>,
}

/// An event subscription template.
///
/// As authored it carries only a type reference. After resolution the
/// select and where clauses are populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSpec {
    /// Event type to subscribe to, in `ns=<index>;<id>` form.
    ///
    /// Expanded `nsu=<uri>;<id>` ids are not resolved and fail resolution
    /// as an invalid node id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_definition_id: Option<String>,

    /// Selected fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_clauses: Option<Vec<SelectedField>>,

    /// Where clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<ContentFilter>,

    /// Condition handling retained for condition-family types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_handling: Option<ConditionHandlingOptions>,
}

impl EventSpec {
    /// Creates a template referencing an event type.
    pub fn of_type(type_id: impl Into<String>) -> Self {
        Self {
            type_definition_id: Some(type_id.into()),
            ..Default::default()
        }
    }

    /// Returns the selected fields (empty when unresolved).
    pub fn fields(&self) -> &[SelectedField] {
        self.select_clauses.as_deref().unwrap_or(&[])
    }

    /// Returns `true` if select clauses have been populated.
    pub fn is_resolved(&self) -> bool {
        !self.fields().is_empty()
    }
}

// =============================================================================
// NodeSpec
// =============================================================================

/// One published item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeSpec {
    /// Node id (`ns=2;s=Temperature`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Expanded node id (`nsu=http://...;s=Temperature`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_node_id: Option<String>,

    /// Relative browse path from the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_path: Option<Vec<String>>,

    /// Attribute to publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_id: Option<NodeAttribute>,

    /// Index range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_range: Option<String>,

    /// Display name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Dataset field id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_field_id: Option<String>,

    /// Dataset class field id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_class_field_id: Option<Uuid>,

    /// Topic override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Server side queue size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_size: Option<u32>,

    /// Discard newest values when the queue is full.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discard_new: Option<bool>,

    /// Sampling interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opc_sampling_interval: Option<u32>,

    /// Sampling interval as timespan.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub opc_sampling_interval_timespan: Option<Duration>,

    /// Publishing interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opc_publishing_interval: Option<u32>,

    /// Publishing interval as timespan.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub opc_publishing_interval_timespan: Option<Duration>,

    /// Heartbeat interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_interval: Option<u32>,

    /// Heartbeat interval as timespan.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub heartbeat_interval_timespan: Option<Duration>,

    /// Heartbeat behaviour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_behavior: Option<HeartbeatBehavior>,

    /// Skip the first notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_first: Option<bool>,

    /// Data change trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_change_trigger: Option<DataChangeTrigger>,

    /// Deadband type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadband_type: Option<DeadbandType>,

    /// Deadband value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadband_value: Option<f64>,

    /// Event subscription template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_filter: Option<EventSpec>,

    /// Condition handling options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_handling: Option<ConditionHandlingOptions>,

    /// Model change handling options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_change_handling: Option<ModelChangeHandlingOptions>,

    /// Sample with cyclic reads instead of subscriptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cyclic_read: Option<bool>,

    /// Register the node before sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register_node: Option<bool>,

    /// Read the display name from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_display_name: Option<bool>,

    /// Nodes reported when this node changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_nodes: Option<Vec<NodeSpec>>,
}

impl NodeSpec {
    /// Creates a node spec for a node id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Returns the node id, falling back to the expanded node id.
    pub fn identifier(&self) -> Option<&str> {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => Some(id),
            _ => self.expanded_node_id.as_deref().filter(|id| !id.is_empty()),
        }
    }

    /// Normalized publishing interval.
    pub fn publishing_interval(&self) -> Option<Duration> {
        normalize(self.opc_publishing_interval_timespan, self.opc_publishing_interval)
    }

    /// Normalized sampling interval.
    pub fn sampling_interval(&self) -> Option<Duration> {
        normalize(self.opc_sampling_interval_timespan, self.opc_sampling_interval)
    }

    /// Normalized heartbeat interval (integer form is seconds).
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval_timespan.or_else(|| {
            self.heartbeat_interval
                .map(|secs| Duration::from_secs(u64::from(secs)))
        })
    }

    /// Sets the publishing interval, replacing both representations.
    pub fn set_publishing_interval(&mut self, interval: Option<Duration>) {
        self.opc_publishing_interval = None;
        self.opc_publishing_interval_timespan = interval;
    }

    /// Returns `true` if this node subscribes to events.
    pub fn is_event(&self) -> bool {
        self.event_filter.is_some()
    }

    /// Triggered child nodes (empty when absent).
    pub fn triggered(&self) -> &[NodeSpec] {
        self.triggered_nodes.as_deref().unwrap_or(&[])
    }
}

// =============================================================================
// PublishEntry
// =============================================================================

/// Legacy single node shorthand (`"NodeId": { "Identifier": "..." }`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyNodeId {
    /// The node identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// One user-facing publishing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublishEntry {
    // ---- writer and group identity ----
    /// Dataset writer id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_writer_id: Option<String>,

    /// Writer group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_writer_group: Option<String>,

    // ---- dataset settings ----
    /// Dataset class id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_class_id: Option<Uuid>,

    /// Dataset name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_name: Option<String>,

    /// Dataset description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_description: Option<String>,

    /// Key frame count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_key_frame_count: Option<u32>,

    /// Publishing interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_publishing_interval: Option<u32>,

    /// Publishing interval as timespan.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_set_publishing_interval_timespan: Option<Duration>,

    /// Default sampling interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_sampling_interval: Option<u32>,

    /// Default sampling interval as timespan.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_set_sampling_interval_timespan: Option<Duration>,

    /// Metadata update time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data_update_time: Option<u32>,

    /// Metadata update time as timespan.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta_data_update_time_timespan: Option<Duration>,

    /// Metadata queue name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data_queue_name: Option<String>,

    /// Send keep alive dataset messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_keep_alive_data_set_messages: Option<bool>,

    /// Fetch display names for all nodes of the dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_fetch_display_names: Option<bool>,

    /// Dataset routing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_routing: Option<DataSetRoutingMode>,

    /// Default heartbeat interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_heartbeat_interval: Option<u32>,

    /// Default heartbeat interval as timespan.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_heartbeat_interval_timespan: Option<Duration>,

    /// Default heartbeat behaviour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_heartbeat_behavior: Option<HeartbeatBehavior>,

    /// Subscription priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    /// Writer queue name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,

    /// Writer quality of service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_of_service: Option<QualityOfService>,

    // ---- connection ----
    /// Endpoint url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    /// Use reverse connect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_reverse_connect: Option<bool>,

    /// Disable subscription transfer on reconnect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_subscription_transfer: Option<bool>,

    /// Legacy security switch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_security: Option<bool>,

    /// Security mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_security_mode: Option<SecurityMode>,

    /// Security policy uri.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_security_policy: Option<String>,

    /// Authentication mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opc_authentication_mode: Option<AuthenticationMode>,

    /// User name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opc_authentication_username: Option<String>,

    /// Password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opc_authentication_password: Option<String>,

    // ---- watchdog ----
    /// Node watchdog timeout.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub opc_node_watchdog_timespan: Option<Duration>,

    /// Writer watchdog behaviour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_writer_watchdog_behavior: Option<WatchdogBehavior>,

    /// Node watchdog condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opc_node_watchdog_condition: Option<WatchdogCondition>,

    // ---- writer group ----
    /// Writer group queue name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_group_queue_name: Option<String>,

    /// Writer group quality of service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_group_quality_of_service: Option<QualityOfService>,

    /// Writer group transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_group_transport: Option<WriterGroupTransport>,

    /// Writer group partition count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_group_partitions: Option<u32>,

    /// Messaging mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaging_mode: Option<MessagingMode>,

    /// Message encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_encoding: Option<MessageEncoding>,

    /// Notifications per batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,

    /// Batch trigger interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_trigger_interval: Option<u32>,

    /// Batch trigger interval as timespan.
    #[serde(
        default,
        with = "crate::duration::timespan",
        skip_serializing_if = "Option::is_none"
    )]
    pub batch_trigger_interval_timespan: Option<Duration>,

    // ---- nodes ----
    /// Published nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opc_nodes: Option<Vec<NodeSpec>>,

    /// Legacy single node shorthand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<LegacyNodeId>,
}

impl PublishEntry {
    /// Creates an entry for an endpoint without nodes.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
            ..Default::default()
        }
    }

    /// Endpoint url or the empty string.
    pub fn endpoint(&self) -> &str {
        self.endpoint_url.as_deref().unwrap_or("")
    }

    /// Published nodes (empty when absent).
    pub fn nodes(&self) -> &[NodeSpec] {
        self.opc_nodes.as_deref().unwrap_or(&[])
    }

    /// Returns `true` if the entry carries no nodes.
    pub fn has_no_nodes(&self) -> bool {
        self.nodes().is_empty()
    }

    /// Normalized dataset publishing interval.
    pub fn publishing_interval(&self) -> Option<Duration> {
        normalize(
            self.data_set_publishing_interval_timespan,
            self.data_set_publishing_interval,
        )
    }

    /// Normalized dataset sampling interval.
    pub fn sampling_interval(&self) -> Option<Duration> {
        normalize(
            self.data_set_sampling_interval_timespan,
            self.data_set_sampling_interval,
        )
    }

    /// Normalized metadata update time.
    pub fn meta_data_update_time(&self) -> Option<Duration> {
        normalize(self.meta_data_update_time_timespan, self.meta_data_update_time)
    }

    /// Normalized batch trigger interval.
    pub fn batch_trigger_interval(&self) -> Option<Duration> {
        normalize(self.batch_trigger_interval_timespan, self.batch_trigger_interval)
    }

    /// Normalized default heartbeat interval.
    pub fn default_heartbeat_interval(&self) -> Option<Duration> {
        normalize(
            self.default_heartbeat_interval_timespan,
            self.default_heartbeat_interval,
        )
    }

    /// Security mode after applying the legacy `UseSecurity` switch.
    pub fn effective_security_mode(&self) -> SecurityMode {
        match self.endpoint_security_mode {
            Some(mode) => mode,
            None if self.use_security.unwrap_or(false) => SecurityMode::SignAndEncrypt,
            None => SecurityMode::None,
        }
    }

    /// Authentication mode, anonymous when absent.
    pub fn effective_authentication_mode(&self) -> AuthenticationMode {
        self.opc_authentication_mode.unwrap_or_default()
    }

    /// Moves the dataset publishing interval into nodes lacking their own.
    ///
    /// The dataset-level fields are cleared afterwards so that the interval
    /// lives in exactly one place.
    pub fn propagate_publishing_interval(&mut self) {
        let interval = self.publishing_interval();
        if let Some(nodes) = self.opc_nodes.as_mut() {
            if nodes.is_empty() {
                return;
            }
            if interval.is_some() {
                for node in nodes.iter_mut() {
                    if node.publishing_interval().is_none() {
                        node.set_publishing_interval(interval);
                    }
                }
            }
            self.data_set_publishing_interval = None;
            self.data_set_publishing_interval_timespan = None;
        }
    }

    /// Converts the legacy `NodeId` shorthand into `OpcNodes`.
    ///
    /// An entry carrying both shapes is rejected; an entry carrying neither
    /// is accepted with zero nodes.
    pub fn into_current_shape(mut self) -> PublisherResult<Self> {
        let legacy = self
            .node_id
            .take()
            .and_then(|legacy| legacy.identifier)
            .filter(|id| !id.is_empty());

        match (legacy, self.opc_nodes.is_some()) {
            (Some(_), true) => Err(PublisherError::validation(
                "NodeId",
                format!(
                    "entry for endpoint '{}' specifies both NodeId and OpcNodes",
                    self.endpoint()
                ),
            )),
            (Some(id), false) => {
                let mut node = NodeSpec::new(id);
                node.set_publishing_interval(self.publishing_interval());
                self.opc_nodes = Some(vec![node]);
                Ok(self)
            }
            (None, _) => Ok(self),
        }
    }

    /// Returns a copy with the node list removed.
    pub fn to_metadata(&self) -> Self {
        Self {
            opc_nodes: None,
            node_id: None,
            ..self.clone()
        }
    }

    /// Returns a copy with the given node list.
    pub fn with_nodes(&self, nodes: Vec<NodeSpec>) -> Self {
        Self {
            opc_nodes: Some(nodes),
            node_id: None,
            ..self.clone()
        }
    }

    /// Returns a copy with the password masked, for logs and output.
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        if redacted.opc_authentication_password.is_some() {
            redacted.opc_authentication_password = Some("***".to_string());
        }
        redacted
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_pascal_case() {
        let json = r#"{
            "EndpointUrl": "opc.tcp://plc:4840",
            "DataSetWriterId": "w1",
            "DataSetPublishingIntervalTimespan": "00:00:02",
            "EndpointSecurityMode": "SignAndEncrypt",
            "OpcNodes": [
                { "Id": "ns=2;s=Temp", "OpcSamplingInterval": 500 }
            ]
        }"#;

        let entry: PublishEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.endpoint(), "opc.tcp://plc:4840");
        assert_eq!(entry.data_set_writer_id.as_deref(), Some("w1"));
        assert_eq!(entry.publishing_interval(), Some(Duration::from_secs(2)));
        assert_eq!(entry.effective_security_mode(), SecurityMode::SignAndEncrypt);
        assert_eq!(entry.nodes().len(), 1);
        assert_eq!(
            entry.nodes()[0].sampling_interval(),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let entry = PublishEntry::new("opc.tcp://plc:4840");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"EndpointUrl":"opc.tcp://plc:4840"}"#);
    }

    #[test]
    fn test_use_security_maps_to_sign_and_encrypt() {
        let mut entry = PublishEntry::new("opc.tcp://plc:4840");
        assert_eq!(entry.effective_security_mode(), SecurityMode::None);
        entry.use_security = Some(true);
        assert_eq!(entry.effective_security_mode(), SecurityMode::SignAndEncrypt);
        entry.endpoint_security_mode = Some(SecurityMode::Sign);
        assert_eq!(entry.effective_security_mode(), SecurityMode::Sign);
    }

    #[test]
    fn test_propagate_publishing_interval() {
        let mut entry = PublishEntry::new("opc.tcp://plc:4840");
        entry.data_set_publishing_interval = Some(1000);
        let mut own = NodeSpec::new("ns=2;s=B");
        own.opc_publishing_interval = Some(250);
        entry.opc_nodes = Some(vec![NodeSpec::new("ns=2;s=A"), own]);

        entry.propagate_publishing_interval();

        assert_eq!(entry.publishing_interval(), None);
        assert_eq!(entry.nodes()[0].publishing_interval(), Some(Duration::from_secs(1)));
        assert_eq!(entry.nodes()[1].publishing_interval(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_propagate_keeps_interval_without_nodes() {
        let mut entry = PublishEntry::new("opc.tcp://plc:4840");
        entry.data_set_publishing_interval = Some(1000);
        entry.propagate_publishing_interval();
        assert_eq!(entry.publishing_interval(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_legacy_node_id_shape() {
        let json = r#"{ "EndpointUrl": "opc.tcp://plc:4840", "NodeId": { "Identifier": "i=2258" } }"#;
        let entry: PublishEntry = serde_json::from_str(json).unwrap();
        let entry = entry.into_current_shape().unwrap();
        assert!(entry.node_id.is_none());
        assert_eq!(entry.nodes()[0].identifier(), Some("i=2258"));
    }

    #[test]
    fn test_legacy_both_shapes_rejected() {
        let json = r#"{
            "EndpointUrl": "opc.tcp://plc:4840",
            "NodeId": { "Identifier": "i=2258" },
            "OpcNodes": [ { "Id": "i=2259" } ]
        }"#;
        let entry: PublishEntry = serde_json::from_str(json).unwrap();
        let err = entry.into_current_shape().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn test_legacy_neither_shape_is_empty() {
        let entry = PublishEntry::new("opc.tcp://plc:4840")
            .into_current_shape()
            .unwrap();
        assert!(entry.has_no_nodes());
    }

    #[test]
    fn test_identifier_falls_back_to_expanded() {
        let node = NodeSpec {
            expanded_node_id: Some("nsu=http://x;s=A".into()),
            ..Default::default()
        };
        assert_eq!(node.identifier(), Some("nsu=http://x;s=A"));
    }

    #[test]
    fn test_content_filter_of_type() {
        let filter = ContentFilter::of_type("i=2782");
        assert_eq!(filter.elements.len(), 1);
        assert_eq!(filter.elements[0].filter_operator, FilterOperator::OfType);
        assert_eq!(
            filter.elements[0].filter_operands[0].value,
            Some(serde_json::Value::String("i=2782".into()))
        );
    }

    #[test]
    fn test_heartbeat_behavior_wire_name() {
        let json = serde_json::to_string(&HeartbeatBehavior::WatchdogLkg).unwrap();
        assert_eq!(json, "\"WatchdogLKG\"");
    }
}
