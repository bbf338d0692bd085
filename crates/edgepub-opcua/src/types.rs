// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA identifiers used by the type catalog.
//!
//! - **NodeId**: the four identifier kinds with string parsing
//! - **QualifiedName**: namespace-qualified browse names
//! - **NodeClass**: node classes relevant to type walking
//! - [`ids`]: well-known standard node ids
//!
//! # Examples
//!
//! ```
//! use edgepub_opcua::types::{ids, NodeId};
//!
//! let parsed: NodeId = "i=2782".parse().unwrap();
//! assert_eq!(parsed, ids::CONDITION_TYPE);
//! assert_eq!(NodeId::string(2, "Boiler").to_string(), "ns=2;s=Boiler");
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::OpcUaError;

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier.
///
/// Serialized in its text form (`ns=2;s=Name`, `i=2041`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Namespace index (0 = standard namespace).
    pub namespace_index: u16,

    /// The identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node id.
    #[inline]
    pub const fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node id.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node id.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque node id.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Returns the null node id (ns=0, i=0).
    #[inline]
    pub const fn null() -> Self {
        Self::numeric(0, 0)
    }

    /// Returns `true` if this is the null node id.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, NodeIdentifier::Numeric(0))
    }

    /// Returns the numeric value if this is a numeric identifier.
    #[inline]
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Text form: `ns=<namespace>;{i|s|g|b}=<identifier>`, namespace omitted
    /// when zero.
    pub fn to_opc_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = OpcUaError;

    /// Parses `ns=2;i=1001`, `ns=2;s=Name`, `ns=2;g=<uuid>`, `ns=2;b=<base64>`
    /// and the same forms without a namespace prefix.
    ///
    /// Expanded `nsu=<uri>;...` ids are rejected: mapping a URI to an index
    /// needs the server's namespace table, which a catalog does not carry.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("nsu=") {
            return Err(OpcUaError::invalid_node_id(
                s,
                "Namespace URI node ids require a namespace table",
            ));
        }

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, id) = rest
                    .split_once(';')
                    .ok_or_else(|| OpcUaError::invalid_node_id(s, "Missing identifier after namespace"))?;
                let ns: u16 = ns
                    .parse()
                    .map_err(|_| OpcUaError::invalid_node_id(s, "Invalid namespace index"))?;
                (ns, id)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            let value: u32 = id
                .parse()
                .map_err(|_| OpcUaError::invalid_node_id(s, "Invalid numeric identifier"))?;
            NodeIdentifier::Numeric(value)
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            let uuid = Uuid::parse_str(id)
                .map_err(|e| OpcUaError::invalid_node_id(s, format!("Invalid GUID: {}", e)))?;
            NodeIdentifier::Guid(uuid)
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            let bytes = BASE64
                .decode(id)
                .map_err(|e| OpcUaError::invalid_node_id(s, format!("Invalid base64: {}", e)))?;
            NodeIdentifier::Opaque(bytes)
        } else {
            return Err(OpcUaError::invalid_node_id(
                s,
                "Unknown identifier type. Expected i=, s=, g=, or b=",
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_opc_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The four identifier kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),
    /// String identifier.
    String(String),
    /// GUID identifier.
    Guid(Uuid),
    /// Opaque identifier.
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// QualifiedName
// =============================================================================

/// A browse name qualified by namespace index.
///
/// Text form is `Name` in namespace 0 and `<ns>:Name` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Namespace index.
    pub namespace_index: u16,
    /// Name.
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }

    /// Creates a name in the standard namespace.
    pub fn standard(name: impl Into<String>) -> Self {
        Self::new(0, name)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index == 0 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.namespace_index, self.name)
        }
    }
}

impl FromStr for QualifiedName {
    type Err = OpcUaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((ns, name)) = s.split_once(':') {
            if let Ok(ns) = ns.parse::<u16>() {
                return Ok(Self::new(ns, name));
            }
        }
        Ok(Self::standard(s))
    }
}

impl Serialize for QualifiedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QualifiedName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// NodeClass
// =============================================================================

/// OPC UA node classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeClass {
    /// Object node.
    Object,
    /// Variable node.
    Variable,
    /// Method node.
    Method,
    /// Object type node.
    #[default]
    ObjectType,
    /// Variable type node.
    VariableType,
    /// Reference type node.
    ReferenceType,
    /// Data type node.
    DataType,
    /// View node.
    View,
}

impl NodeClass {
    /// Returns `true` for classes that carry instance declarations.
    pub const fn is_type(&self) -> bool {
        matches!(self, Self::ObjectType | Self::VariableType)
    }
}

// =============================================================================
// Well-known ids
// =============================================================================

/// Standard node ids (OPC UA Part 5).
pub mod ids {
    use super::NodeId;

    /// HasSubtype - i=45.
    pub const HAS_SUBTYPE: NodeId = NodeId::numeric(0, 45);
    /// HasProperty - i=46.
    pub const HAS_PROPERTY: NodeId = NodeId::numeric(0, 46);
    /// HasComponent - i=47.
    pub const HAS_COMPONENT: NodeId = NodeId::numeric(0, 47);

    /// BaseObjectType - i=58.
    pub const BASE_OBJECT_TYPE: NodeId = NodeId::numeric(0, 58);
    /// BaseEventType - i=2041.
    pub const BASE_EVENT_TYPE: NodeId = NodeId::numeric(0, 2041);
    /// BaseModelChangeEventType - i=2132.
    pub const BASE_MODEL_CHANGE_EVENT_TYPE: NodeId = NodeId::numeric(0, 2132);
    /// GeneralModelChangeEventType - i=2133.
    pub const GENERAL_MODEL_CHANGE_EVENT_TYPE: NodeId = NodeId::numeric(0, 2133);
    /// ConditionType - i=2782.
    pub const CONDITION_TYPE: NodeId = NodeId::numeric(0, 2782);
    /// AcknowledgeableConditionType - i=2881.
    pub const ACKNOWLEDGEABLE_CONDITION_TYPE: NodeId = NodeId::numeric(0, 2881);
    /// AlarmConditionType - i=2915.
    pub const ALARM_CONDITION_TYPE: NodeId = NodeId::numeric(0, 2915);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("i=2041".parse::<NodeId>().unwrap(), ids::BASE_EVENT_TYPE);
        assert_eq!(
            "ns=2;s=Boiler.Temp".parse::<NodeId>().unwrap(),
            NodeId::string(2, "Boiler.Temp")
        );
        let guid = "ns=3;g=550e8400-e29b-41d4-a716-446655440000"
            .parse::<NodeId>()
            .unwrap();
        assert_eq!(guid.namespace_index, 3);
        let opaque = "ns=1;b=SGVsbG8=".parse::<NodeId>().unwrap();
        assert_eq!(opaque.identifier, NodeIdentifier::Opaque(b"Hello".to_vec()));
    }

    #[test]
    fn test_parse_errors() {
        assert!("ns=x;i=1".parse::<NodeId>().is_err());
        assert!("ns=2".parse::<NodeId>().is_err());
        assert!("i=abc".parse::<NodeId>().is_err());
        assert!("q=1".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_namespace_uri_form_rejected() {
        let err = "nsu=http://vendor.example/UA/;i=1001"
            .parse::<NodeId>()
            .unwrap_err();
        match err {
            OpcUaError::InvalidNodeId { node_id, reason } => {
                assert!(node_id.starts_with("nsu="));
                assert!(reason.contains("namespace table"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ids::CONDITION_TYPE.to_string(), "i=2782");
        assert_eq!(NodeId::numeric(2, 7).to_string(), "ns=2;i=7");
        assert!(NodeId::null().is_null());
    }

    #[test]
    fn test_serde_text_form() {
        let json = serde_json::to_string(&NodeId::string(2, "A")).unwrap();
        assert_eq!(json, "\"ns=2;s=A\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NodeId::string(2, "A"));
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(QualifiedName::standard("Message").to_string(), "Message");
        let qn: QualifiedName = "3:Pressure".parse().unwrap();
        assert_eq!(qn, QualifiedName::new(3, "Pressure"));
        assert_eq!(qn.to_string(), "3:Pressure");
        let plain: QualifiedName = "Enabled:State".parse().unwrap();
        assert_eq!(plain.namespace_index, 0);
    }
}
