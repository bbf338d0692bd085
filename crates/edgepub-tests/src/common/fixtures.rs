// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built entries and catalogs shared across suites.

use edgepub_core::PublishEntry;
use edgepub_opcua::{ids, CatalogNode, NodeId, QualifiedName, StaticTypeCatalog};

use super::builders::EntryBuilder;

/// Endpoint used by most fixtures.
pub const PLC_ENDPOINT: &str = "opc.tcp://plc-01:4840";

/// Second endpoint.
pub const MIXER_ENDPOINT: &str = "opc.tcp://mixer:4840";

/// Vendor alarm type deriving from `ConditionType`.
pub const VENDOR_ALARM_TYPE: NodeId = NodeId::numeric(2, 5000);

/// Vendor property declared on the alarm type.
pub const VENDOR_SEVERITY: NodeId = NodeId::numeric(2, 5001);

// =============================================================================
// Entry Fixtures
// =============================================================================

/// Publish requests.
pub struct EntryFixtures;

impl EntryFixtures {
    /// Two temperature nodes on the PLC.
    pub fn temperatures() -> PublishEntry {
        EntryBuilder::new(PLC_ENDPOINT)
            .group("plant")
            .writer("temperatures")
            .node("ns=2;s=Line1.Temp")
            .node("ns=2;s=Line2.Temp")
            .build()
    }

    /// Nodes on the PLC split across two publishing intervals.
    pub fn mixed_intervals() -> PublishEntry {
        EntryBuilder::new(PLC_ENDPOINT)
            .group("plant")
            .writer("mixed")
            .node_every("ns=2;s=Fast.1", 100)
            .node_every("ns=2;s=Fast.2", 100)
            .node_every("ns=2;s=Slow.1", 5000)
            .build()
    }

    /// An event subscription on the mixer using the base event type.
    pub fn mixer_events() -> PublishEntry {
        EntryBuilder::new(MIXER_ENDPOINT)
            .writer("events")
            .event("i=2253", "i=2041")
            .build()
    }

    /// A condition subscription on the mixer.
    pub fn mixer_conditions() -> PublishEntry {
        EntryBuilder::new(MIXER_ENDPOINT)
            .writer("conditions")
            .condition("i=2253", "i=2782", 10)
            .build()
    }
}

// =============================================================================
// Catalog Fixtures
// =============================================================================

/// Type catalogs.
pub struct CatalogFixtures;

impl CatalogFixtures {
    /// The standard catalog plus a vendor alarm type with one property.
    pub fn with_vendor_alarm() -> StaticTypeCatalog {
        let mut catalog = StaticTypeCatalog::standard();
        catalog.insert(
            CatalogNode::object_type(VENDOR_ALARM_TYPE, "VendorAlarmType", Some(ids::CONDITION_TYPE))
                .with_property(VENDOR_SEVERITY),
        );
        catalog.insert(CatalogNode::variable(
            VENDOR_SEVERITY,
            QualifiedName::new(2, "VendorSeverity"),
        ));
        catalog
    }

    /// The vendor alarm type as catalog JSON.
    pub fn vendor_alarm_json() -> String {
        let nodes = vec![
            CatalogNode::object_type(VENDOR_ALARM_TYPE, "VendorAlarmType", Some(ids::CONDITION_TYPE))
                .with_property(VENDOR_SEVERITY),
            CatalogNode::variable(VENDOR_SEVERITY, QualifiedName::new(2, "VendorSeverity")),
        ];
        serde_json::to_string_pretty(&nodes).expect("catalog nodes serialize")
    }
}
