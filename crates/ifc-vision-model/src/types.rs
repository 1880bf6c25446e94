// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core identifiers and IFC type classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe entity identifier
///
/// Wraps the raw IFC entity ID (e.g., #123 becomes EntityId(123))
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

/// IFC schema declared in `FILE_SCHEMA`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
pub enum IfcSchema {
    #[default]
    Ifc2x3,
    Ifc4,
    Ifc4x1,
    Ifc4x2,
    Ifc4x3,
}

impl IfcSchema {
    /// Parse a schema identifier such as `IFC2X3` or `IFC4X3_ADD2`
    ///
    /// Returns `None` for schemas the viewer does not support.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        // Addenda and technical corrigenda share the base schema
        let base = upper.split('_').next().unwrap_or_default();
        match base {
            "IFC2X3" => Some(IfcSchema::Ifc2x3),
            "IFC4" => Some(IfcSchema::Ifc4),
            "IFC4X1" => Some(IfcSchema::Ifc4x1),
            "IFC4X2" => Some(IfcSchema::Ifc4x2),
            "IFC4X3" => Some(IfcSchema::Ifc4x3),
            _ => None,
        }
    }

    /// Canonical identifier
    pub fn name(&self) -> &'static str {
        match self {
            IfcSchema::Ifc2x3 => "IFC2X3",
            IfcSchema::Ifc4 => "IFC4",
            IfcSchema::Ifc4x1 => "IFC4X1",
            IfcSchema::Ifc4x2 => "IFC4X2",
            IfcSchema::Ifc4x3 => "IFC4X3",
        }
    }
}

impl fmt::Display for IfcSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Building element types that carry a shape representation
const GEOMETRY_TYPES: &[&str] = &[
    "IFCWALL",
    "IFCWALLSTANDARDCASE",
    "IFCCURTAINWALL",
    "IFCSLAB",
    "IFCROOF",
    "IFCBEAM",
    "IFCCOLUMN",
    "IFCDOOR",
    "IFCWINDOW",
    "IFCSTAIR",
    "IFCSTAIRFLIGHT",
    "IFCRAMP",
    "IFCRAMPFLIGHT",
    "IFCRAILING",
    "IFCCOVERING",
    "IFCPLATE",
    "IFCMEMBER",
    "IFCFOOTING",
    "IFCPILE",
    "IFCBUILDINGELEMENTPROXY",
    "IFCFURNISHINGELEMENT",
    "IFCFURNITURE",
    "IFCDISTRIBUTIONELEMENT",
    "IFCFLOWTERMINAL",
    "IFCFLOWSEGMENT",
    "IFCFLOWFITTING",
    "IFCSPACE",
];

/// Check whether an entity type name denotes a geometry-bearing element
///
/// Matching is case-insensitive.
pub fn has_geometry_by_name(type_name: &str) -> bool {
    GEOMETRY_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(type_name))
}

/// Color for elements without a type-specific one
pub const DEFAULT_COLOR: [f32; 4] = [0.7, 0.7, 0.7, 1.0];

/// Get default color for an IFC type name
///
/// Provides consistent colors for different element types.
pub fn default_color(type_name: &str) -> [f32; 4] {
    match type_name.to_ascii_uppercase().as_str() {
        "IFCWALL" | "IFCWALLSTANDARDCASE" => [0.85, 0.80, 0.70, 1.0],
        "IFCCURTAINWALL" => [0.6, 0.7, 0.8, 0.7],
        "IFCSLAB" => [0.75, 0.75, 0.75, 1.0],
        "IFCROOF" => [0.72, 0.45, 0.35, 1.0],
        "IFCBEAM" | "IFCPLATE" => [0.55, 0.60, 0.65, 1.0],
        "IFCCOLUMN" | "IFCMEMBER" => [0.60, 0.60, 0.60, 1.0],
        "IFCDOOR" => [0.55, 0.40, 0.25, 1.0],
        "IFCWINDOW" => [0.7, 0.85, 0.95, 0.5],
        "IFCSPACE" => [0.6, 0.8, 0.6, 0.2],
        "IFCFURNISHINGELEMENT" | "IFCFURNITURE" => [0.65, 0.50, 0.35, 1.0],
        "IFCBUILDINGELEMENTPROXY" => [0.7, 0.5, 0.8, 1.0],
        _ => DEFAULT_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_parse() {
        assert_eq!(IfcSchema::parse("IFC2X3"), Some(IfcSchema::Ifc2x3));
        assert_eq!(IfcSchema::parse("ifc4"), Some(IfcSchema::Ifc4));
        assert_eq!(IfcSchema::parse("IFC4X3_ADD2"), Some(IfcSchema::Ifc4x3));
        assert_eq!(IfcSchema::parse("IFC2X2_FINAL"), None);
        assert_eq!(IfcSchema::parse(""), None);
    }

    #[test]
    fn test_geometry_classification() {
        assert!(has_geometry_by_name("IFCWALL"));
        assert!(has_geometry_by_name("IfcWindow"));
        assert!(!has_geometry_by_name("IFCPROJECT"));
        assert!(!has_geometry_by_name("IFCCARTESIANPOINT"));
    }

    #[test]
    fn test_window_is_translucent() {
        assert!(default_color("IFCWINDOW")[3] < 1.0);
        assert_eq!(default_color("IFCUNKNOWN"), DEFAULT_COLOR);
        assert_eq!(default_color("IfcWall"), default_color("IFCWALL"));
    }
}
