// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model node and the engine output it wraps

use crate::{EntityId, IfcSchema, SourceDescriptor, DEFAULT_COLOR};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fixed name of the model node, used to find and remove it from the scene
pub const MODEL_NODE_NAME: &str = "IFCModel";

/// GPU-ready mesh data for one element
///
/// Positions are in IFC (Z-up) coordinates, scaled to metres.
#[derive(Clone, Debug)]
pub struct MeshData {
    /// Element this mesh belongs to
    pub element_id: EntityId,
    /// Vertex positions as flattened [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Vertex normals as flattened [nx, ny, nz, ...]
    pub normals: Vec<f32>,
    /// Triangle indices
    pub indices: Vec<u32>,
    /// Base color [r, g, b, a]
    pub color: [f32; 4],
}

impl Default for MeshData {
    fn default() -> Self {
        Self {
            element_id: EntityId::default(),
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            color: DEFAULT_COLOR,
        }
    }
}

impl MeshData {
    /// Check if mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds of the vertex positions
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_positions(&self.positions)
    }
}

/// Axis-aligned bounding box in IFC coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    /// Compute bounds from flattened positions
    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        let mut chunks = positions.chunks_exact(3);
        let first = chunks.next()?;
        let mut bounds = Bounds {
            min: [first[0], first[1], first[2]],
            max: [first[0], first[1], first[2]],
        };
        for p in chunks {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(p[axis]);
                bounds.max[axis] = bounds.max[axis].max(p[axis]);
            }
        }
        Some(bounds)
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let mut out = *self;
        for axis in 0..3 {
            out.min[axis] = out.min[axis].min(other.min[axis]);
            out.max[axis] = out.max[axis].max(other.max[axis]);
        }
        out
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }
}

/// Catalog entry for a geometry-bearing building element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub id: EntityId,
    /// Upper-case STEP type name (e.g., "IFCWALL")
    pub ifc_type: String,
    pub global_id: Option<String>,
    pub name: Option<String>,
}

/// Model metadata extracted from the IFC header
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelMetadata {
    pub schema: IfcSchema,
    pub file_name: Option<String>,
    pub timestamp: Option<String>,
    pub author: Option<String>,
    pub organization: Option<String>,
    pub preprocessor_version: Option<String>,
    pub originating_system: Option<String>,
    /// Number of entity instances in the DATA section
    pub entity_count: usize,
}

/// Everything an engine produces for one payload
#[derive(Clone, Debug, Default)]
pub struct ModelGeometry {
    pub metadata: ModelMetadata,
    pub elements: Vec<ElementInfo>,
    pub meshes: Vec<MeshData>,
    /// File length unit to metres
    pub unit_scale: f64,
}

impl ModelGeometry {
    /// Bounds of every mesh, if any mesh has vertices
    pub fn bounds(&self) -> Option<Bounds> {
        self.meshes
            .iter()
            .filter_map(MeshData::bounds)
            .reduce(|a, b| a.union(&b))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }
}

/// The model attached to the scene
///
/// `origin` is kept for diagnostics only; the scene owns the node.
#[derive(Clone, Debug)]
pub struct ModelNode {
    pub name: String,
    pub origin: SourceDescriptor,
    pub geometry: Arc<ModelGeometry>,
}

impl ModelNode {
    /// Wrap engine output under the fixed model name
    pub fn new(origin: SourceDescriptor, geometry: ModelGeometry) -> Self {
        Self {
            name: MODEL_NODE_NAME.to_string(),
            origin,
            geometry: Arc::new(geometry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceOrigin;

    fn mesh(positions: Vec<f32>) -> MeshData {
        MeshData {
            positions,
            ..Default::default()
        }
    }

    #[test]
    fn test_bounds_from_positions() {
        let b = Bounds::from_positions(&[0.0, 1.0, 2.0, -1.0, 5.0, 0.5]).unwrap();
        assert_eq!(b.min, [-1.0, 1.0, 0.5]);
        assert_eq!(b.max, [0.0, 5.0, 2.0]);
        assert_eq!(b.center(), [-0.5, 3.0, 1.25]);
        assert!(Bounds::from_positions(&[]).is_none());
    }

    #[test]
    fn test_geometry_bounds_union() {
        let geometry = ModelGeometry {
            meshes: vec![
                mesh(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]),
                mesh(vec![]),
                mesh(vec![4.0, -2.0, 3.0]),
            ],
            ..Default::default()
        };
        let b = geometry.bounds().unwrap();
        assert_eq!(b.min, [0.0, -2.0, 0.0]);
        assert_eq!(b.max, [4.0, 1.0, 3.0]);
    }

    #[test]
    fn test_default_mesh_is_opaque() {
        let mesh = MeshData::default();
        assert_eq!(mesh.color, DEFAULT_COLOR);
        assert_eq!(mesh.color[3], 1.0);
    }

    #[test]
    fn test_model_node_uses_fixed_name() {
        let origin = SourceDescriptor::new(SourceOrigin::LocalFile, "a.ifc", Some(10));
        let node = ModelNode::new(origin.clone(), ModelGeometry::default());
        assert_eq!(node.name, MODEL_NODE_NAME);
        assert_eq!(node.origin, origin);
    }
}
