//! Scene handle and its mirror in the ECS world
//!
//! [`ModelScene`] is the only place the loaded model lives. The sync system
//! rebuilds the render entities whenever the scene revision changes.

use crate::config::ViewerConfig;
use crate::viewport::OrbitCamera;
use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use ifc_vision_model::{
    default_color, ElementInfo, MeshData, ModelNode, SceneError, SceneHandle,
};

/// Plugin mirroring [`ModelScene`] into renderable entities
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelScene>()
            .init_resource::<ViewerConfig>()
            .add_systems(Update, sync_model_scene_system);
    }
}

/// The single live scene; holds zero or one model node
#[derive(Resource, Default)]
pub struct ModelScene {
    current: Option<ModelNode>,
    /// Bumped on every mutation so the sync system can detect changes
    revision: u64,
}

impl ModelScene {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

impl SceneHandle for ModelScene {
    fn reset(&mut self) {
        if let Some(old) = self.current.take() {
            log::debug!(
                "[Scene] Removed {} ({})",
                old.name,
                old.origin.display_name
            );
            self.revision += 1;
        }
    }

    fn attach(&mut self, model: ModelNode) -> Result<(), SceneError> {
        if let Some(current) = &self.current {
            return Err(SceneError::Occupied(current.name.clone()));
        }
        log::debug!(
            "[Scene] Attached {} from {}",
            model.name,
            model.origin.display_name
        );
        self.current = Some(model);
        self.revision += 1;
        Ok(())
    }

    fn current_model(&self) -> Option<&ModelNode> {
        self.current.as_ref()
    }
}

/// Root entity of the rendered model
#[derive(Component)]
pub struct IfcModelRoot {
    pub revision: u64,
}

/// One rendered element mesh
#[derive(Component)]
pub struct IfcElementMesh {
    pub element_id: u32,
}

/// IFC is Z-up, Bevy is Y-up
fn to_y_up(p: [f32; 3]) -> [f32; 3] {
    [p[0], p[2], -p[1]]
}

/// Build a Bevy mesh from engine output, converting to Y-up
pub fn build_mesh(data: &MeshData) -> Mesh {
    let positions: Vec<[f32; 3]> = data
        .positions
        .chunks_exact(3)
        .map(|p| to_y_up([p[0], p[1], p[2]]))
        .collect();

    let normals: Vec<[f32; 3]> = if data.normals.len() == data.positions.len() {
        data.normals
            .chunks_exact(3)
            .map(|n| to_y_up([n[0], n[1], n[2]]))
            .collect()
    } else {
        compute_flat_normals(&positions, &data.indices)
    };

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(data.indices.clone()));
    mesh
}

/// Color to render a mesh with
///
/// Engines that leave the color fully transparent get the element type's
/// default color instead.
pub fn mesh_color(data: &MeshData, elements: &[ElementInfo]) -> [f32; 4] {
    if data.color[3] > 0.0 {
        return data.color;
    }
    let ifc_type = elements
        .iter()
        .find(|e| e.id == data.element_id)
        .map_or("", |e| e.ifc_type.as_str());
    default_color(ifc_type)
}

/// Accumulate face normals per vertex when the engine gives none
fn compute_flat_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let p0 = Vec3::from_array(positions[i0]);
        let face = (Vec3::from_array(positions[i1]) - p0).cross(Vec3::from_array(positions[i2]) - p0);
        for idx in [i0, i1, i2] {
            normals[idx] += face;
        }
    }

    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

/// Rebuild the rendered model when the scene changes
fn sync_model_scene_system(
    mut commands: Commands,
    scene: Res<ModelScene>,
    config: Res<ViewerConfig>,
    roots: Query<Entity, With<IfcModelRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut orbit: Option<ResMut<OrbitCamera>>,
    mut synced: Local<u64>,
) {
    if scene.revision() == *synced {
        return;
    }
    *synced = scene.revision();

    // The scene holds at most one model, so there is at most one root
    for root in roots.iter() {
        commands.entity(root).despawn();
    }

    let Some(model) = scene.current_model() else {
        return;
    };
    let geometry = &model.geometry;

    // Offset that moves the bounds center to the origin, in Y-up space
    let bounds = geometry.bounds();
    let center = bounds
        .map(|b| Vec3::from_array(to_y_up(b.center())))
        .unwrap_or(Vec3::ZERO);
    let offset = if config.engine.coordinate_to_origin {
        -center
    } else {
        Vec3::ZERO
    };

    commands
        .spawn((
            Name::new(model.name.clone()),
            IfcModelRoot {
                revision: scene.revision(),
            },
            Transform::from_translation(offset),
            Visibility::default(),
        ))
        .with_children(|parent| {
            for data in geometry.meshes.iter().filter(|m| !m.is_empty()) {
                let [r, g, b, a] = mesh_color(data, &geometry.elements);
                let material = StandardMaterial {
                    base_color: Color::srgba(r, g, b, a),
                    perceptual_roughness: 0.6,
                    reflectance: 0.3,
                    double_sided: true,
                    cull_mode: None,
                    alpha_mode: if a < 1.0 {
                        AlphaMode::Blend
                    } else {
                        AlphaMode::Opaque
                    },
                    ..default()
                };
                parent.spawn((
                    Mesh3d(meshes.add(build_mesh(data))),
                    MeshMaterial3d(materials.add(material)),
                    Transform::default(),
                    IfcElementMesh {
                        element_id: data.element_id.0,
                    },
                ));
            }
        });

    log::info!(
        "[Scene] Rendering {}: {} meshes, {} triangles",
        model.origin.display_name,
        geometry.meshes.len(),
        geometry.triangle_count()
    );

    if let (Some(orbit), Some(b)) = (orbit.as_mut(), bounds) {
        let min = Vec3::from_array(to_y_up(b.min));
        let max = Vec3::from_array(to_y_up(b.max));
        orbit.fit_bounds(min.min(max) + offset, min.max(max) + offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_vision_model::{
        EntityId, ModelGeometry, SourceDescriptor, SourceOrigin, MODEL_NODE_NAME,
    };

    fn triangle(id: u32) -> MeshData {
        MeshData {
            element_id: EntityId(id),
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: Vec::new(),
            indices: vec![0, 1, 2],
            color: [0.7, 0.7, 0.7, 1.0],
        }
    }

    fn element(id: u32, ifc_type: &str) -> ElementInfo {
        ElementInfo {
            id: EntityId(id),
            ifc_type: ifc_type.to_string(),
            global_id: None,
            name: None,
        }
    }

    fn node(name: &str, meshes: Vec<MeshData>) -> ModelNode {
        ModelNode::new(
            SourceDescriptor::new(SourceOrigin::LocalFile, name, None),
            ModelGeometry {
                meshes,
                unit_scale: 1.0,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut scene = ModelScene::default();
        scene.reset();
        scene.reset();
        assert!(scene.is_empty());
        assert_eq!(scene.revision(), 0);
    }

    #[test]
    fn test_attach_requires_empty_scene() {
        let mut scene = ModelScene::default();
        scene.attach(node("a.ifc", vec![])).unwrap();

        let err = scene.attach(node("b.ifc", vec![])).unwrap_err();
        assert_eq!(err, SceneError::Occupied(MODEL_NODE_NAME.to_string()));
        assert_eq!(
            scene.current_model().unwrap().origin.display_name,
            "a.ifc"
        );

        scene.reset();
        scene.attach(node("b.ifc", vec![])).unwrap();
        assert_eq!(
            scene.current_model().unwrap().origin.display_name,
            "b.ifc"
        );
    }

    #[test]
    fn test_build_mesh_converts_to_y_up() {
        let mesh = build_mesh(&MeshData {
            positions: vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        });
        let positions = mesh
            .attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|attr| attr.as_float3())
            .unwrap();
        assert_eq!(positions[0], [1.0, 3.0, -2.0]);
        assert_eq!(mesh.indices().unwrap().len(), 3);
    }

    #[test]
    fn test_flat_normals_are_unit_length() {
        let normals = compute_flat_normals(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [5.0, 5.0, 5.0]],
            &[0, 1, 2],
        );
        assert!((Vec3::from_array(normals[0]).length() - 1.0).abs() < 1e-5);
        // Unreferenced vertex falls back to up
        assert_eq!(normals[3], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_transparent_color_falls_back_to_type_color() {
        let elements = vec![element(1, "IFCWALL"), element(2, "IFCWINDOW")];
        let mut mesh = triangle(1);
        assert_eq!(mesh_color(&mesh, &elements), [0.7, 0.7, 0.7, 1.0]);

        mesh.color = [0.0; 4];
        assert_eq!(mesh_color(&mesh, &elements), default_color("IFCWALL"));
        mesh.element_id = EntityId(2);
        assert_eq!(mesh_color(&mesh, &elements), default_color("IFCWINDOW"));
        // Not in the catalog
        mesh.element_id = EntityId(9);
        assert_eq!(mesh_color(&mesh, &elements)[3], 1.0);
    }

    fn headless_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .add_plugins(ScenePlugin);
        app
    }

    fn roots(app: &mut App) -> Vec<(String, usize)> {
        let world = app.world_mut();
        let mut query = world.query_filtered::<(&Name, Option<&Children>), With<IfcModelRoot>>();
        query
            .iter(world)
            .map(|(name, children)| (name.to_string(), children.map_or(0, |c| c.len())))
            .collect()
    }

    #[test]
    fn test_sync_keeps_a_single_root() {
        let mut app = headless_app();
        app.update();
        assert!(roots(&mut app).is_empty());

        {
            let mut scene = app.world_mut().resource_mut::<ModelScene>();
            scene.attach(node("a.ifc", vec![triangle(1), triangle(2)])).unwrap();
        }
        app.update();
        assert_eq!(roots(&mut app), vec![(MODEL_NODE_NAME.to_string(), 2)]);

        {
            let mut scene = app.world_mut().resource_mut::<ModelScene>();
            scene.reset();
            scene.attach(node("b.ifc", vec![triangle(3)])).unwrap();
        }
        app.update();
        assert_eq!(roots(&mut app), vec![(MODEL_NODE_NAME.to_string(), 1)]);
    }

    #[test]
    fn test_sync_never_spawns_invisible_materials() {
        let mut app = headless_app();
        let geometry = ModelGeometry {
            elements: vec![element(1, "IFCWALL")],
            meshes: vec![
                MeshData {
                    color: [0.0; 4],
                    ..triangle(1)
                },
                MeshData {
                    color: [0.0; 4],
                    ..triangle(2)
                },
                triangle(3),
            ],
            unit_scale: 1.0,
            ..Default::default()
        };
        let origin = SourceDescriptor::new(SourceOrigin::LocalFile, "a.ifc", None);
        app.world_mut()
            .resource_mut::<ModelScene>()
            .attach(ModelNode::new(origin, geometry))
            .unwrap();
        app.update();

        let world = app.world_mut();
        let handles: Vec<Handle<StandardMaterial>> = world
            .query::<&MeshMaterial3d<StandardMaterial>>()
            .iter(world)
            .map(|m| m.0.clone())
            .collect();
        assert_eq!(handles.len(), 3);
        let materials = world.resource::<Assets<StandardMaterial>>();
        for handle in &handles {
            let material = materials.get(handle).unwrap();
            assert!(material.base_color.alpha() > 0.0);
        }
    }

    #[test]
    fn test_sync_removes_root_on_reset() {
        let mut app = headless_app();
        app.world_mut()
            .resource_mut::<ModelScene>()
            .attach(node("a.ifc", vec![triangle(1)]))
            .unwrap();
        app.update();
        assert_eq!(roots(&mut app).len(), 1);

        app.world_mut().resource_mut::<ModelScene>().reset();
        app.update();
        assert!(roots(&mut app).is_empty());
    }
}
