//! Viewport: camera, lights, ground grid and damped orbit controls
//!
//! Left drag orbits, right drag pans, the wheel zooms. Releasing the mouse
//! lets the orbit coast to a stop.

use crate::config::ViewerConfig;
use bevy::ecs::message::MessageReader;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

/// Viewport plugin
pub struct ViewportPlugin;

impl Plugin for ViewportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerConfig>();
        let orbit = OrbitCamera::from_config(app.world().resource::<ViewerConfig>());
        app.insert_resource(orbit)
            .add_systems(Startup, setup_viewport)
            .add_systems(
                Update,
                (orbit_input_system, orbit_update_system, draw_grid_system).chain(),
            );
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Orbit camera state
#[derive(Resource, Clone, Debug)]
pub struct OrbitCamera {
    /// Point to orbit around
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Horizontal rotation
    pub azimuth: f32,
    /// Vertical rotation
    pub elevation: f32,
    /// Damping factor for smooth movement (0.0 = instant, 1.0 = never moves)
    pub damping: f32,
    /// Angular velocity for orbit inertia
    pub angular_velocity: Vec2,
    /// Field of view in degrees
    pub fov: f32,
    pub orbit_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_sensitivity: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

impl OrbitCamera {
    /// Spherical coordinates of the configured camera position around the target
    pub fn from_config(config: &ViewerConfig) -> Self {
        let target = Vec3::from_array(config.camera.target);
        let offset = Vec3::from_array(config.camera.position) - target;
        let distance = offset.length().max(0.01);
        Self {
            target,
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            damping: config.camera.damping,
            angular_velocity: Vec2::ZERO,
            fov: config.camera.fov,
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.01,
            zoom_sensitivity: 0.1,
        }
    }

    /// Camera position from spherical coordinates
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Zoom and recenter so the whole box is in view
    pub fn fit_bounds(&mut self, min: Vec3, max: Vec3) {
        let diagonal = (max - min).length();
        let fov_rad = self.fov.to_radians();
        self.target = (min + max) * 0.5;
        self.distance = (diagonal / (2.0 * (fov_rad / 2.0).tan())).max(1.0);
        self.angular_velocity = Vec2::ZERO;
    }

    fn orbit(&mut self, delta: Vec2) {
        self.azimuth -= delta.x;
        // Clamp elevation to avoid gimbal lock
        self.elevation = (self.elevation + delta.y).clamp(-1.5, 1.5);
    }
}

/// Spawn camera and lights
fn setup_viewport(mut commands: Commands, config: Res<ViewerConfig>, orbit: Res<OrbitCamera>) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(orbit.position()).looking_at(orbit.target, Vec3::Y),
        Projection::Perspective(PerspectiveProjection {
            fov: config.camera.fov.to_radians(),
            near: config.camera.near,
            far: config.camera.far,
            ..default()
        }),
        MainCamera,
    ));

    // Relative intensity to Bevy brightness units
    commands.spawn(AmbientLight {
        color: Color::WHITE,
        brightness: config.lights.ambient * 160.0,
        affects_lightmapped_meshes: true,
    });

    commands.spawn((
        DirectionalLight {
            color: Color::WHITE,
            illuminance: config.lights.directional_illuminance,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(Vec3::from_array(config.lights.directional_position))
            .looking_at(Vec3::from_array(config.lights.directional_target), Vec3::Y),
    ));
}

/// Handle mouse input for camera control
fn orbit_input_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mut orbit: ResMut<OrbitCamera>,
) {
    let delta: Vec2 = mouse_motion.read().map(|ev| ev.delta).sum();

    if mouse_button.pressed(MouseButton::Left) {
        let step = Vec2::new(delta.x, -delta.y) * orbit.orbit_sensitivity;
        orbit.orbit(step);
        // Store angular velocity for inertia
        orbit.angular_velocity = step;
    } else if mouse_button.pressed(MouseButton::Right) {
        let right = Vec3::new(orbit.azimuth.cos(), 0.0, -orbit.azimuth.sin());
        let scale = orbit.pan_sensitivity * orbit.distance * 0.1;
        let pan = -right * delta.x * scale + Vec3::Y * delta.y * scale;
        orbit.target += pan;
    } else {
        let damping = orbit.damping;
        orbit.angular_velocity *= damping;
        if orbit.angular_velocity.length() > 0.0001 {
            let velocity = orbit.angular_velocity;
            orbit.orbit(velocity);
        }
    }

    for ev in mouse_wheel.read() {
        let zoom = ev.y * orbit.zoom_sensitivity;
        orbit.distance = (orbit.distance * (1.0 - zoom)).clamp(0.5, 50_000.0);
    }
}

/// Update camera transform
fn orbit_update_system(
    orbit: Res<OrbitCamera>,
    mut camera: Query<&mut Transform, With<MainCamera>>,
) {
    if let Ok(mut transform) = camera.single_mut() {
        let position = orbit.position();
        transform.translation = transform
            .translation
            .lerp(position, 1.0 - orbit.damping.powi(2));
        transform.look_at(orbit.target, Vec3::Y);
    }
}

/// Ground grid and axes helper
fn draw_grid_system(mut gizmos: Gizmos, config: Res<ViewerConfig>) {
    let grid = &config.grid;
    if grid.visible {
        gizmos.grid(
            Isometry3d::from_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
            UVec2::splat(grid.divisions),
            Vec2::splat(grid.spacing()),
            Color::srgba(0.4, 0.4, 0.4, 0.5),
        );
    }
    if grid.show_axes {
        gizmos.axes(Transform::IDENTITY, grid.size * 0.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_reproduces_position() {
        let config = ViewerConfig::default();
        let orbit = OrbitCamera::from_config(&config);
        let position = orbit.position();
        let expected = Vec3::from_array(config.camera.position);
        assert!((position - expected).length() < 1e-3);
        assert_eq!(orbit.target, Vec3::new(-2.0, 0.0, 0.0));
    }

    #[test]
    fn test_fit_bounds_centers_target() {
        let mut orbit = OrbitCamera::default();
        orbit.angular_velocity = Vec2::ONE;
        orbit.fit_bounds(Vec3::new(-10.0, 0.0, -4.0), Vec3::new(10.0, 6.0, 4.0));
        assert_eq!(orbit.target, Vec3::new(0.0, 3.0, 0.0));
        assert!(orbit.distance > 10.0);
        assert_eq!(orbit.angular_velocity, Vec2::ZERO);
    }

    #[test]
    fn test_elevation_is_clamped() {
        let mut orbit = OrbitCamera::default();
        orbit.orbit(Vec2::new(0.0, 10.0));
        assert_eq!(orbit.elevation, 1.5);
    }
}
