//! Viewer configuration
//!
//! Every field has a default so a partial JSON file (or none at all) is valid.

use anyhow::Context;
use bevy::prelude::*;
use ifc_vision_model::EngineSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a JSON configuration file (native)
pub const CONFIG_ENV_VAR: &str = "IFC_VISION_CONFIG";

/// Top-level viewer configuration
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Verbose logging
    pub debug: bool,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub grid: GridConfig,
    pub lights: LightsConfig,
    pub engine: EngineSettings,
    pub loader: LoaderConfig,
    pub chooser: ChooserConfig,
    pub notifications: NotificationConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// CSS selector of the canvas to render into (WASM)
    pub canvas: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vision".to_string(),
            width: 1280,
            height: 720,
            canvas: "#bevy-canvas".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Orbit damping factor (0.0 = instant, 1.0 = never moves)
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [8.0, 13.0, 15.0],
            target: [-2.0, 0.0, 0.0],
            damping: 0.9,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub visible: bool,
    /// Edge length of the grid in world units
    pub size: f32,
    pub divisions: u32,
    pub show_axes: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            visible: true,
            size: 50.0,
            divisions: 30,
            show_axes: true,
        }
    }
}

impl GridConfig {
    /// Size of one grid cell
    pub fn spacing(&self) -> f32 {
        self.size / self.divisions.max(1) as f32
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    /// Ambient intensity relative to full white
    pub ambient: f32,
    pub directional_position: [f32; 3],
    pub directional_target: [f32; 3],
    pub directional_illuminance: f32,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            directional_position: [0.0, 10.0, 0.0],
            directional_target: [-5.0, 0.0, 0.0],
            directional_illuminance: 10_000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Run the engine on the async compute pool instead of the load task
    pub offload_to_worker: bool,
    /// Upper bound for payloads fetched over HTTP
    pub max_download_bytes: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            offload_to_worker: true,
            max_download_bytes: 1024 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChooserConfig {
    /// Dropbox app key; the chooser script is injected when set (WASM)
    pub app_key: Option<String>,
    pub extensions: Vec<String>,
    /// Appended to chosen links to get the raw file
    pub download_suffix: String,
}

impl Default for ChooserConfig {
    fn default() -> Self {
        Self {
            app_key: None,
            extensions: vec![".ifc".to_string()],
            download_suffix: "?dl=1".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Most recent notifications kept on screen
    pub max_visible: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { max_visible: 5 }
    }
}

impl ViewerConfig {
    /// Parse a JSON configuration
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid viewer configuration")
    }

    /// Read a JSON configuration file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Resolve the configuration for this run
    ///
    /// An explicit path wins over `IFC_VISION_CONFIG`; without either the
    /// defaults are used. The debug flag is also raised by [`crate::is_debug`].
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(std::path::PathBuf::from);
        let mut config = match path.or(env_path.as_deref()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.debug |= crate::is_debug();
        Ok(config)
    }

    /// Log level for Bevy's `LogPlugin`
    pub fn log_level(&self) -> bevy::log::Level {
        if self.debug {
            bevy::log::Level::DEBUG
        } else {
            bevy::log::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.window.title, "Vision");
        assert_eq!(config.camera.fov, 75.0);
        assert_eq!(config.camera.position, [8.0, 13.0, 15.0]);
        assert_eq!(config.grid.size, 50.0);
        assert_eq!(config.grid.divisions, 30);
        assert_eq!(config.lights.ambient, 0.5);
        assert!(config.engine.coordinate_to_origin);
        assert!(!config.engine.use_fast_bools);
        assert!(config.loader.offload_to_worker);
        assert_eq!(config.chooser.download_suffix, "?dl=1");
        assert_eq!(config.notifications.max_visible, 5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ViewerConfig::from_json(
            r#"{ "debug": true, "grid": { "divisions": 10 }, "engine": { "use_fast_bools": true } }"#,
        )
        .unwrap();
        assert!(config.debug);
        assert_eq!(config.grid.divisions, 10);
        assert_eq!(config.grid.size, 50.0);
        assert!(config.engine.use_fast_bools);
        assert!(config.engine.coordinate_to_origin);
        assert_eq!(config.log_level(), bevy::log::Level::DEBUG);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = ViewerConfig::from_json("{ \"grid\": 3 }").unwrap_err();
        assert!(err.to_string().contains("invalid viewer configuration"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = ViewerConfig::from_file(Path::new("/nonexistent/vision.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn test_grid_spacing() {
        let grid = GridConfig::default();
        assert!((grid.spacing() - 50.0 / 30.0).abs() < 1e-6);
    }
}
