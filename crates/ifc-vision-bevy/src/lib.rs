//! IFC Vision Bevy viewer
//!
//! Acquires IFC models (file drop or cloud picker), builds them off the main
//! schedule and shows exactly one model at a time in an orbit viewport.
//!
//! ```text
//! drop / picker ──► SourceAdapter ──► LoadController ──► LoaderFacade
//!                                          │                  │
//!                                          ▼                  ▼
//!                               Notifications, progress   GeometryEngine
//!                                          │
//!                                          ▼
//!                                 ModelScene ──► render sync
//! ```

pub mod config;
pub mod controller;
pub mod facade;
pub mod fetch;
pub mod loader;
pub mod notify;
pub mod scene;
pub mod source;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
pub mod web;

use bevy::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

// Re-exports
pub use bevy::app::AppExit;
pub use config::{ViewerConfig, CONFIG_ENV_VAR};
pub use controller::{ControllerEvent, LoadController};
pub use facade::{LoadProgress, LoaderFacade, PendingLoad};
pub use fetch::{HttpFetcher, PayloadFetcher};
pub use loader::{
    CloudPickerBackend, LoadLocalFile, LoadRejected, LoadStateChanged, LoaderPlugin,
    OpenCloudPicker,
};
pub use notify::{NotificationMessage, Notifications, ProgressIndicator};
pub use scene::{IfcElementMesh, IfcModelRoot, ModelScene, ScenePlugin};
pub use source::{
    ChooserOptions, ChosenFile, CloudChooser, CloudPicker, LocalDrop, SourceAdapter,
};
pub use viewport::{MainCamera, OrbitCamera, ViewportPlugin};

/// Global debug mode flag (URL parameter `?debug=1`, `DEBUG` env var)
static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

/// Check if debug mode is enabled
pub fn is_debug() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

/// Force debug mode (the `--debug` flag)
pub fn set_debug(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

/// Initialize debug mode from URL parameters
#[cfg(target_arch = "wasm32")]
pub fn init_debug_from_url() {
    if let Some(window) = web_sys::window() {
        if let Ok(search) = window.location().search() {
            if search.contains("debug=1") || search.contains("debug=true") {
                DEBUG_MODE.store(true, Ordering::Relaxed);
                web_sys::console::log_1(&"[Bevy] Debug mode enabled".into());
            }
        }
    }
}

/// Native: check env var
#[cfg(not(target_arch = "wasm32"))]
pub fn init_debug_from_url() {
    if std::env::var_os("DEBUG").is_some() {
        DEBUG_MODE.store(true, Ordering::Relaxed);
    }
}

/// Main viewer plugin - combines all subsystems
///
/// Expects [`ViewerConfig`] to be inserted first; defaults are used otherwise.
pub struct IfcVisionPlugin;

impl Plugin for IfcVisionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerConfig>()
            .add_plugins((ScenePlugin, ViewportPlugin, LoaderPlugin));

        #[cfg(target_arch = "wasm32")]
        app.add_plugins(web::WebSourcesPlugin);
    }
}

fn default_plugins(config: &ViewerConfig, window: Window) -> impl PluginGroup {
    DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(window),
            ..default()
        })
        .set(bevy::log::LogPlugin {
            level: config.log_level(),
            ..default()
        })
}

fn build_app(config: ViewerConfig, window: Window) -> App {
    log::debug!("[Bevy] Config: {:?}", config);
    let mut app = App::new();
    app.add_plugins(default_plugins(&config, window))
        .insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.15)))
        .insert_resource(config)
        .add_plugins(IfcVisionPlugin);
    app
}

/// Run the viewer on a canvas element (WASM)
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn run_on_canvas(canvas_selector: &str) {
    console_error_panic_hook::set_once();
    init_debug_from_url();

    let mut config = ViewerConfig::default();
    config.debug |= is_debug();
    config.window.canvas = canvas_selector.to_string();

    let window = Window {
        title: config.window.title.clone(),
        canvas: Some(canvas_selector.to_string()),
        fit_canvas_to_parent: true,
        prevent_default_event_handling: false,
        ..default()
    };
    build_app(config, window).run();
}

/// Run the viewer in a native window (desktop)
///
/// `initial_file` is loaded as soon as the app starts.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_native(config: ViewerConfig, initial_file: Option<std::path::PathBuf>) -> AppExit {
    let window = Window {
        title: config.window.title.clone(),
        resolution: (config.window.width, config.window.height).into(),
        ..default()
    };
    let mut app = build_app(config, window);
    if let Some(path) = initial_file {
        app.world_mut().write_message(LoadLocalFile { path });
    }
    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag() {
        set_debug(true);
        assert!(is_debug());
        assert!(ViewerConfig::load(None).unwrap().debug);
        set_debug(false);
        assert!(!is_debug());
    }
}
