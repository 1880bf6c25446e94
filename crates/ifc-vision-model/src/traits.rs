// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for model building
//!
//! The viewer never parses IFC itself; it hands bytes to a [`GeometryEngine`].

use crate::{ModelGeometry, ModelNode, Result, SceneError};
use serde::{Deserialize, Serialize};

/// Progress callback type for build operations
///
/// Receives (phase_name, percent_complete) with percent in `0.0..=100.0`.
pub type ProgressCallback = Box<dyn Fn(&str, f32) + Send>;

/// Engine options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Move the model so its bounds center sits at the world origin
    pub coordinate_to_origin: bool,
    /// Use the faster, less exact boolean operations when tessellating
    pub use_fast_bools: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            coordinate_to_origin: true,
            use_fast_bools: false,
        }
    }
}

/// Geometry engine - entry point for building a model from IFC bytes
///
/// Implementations are run off the main thread, so they must be `Send + Sync`.
///
/// # Example
///
/// ```ignore
/// use ifc_vision_model::{EngineSettings, GeometryEngine};
///
/// let engine: Box<dyn GeometryEngine> = get_engine();
/// let geometry = engine.build(&bytes, &EngineSettings::default(), Box::new(|_, _| {}))?;
/// println!("{} elements", geometry.elements.len());
/// ```
pub trait GeometryEngine: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &str;

    /// Build a model from raw payload bytes
    ///
    /// # Arguments
    /// * `payload` - The IFC file content
    /// * `settings` - Engine options
    /// * `on_progress` - Callback receiving (phase_name, percent_complete)
    fn build(
        &self,
        payload: &[u8],
        settings: &EngineSettings,
        on_progress: ProgressCallback,
    ) -> Result<ModelGeometry>;
}

/// Container of the single model node shown in the viewport
///
/// Only the load controller mutates a scene handle, and only while attaching.
pub trait SceneHandle {
    /// Remove the current model node, if any. No-op on an empty scene.
    fn reset(&mut self);

    /// Attach a model node to an empty scene
    ///
    /// Returns [`SceneError::Occupied`] and leaves the scene untouched if a
    /// model is still attached.
    fn attach(&mut self, model: ModelNode) -> std::result::Result<(), SceneError>;

    /// Currently attached model node
    fn current_model(&self) -> Option<&ModelNode>;
}
