// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Vision Model - Shared types and traits for model acquisition
//!
//! This crate provides the vocabulary shared by the geometry engine, the loader
//! and the viewer. It has no rendering or platform dependencies.
//!
//! # Architecture
//!
//! - [`GeometryEngine`] - Turns raw IFC bytes into [`ModelGeometry`], reporting progress
//! - [`SourceDescriptor`] / [`ResolvedSource`] - Where a payload comes from, before and after resolution
//! - [`ModelNode`] - The single model the scene holds, named [`MODEL_NODE_NAME`]
//! - [`SceneHandle`] - Container owning zero or one [`ModelNode`]
//! - [`LoadState`] - States of one acquisition attempt
//! - [`Notification`] / [`NotificationSink`] - User-facing milestones
//! - [`LoadError`] - Error taxonomy surfaced at the controller boundary
//!
//! # Example
//!
//! ```ignore
//! use ifc_vision_model::{EngineSettings, GeometryEngine};
//!
//! let engine: Box<dyn GeometryEngine> = get_engine();
//! let geometry = engine.build(&bytes, &EngineSettings::default(), Box::new(|phase, pct| {
//!     println!("{phase}: {pct}%");
//! }))?;
//! println!("Schema: {}", geometry.metadata.schema);
//! ```

pub mod error;
pub mod model;
pub mod notification;
pub mod source;
pub mod state;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use model::*;
pub use notification::*;
pub use source::*;
pub use state::*;
pub use traits::*;
pub use types::*;
