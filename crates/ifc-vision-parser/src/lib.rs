// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Vision Parser - streaming STEP engine
//!
//! This crate reads IFC (STEP) payloads and implements the
//! [`GeometryEngine`](ifc_vision_model::GeometryEngine) trait from
//! `ifc-vision-model`.
//!
//! # Features
//!
//! - **Fast tokenization** using `nom` combinators
//! - **SIMD-accelerated scanning** using `memchr`
//! - **Progress reporting** throttled to whole-percent steps
//! - **Unit detection** for millimetre and imperial projects
//!
//! # Example
//!
//! ```ignore
//! use ifc_vision_parser::StepEngine;
//! use ifc_vision_model::{EngineSettings, GeometryEngine};
//!
//! let engine = StepEngine::new();
//! let geometry = engine.build(&bytes, &EngineSettings::default(), Box::new(|phase, pct| {
//!     println!("{phase}: {pct:.0}%");
//! }))?;
//! println!("Found {} elements", geometry.elements.len());
//! ```

mod engine;
mod header;
mod scanner;
mod tokenizer;
mod units;

pub use engine::StepEngine;
pub use header::{parse_header, validate_envelope};
pub use scanner::{EntityScanner, EntitySpan};
pub use tokenizer::{parse_instance, parse_parameters, Token};
pub use units::UnitTable;
