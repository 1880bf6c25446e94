//! IFC Vision viewer
//!
//! Native builds ship the `vision` binary; the WASM build starts the viewer
//! on the page's canvas as soon as the module is instantiated.

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// WASM entry point
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    log::info!("[Viewer] Starting");
    ifc_vision_bevy::run_on_canvas(&ifc_vision_bevy::ViewerConfig::default().window.canvas);
}
