//! `vision` - desktop IFC viewer

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use clap::Parser;
    use ifc_vision_bevy::{AppExit, ViewerConfig};
    use ifc_vision_viewer::cli::Cli;

    let cli = Cli::parse();

    ifc_vision_bevy::init_debug_from_url();
    if cli.debug {
        ifc_vision_bevy::set_debug(true);
    }
    let config =
        ViewerConfig::load(cli.config.as_deref()).context("failed to load viewer configuration")?;

    if let Some(path) = &cli.file {
        anyhow::ensure!(path.is_file(), "no such file: {}", path.display());
    }

    match ifc_vision_bevy::run_native(config, cli.file) {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("viewer exited with code {}", code),
    }
}

// The WASM build starts from the library's `#[wasm_bindgen(start)]`
#[cfg(target_arch = "wasm32")]
fn main() {}
