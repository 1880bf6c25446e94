//! Command-line interface of the desktop viewer

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "vision")]
#[command(about = "IFC model viewer", long_about = None)]
pub struct Cli {
    /// IFC file to load on startup
    pub file: Option<PathBuf>,

    /// JSON configuration file (overrides IFC_VISION_CONFIG)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,
}
