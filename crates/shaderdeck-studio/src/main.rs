use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use winit::dpi::PhysicalSize;

use shaderdeck_config::AppConfig;
use shaderdeck_engine::device::GpuInit;
use shaderdeck_engine::logging::{init_logging, LoggingConfig};
use shaderdeck_engine::window::{Runtime, RuntimeConfig};

mod app;

use app::ShaderDeck;

/// Live multi-pass fragment shader playground.
///
/// Right click or F5 reloads the config and every shader.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Pass configuration (JSON)
    #[arg(default_value = "config.json")]
    config: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::default());

    let config = AppConfig::load_or_default(&cli.config);
    let (width, height) = config.window_size();

    let runtime = RuntimeConfig {
        title: format!("shaderdeck - {}", cli.config.display()),
        initial_size: PhysicalSize::new(width, height),
        ..RuntimeConfig::default()
    };

    // Shaders write display values directly; an sRGB surface would re-encode them.
    let gpu_init = GpuInit {
        prefer_srgb: false,
        ..GpuInit::default()
    };

    Runtime::run(runtime, gpu_init, ShaderDeck::new(cli.config, config))
}
