use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use glint::{AssetSource, Color, DebugFlag, RenderConfig, RunOptions};

#[derive(Parser)]
#[command(name = "glint", about = "A rotating mesh, natural light and a vignette")]
struct Cli {
    /// Attach the FPS counter, orbit controls, parameter panel and screenshot button
    #[arg(long)]
    debug: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// STL file to spin instead of the built-in torus knot
    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Background color as #rgb or #rrggbb
    #[arg(long, value_parser = Color::from_hex)]
    background: Option<Color>,

    /// Render without the vignette pass
    #[arg(long)]
    no_postprocessing: bool,

    /// TTF/OTF font for overlay text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Directory screenshots are written to
    #[arg(long, default_value = ".")]
    screenshot_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let debug = DebugFlag(cli.debug);
    let mut config = RenderConfig::demo(debug)
        .size(cli.width, cli.height)
        .screenshot_dir(cli.screenshot_dir);
    if let Some(background) = cli.background {
        config = config.background(background);
    }
    if cli.no_postprocessing {
        config = config.postprocessing(false);
    }
    if let Some(font) = cli.font {
        config = config.font(font);
    }

    let mut options = RunOptions {
        debug,
        ..RunOptions::default()
    };
    if let Some(model) = cli.model {
        options.model = AssetSource::StlFile(model);
    }

    let debug_on = debug.is_on();
    tracing::info!(debug = debug_on, "glint starting");
    glint::run(config, options)
}
