use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gridblast::config::Settings;
use gridblast::engine::Engine;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gridblast", about = "Grid bomb game")]
struct Args {
    /// Settings file (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Asset root holding material textures
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// RNG seed for the block layout
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // RUST_LOG wins over the built-in default.
    let default_filter = if args.debug { "gridblast=debug,wgpu=warn" } else { "gridblast=info,wgpu=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let mut settings = match &args.config {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "could not load settings");
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    if args.seed.is_some() {
        settings.game.seed = args.seed;
    }

    let mut builder = Engine::builder()
        .with_title("gridblast")
        .with_size(1280, 720)
        .with_settings(settings);
    if let Some(dir) = args.assets {
        builder = builder.with_asset_root(dir);
    }

    match builder.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "gridblast exited with an error");
            ExitCode::FAILURE
        }
    }
}
