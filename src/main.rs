use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use fadeframe::config::{self, Configuration};
use fadeframe::tasks::files;
use fadeframe::tasks::viewer::{self, ViewerOptions};

#[derive(Debug, Parser)]
#[command(name = "fadeframe", about = "Full-screen cross-fading image slideshow")]
struct Cli {
    /// Image files or directories to play
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Deterministic shuffle seed (overrides the config file)
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Start in a desktop window instead of borderless fullscreen
    #[arg(long)]
    windowed: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("fadeframe={level}").parse().unwrap())
        .add_directive("wgpu=warn".parse().unwrap())
        .add_directive("winit=warn".parse().unwrap());
    fmt().with_env_filter(filter).with_target(true).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match &cli.config {
        Some(path) => config::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Configuration::default(),
    };

    let sources: Vec<PathBuf> = if !cli.paths.is_empty() {
        cli.paths.clone()
    } else if let Some(library) = cfg.library_path.clone() {
        vec![library]
    } else {
        bail!("no images given; pass image files/directories or set library-path in a config");
    };

    let images = files::discover_images(&sources)?;
    info!(count = images.len(), "starting slideshow");

    let options = ViewerOptions {
        start_fullscreen: cfg.start_fullscreen && !cli.windowed,
        shuffle_seed: cli.seed.or(cfg.startup_shuffle_seed),
    };
    viewer::run_windowed(images, options)
}
