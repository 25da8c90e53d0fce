//! inkwire command-line entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Recognize handwritten strokes over a persistent WebSocket session.
#[derive(Debug, Parser)]
#[command(name = "inkwire", version)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/inkwire/config.toml).
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Recognition endpoint to use.
    #[arg(long, value_enum, default_value_t = Mode::Math)]
    pub mode: Mode,

    /// Strokes per request; 0 sends every stroke in a single request.
    #[arg(long, default_value_t = 0)]
    pub batch: usize,

    /// Send a reset frame after the last result.
    #[arg(long)]
    pub reset: bool,

    /// JSON file holding an array of strokes (`{"x": [...], "y": [...], "t": [...]}`).
    pub strokes: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Math,
    Text,
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting inkwire");

    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    let recognition = config::load(&path)?;
    tracing::info!(host = %recognition.server.host, path = %path.display(), "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(cli, recognition))
}
