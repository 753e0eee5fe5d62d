//! # rat Main Entry Point
//!
//! Parses the command line, loads the mode file and runs the pager on the
//! given command.

use anyhow::{Context as _, Result};
use rat::cmd_args::CommandLineArgs;
use rat::{config, AppController, ModeRegistry};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Log to `RAT_LOG_FILE` when set; the terminal itself belongs to the pager
fn init_tracing() -> Result<()> {
    let Some(path) = config::get_log_file() else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_new(config::get_log_level())
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::rfc_3339())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CommandLineArgs::parse();
    init_tracing()?;

    let modes_path = args
        .modes_file()
        .cloned()
        .unwrap_or_else(config::get_modes_path);
    let registry = ModeRegistry::load(&modes_path)?;
    tracing::info!(
        "starting `{}` with modes [{}] ({} known)",
        args.command(),
        args.modes(),
        registry.len()
    );

    let mut app = AppController::new(
        registry,
        args.modes(),
        args.command(),
        args.context().clone(),
    )?;
    app.run().await
}
