mod app;
mod surface;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use grindbot_core::config::{self, AppConfig};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let path = config::ensure_default_config()?;
    let config = AppConfig::load_from(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(config = %path.display(), channel = config.bot.channel_id, "starting grindbot");

    let mut app = app::GrindbotApp::new(config);
    app.run().await
}

/// Log to `logs/grindbot.log` only; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("grindbot.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
