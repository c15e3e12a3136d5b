use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use quiz_core::{HttpQuizApi, SessionController, DEFAULT_AUTO_ADVANCE_DELAY};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod orchestration;
mod shell;

use config::load_settings;
use orchestration::run_shell;

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the QA quiz service")]
struct Args {
    /// Config file (defaults to ./quiz_terminal.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    /// Move to the next question automatically after showing feedback.
    #[arg(long)]
    auto_advance: bool,
    #[arg(long)]
    auto_advance_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(ms) = args.auto_advance_ms {
        settings.auto_advance_ms = Some(ms);
    } else if args.auto_advance && settings.auto_advance_ms.is_none() {
        settings.auto_advance_ms = Some(DEFAULT_AUTO_ADVANCE_DELAY.as_millis() as u64);
    }

    let api = HttpQuizApi::new(settings.server_url()?);
    let server_url = api.base_url().to_string();
    let controller = SessionController::new(Arc::new(api), settings.feedback_mode());
    info!(%server_url, mode = ?controller.feedback_mode(), "starting quiz shell");

    let stdin = BufReader::new(tokio::io::stdin());
    run_shell(&controller, stdin, std::io::stdout()).await
}
