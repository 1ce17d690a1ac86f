use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use kiosk_core::config::{api_key_from_env, Config};
use kiosk_core::{GeminiClient, TextGenerator};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod picker;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "kiosk")]
#[command(about = "Terminal kiosk for prompting Gemini with text, images, and video")]
#[command(version)]
struct Cli {
    /// Gemini model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL of the Gemini API
    #[arg(long)]
    api_base: Option<String>,

    /// Directory the image/video picker opens in
    #[arg(long)]
    media_dir: Option<PathBuf>,

    /// Where to write logs (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("gemini-kiosk").join("kiosk.log"))
        .unwrap_or_else(|| PathBuf::from("kiosk.log"))
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_file.clone().unwrap_or_else(default_log_path))?;

    let config = Config::load()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable config file");
            Config::default()
        })
        .with_overrides(cli.model, cli.api_base, cli.media_dir);

    // Missing credential is not fatal: the UI shows the banner instead
    let api_key = api_key_from_env();
    let api_key_missing = api_key.is_none();
    if api_key_missing {
        tracing::error!("no API key in API_KEY or GOOGLE_API_KEY; submissions disabled");
    }

    let generator: Arc<dyn TextGenerator> = Arc::new(
        GeminiClient::new(api_key.as_deref().unwrap_or_default())
            .with_model(config.model())
            .with_base_url(config.api_base()),
    );

    tracing::info!(
        model = config.model(),
        api_base = config.api_base(),
        api_key_missing,
        "starting kiosk"
    );

    let mut events = EventHandler::new();
    let mut app = App::new(
        generator,
        config.model(),
        config.media_dir(),
        api_key_missing,
        events.sender(),
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    tracing::info!("kiosk exited");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
