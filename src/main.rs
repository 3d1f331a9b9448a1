mod add;
mod app;
mod config;
mod launch;
mod store;
mod timer;
mod tui;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::Settings;
use launch::ProcessLauncher;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::RecordStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "game-manager.log";

#[derive(Parser, Debug)]
#[command(name = config::APP_NAME, version, about = "Launch your games and keep track of how long you play them")]
struct Cli {
    /// Register a new game instead of opening the launcher
    #[arg(short, long)]
    edit: bool,

    /// Directory holding gameinfo.csv (defaults to the user config directory)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

/// Send logs to a file in the data directory; the TUI owns the terminal.
fn init_tracing(data_dir: &Path, settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let path = data_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir, std::env::var(config::DIR_ENV).ok())?;
    store::ensure_dir(&data_dir)?;
    let settings = Settings::load(&data_dir)?;
    init_tracing(&data_dir, &settings)?;
    info!(data_dir = %data_dir.display(), "starting");

    let result = run(&data_dir, &settings, cli.edit);
    if let Err(err) = &result {
        error!(error = %format!("{:#}", err), "fatal");
    }
    result
}

fn run(data_dir: &Path, settings: &Settings, edit: bool) -> Result<()> {
    let mut store = RecordStore::load(&data_dir.join(store::STORE_FILE))?;

    if edit {
        let stdin = io::stdin();
        add::add_game(&mut store, &mut stdin.lock(), &mut io::stdout())?;
        return Ok(());
    }

    let mut app = App::new(
        store,
        Box::new(ProcessLauncher),
        settings.date_format.clone(),
    );
    run_session(&mut app)
}

fn run_session(app: &mut App) -> Result<()> {
    // Initialize terminal
    let mut terminal = tui::TuiGuard::new()?;

    terminal.draw(|f| ui::render(f, app))?;

    // Main event loop
    while app.is_running() {
        // Blocks until a key arrives; a launch blocks until the game exits
        let event_occurred = app.handle_event()?;

        if app.take_clear_request() {
            terminal.clear()?;
        }
        if event_occurred {
            terminal.draw(|f| ui::render(f, app))?;
        }
    }

    info!("session loop stopped");
    Ok(())
}
