use anyhow::Context;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use linernotes::{AppConfig, Services, Session};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::OpenOptions,
    io::{self, Stdout},
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::App;

mod app;
mod markdown;
mod ui;

/// Logs go to a file; anything written to the terminal would tear up the UI.
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    if let Err(e) = init_logging(&config.log_file) {
        eprintln!("warning: {e:#}, continuing without logs");
    }
    info!("Starting with {:?}", config);

    let services = Services::from_config(&config).context("failed to set up services")?;
    info!(
        "Track sources: {:?}, completion backends: {:?}",
        services.list_sources(),
        services.list_completion()
    );
    let session = Arc::new(Session::new(services));

    let metadata = match session.resolve().await {
        Ok(metadata) => metadata,
        Err(e) => {
            eprintln!("Could not read the current track: {e}");
            eprintln!("Make sure your music player is running and playing a song.");
            std::process::exit(1);
        }
    };
    if !config.has_api_key() {
        warn!("No API credential set, every completion call will fail");
    }

    let cycle = session.start(metadata);
    let mut app = App::new(Arc::clone(&session), cycle.abort_handle());

    let mut terminal = setup_terminal().context("failed to set up terminal")?;
    let result = app.run(&mut terminal, config.tick()).await;
    restore_terminal(&mut terminal).context("failed to restore terminal")?;

    result
}
