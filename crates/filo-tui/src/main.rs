//! Filo - a terminal dashboard for fleet management.
//!
//! This application provides a fast, keyboard-driven interface for the
//! vehicles, drivers, tasks, mileage records and expenses kept by the
//! fleet backend. Every page except the login page requires a session.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use filo_core::auth::{open_store, Route};
use filo_core::config::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Daily-rotated log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "filo.log";

const USAGE: &str = "\
Usage: filo [COMMAND]

Commands:
  --login     Log in from the command line and store the session
  --logout    Remove the stored session
  --status    Show the API URL and whether a session is stored
  --help      Show this message

Environment:
  FILO_API_URL                    API base URL
  FILO_USERNAME / FILO_PASSWORD   Prefill login credentials
  RUST_LOG                        Log filter (default: warn)";

/// Initialize the tracing subscriber for logging.
///
/// The full-screen UI owns the terminal, so logs go to a daily file in the
/// cache directory. Without a cache directory they go to stderr.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=filo_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok());
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);
    if matches!(command, Some("--help") | Some("-h")) {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let cache_dir = config.cache_dir()?;
    let _log_guard = init_tracing(Some(&cache_dir));
    info!(api_url = %config.base_url(), "Filo starting");

    let store = open_store(config.credential_backend, &cache_dir)?;
    let mut app = App::new(config, store)?;

    if let Some(command) = command {
        return run_command(&mut app, command).await;
    }

    let mut terminal = enter_terminal()?;

    // The guard sends us to the login page when no session is stored
    app.navigate(Route::Dashboard);
    let result = run_app(&mut terminal, &mut app).await;

    leave_terminal(&mut terminal)?;
    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Filo shutting down");
    Ok(())
}

/// One-shot commands that run without the full-screen UI
async fn run_command(app: &mut App, command: &str) -> Result<()> {
    match command {
        "--login" => app.login_interactive().await,
        "--logout" => {
            app.api.logout();
            println!("Logged out.");
            Ok(())
        }
        "--status" => {
            let session = if app.is_authenticated() { "stored" } else { "none" };
            println!("API:     {}", app.config.base_url());
            println!("Session: {}", session);
            Ok(())
        }
        other => Err(anyhow::anyhow!("Unknown argument: {}\n\n{}", other, USAGE)),
    }
}

fn enter_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn leave_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, app: &mut App) -> Result<()> {
    while app.state != AppState::Quitting {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so background results are picked up between keys
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                if handle_input(app, key).await? {
                    break;
                }
            }
        }

        app.check_background_tasks();
    }
    Ok(())
}
