//! Dovuchcha Subdomains - a terminal client for browsing and ordering subdomains.
//!
//! The session is restored (or completed from a `--callback` URL) before the
//! first frame is drawn, then kept fresh in the background while the UI runs.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use subdomains_core::auth::{CallbackNavigator, FileStore, KeyringStore, MemoryStore, TokenStore};
use subdomains_core::config::StorageBackend;
use subdomains_core::{ApiClient, Config, SessionManager, SessionOptions};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_NAME: &str = "subdomains.log";

const USAGE: &str = "\
Usage: subdomains [OPTIONS]

Options:
  --callback <URL>     Complete a login from the address the browser landed on
  --ephemeral          Keep the session in memory only
  --print-login-url    Print the login address and exit
  -h, --help           Show this help";

/// Command-line options
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    callback: Option<String>,
    ephemeral: bool,
    print_login_url: bool,
    help: bool,
}

impl CliArgs {
    fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cli = CliArgs::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--callback" => {
                    let value = args.next().context("--callback needs a URL")?;
                    cli.callback = Some(value);
                }
                "--ephemeral" => cli.ephemeral = true,
                "--print-login-url" => cli.print_login_url = true,
                "-h" | "--help" => cli.help = true,
                other => match other.strip_prefix("--callback=") {
                    Some(value) => cli.callback = Some(value.to_string()),
                    None => bail!("Unknown argument: {}\n\n{}", other, USAGE),
                },
            }
        }
        Ok(cli)
    }
}

/// Initialize the tracing subscriber.
///
/// Logs go to a file in the cache directory so they never draw over the UI.
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if std::fs::create_dir_all(log_dir).is_err() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::sink))
            .with(filter)
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Some(guard)
}

fn build_store(config: &Config, ephemeral: bool) -> Result<Arc<dyn TokenStore>> {
    let backend = if ephemeral { StorageBackend::Memory } else { config.storage };
    let store: Arc<dyn TokenStore> = match backend {
        StorageBackend::File => Arc::new(FileStore::new(&config.cache_dir()?)),
        StorageBackend::Keyring => Arc::new(KeyringStore::new()),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = CliArgs::parse(std::env::args().skip(1))?;
    if cli.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let (config, config_error) = match Config::load() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Initialize logging
    let _log_guard = config.cache_dir().ok().and_then(|dir| init_tracing(&dir));
    info!("Subdomains client starting");
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let navigator = Arc::new(CallbackNavigator::from_callback(cli.callback.as_deref())?);
    let api = ApiClient::from_config(&config)?;
    let session = SessionManager::new(
        build_store(&config, cli.ephemeral)?,
        Arc::new(api.clone()),
        navigator,
        SessionOptions::from_config(&config),
    );

    if cli.print_login_url {
        let url = session.request_login()?;
        println!("{}", url);
        return Ok(());
    }

    // The first access token is in hand before the first frame
    session.initialize().await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, session, api);
    if let Some(ref reason) = app.session_view.last_error {
        app.status_message = Some(reason.clone());
    }
    app.refresh_subdomains();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Subdomains client shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    if handle_input(app, key) {
                        return Ok(());
                    }
                }
                Event::Paste(text) => app.handle_paste(&text),
                _ => {}
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_args() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_callback_forms() {
        let url = "http://localhost:5173/?refresh_token=abc";
        assert_eq!(parse(&["--callback", url]).unwrap().callback.as_deref(), Some(url));
        let joined = format!("--callback={}", url);
        assert_eq!(parse(&[joined.as_str()]).unwrap().callback.as_deref(), Some(url));
        assert!(parse(&["--callback"]).is_err());
    }

    #[test]
    fn test_flags() {
        let cli = parse(&["--ephemeral", "--print-login-url"]).unwrap();
        assert!(cli.ephemeral);
        assert!(cli.print_login_url);
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn test_ephemeral_uses_memory_store() {
        let config = Config {
            storage: StorageBackend::Keyring,
            ..Config::default()
        };
        let store = build_store(&config, true).unwrap();
        assert_eq!(store.get("refresh_token").unwrap(), None);
    }
}
