mod api;
mod app;
mod buffer;
mod config;
mod error;
mod models;
mod parser;
mod session;
mod store;
mod ui;
mod view;

use crate::api::{login, ApiClient};
use crate::app::App;
use crate::config::{Config, Credentials};
use crate::session::Session;
use crate::store::TodoStore;
use crate::ui::run_app;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

// The terminal belongs to the UI, so logs go to a file
fn init_tracing(log_path: &Path) -> io::Result<()> {
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = File::options().create(true).append(true).open(log_path)?;
    let filter = EnvFilter::try_from_env("DOTRACK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    init_tracing(&config.log_path())?;
    info!(api_url = %config.api_url, "starting dotrack");

    let token = match config.credentials()? {
        Credentials::Token(token) => token,
        Credentials::Login { email, password } => {
            info!(%email, "no token configured, signing in");
            login(&config.api_url, &email, &password).await?
        }
    };
    let session = Session::new(config.api_url.clone(), token);

    let mut app = App::new(TodoStore::new(ApiClient::new(session)));
    info!(session = ?app.store.api().session(), "session ready");
    app.refresh().await;

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    info!("exiting dotrack");
    Ok(())
}
