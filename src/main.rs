mod app;
mod config;
mod event;
mod input;
mod remote;
mod selection;
mod store;
mod sync;
mod tasks;
mod ui;

use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "densha")]
#[command(about = "A terminal client for Jira with an offline-first local cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/densha/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Jira project key to use
  #[arg(short, long)]
  project: Option<String>,
}

/// Log to a file; stdout belongs to the terminal UI.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let dir = dirs::data_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("densha");
  std::fs::create_dir_all(&dir)?;

  let file = tracing_appender::rolling::never(dir, "densha.log");
  let (writer, guard) = tracing_appender::non_blocking(file);
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("densha=info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();
  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_tracing()?;

  let config = config::Config::load(args.config.as_deref())?;

  // Override project if specified on command line
  let config = if let Some(project) = args.project {
    config::Config {
      default_project: Some(project),
      ..config
    }
  } else {
    config
  };

  let service = Arc::new(remote::JiraService::new(&config)?);
  let store = Arc::new(store::Store::open()?);

  // Setup terminal
  enable_raw_mode()?;
  stdout().execute(EnterAlternateScreen)?;
  let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

  let mut events = event::EventHandler::new(Duration::from_millis(250));
  let mut app = app::App::new(service, store, config, events.sender());
  app.spawn_sync();

  while !app.should_quit {
    terminal.draw(|frame| ui::draw(&mut app, frame))?;

    if let Some(event) = events.next().await {
      app.on_event(event);
    }
  }

  // Cleanup terminal
  disable_raw_mode()?;
  stdout().execute(LeaveAlternateScreen)?;

  Ok(())
}
