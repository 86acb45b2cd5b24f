mod api;
mod app;
mod config;
mod constants;
mod coordinator;
mod dedupe;
mod input;
mod player;
mod theme;
mod timecode;
mod ui;

use anyhow::Result;
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::HttpSearchClient;
use app::App;
use config::Config;
use constants::constants;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Base URL of the scene search service (e.g. http://127.0.0.1:8000)
  #[arg(short, long, env = "SCENESEEK_SERVER")]
  server: Option<String>,

  /// Movie file name under the service's media mount, or a full URL
  #[arg(short, long, env = "SCENESEEK_MOVIE")]
  movie: Option<String>,
}

// --- Logging ---

/// Route tracing output to a file — the terminal belongs to ratatui.
/// Returns the worker guard; dropping it flushes the writer.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let proj_dirs = directories::ProjectDirs::from("", "", "sceneseek")?;
  let log_dir = proj_dirs.data_local_dir();
  std::fs::create_dir_all(log_dir).ok()?;
  let appender = tracing_appender::rolling::never(log_dir, "sceneseek.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();
  Some(guard)
}

// --- Helpers ---

/// Resolve the playable movie URL: full URLs pass through, bare file names
/// resolve against the service's media mount.
fn movie_url(server: &str, movie: &str) -> String {
  if movie.starts_with("http://") || movie.starts_with("https://") {
    movie.to_string()
  } else {
    format!("{}{}/{}", server.trim_end_matches('/'), constants().media_path, movie)
  }
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _log_guard = init_tracing();

  let config = Config::load();
  let server = args.server.or(config.server_url).unwrap_or_else(|| constants().default_server.clone());
  let movie = args.movie.or(config.movie).unwrap_or_else(|| constants().default_movie.clone());
  info!(server = %server, movie = %movie, "starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &server, &movie).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, server: &str, movie: &str) -> Result<()> {
  let backend = Arc::new(HttpSearchClient::new(server));
  let mut app = App::new(backend, movie_url(server, movie));

  loop {
    app.check_pending();
    app.player.check_mpv_status();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(constants().event_poll_ms))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.player.stop().await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn movie_url_resolves_bare_file_names() {
    assert_eq!(movie_url("http://127.0.0.1:8000", "movie.mp4"), "http://127.0.0.1:8000/media/movie.mp4");
    assert_eq!(movie_url("http://127.0.0.1:8000/", "movie.mp4"), "http://127.0.0.1:8000/media/movie.mp4");
  }

  #[test]
  fn movie_url_passes_full_urls_through() {
    assert_eq!(movie_url("http://127.0.0.1:8000", "https://cdn.example/m.mp4"), "https://cdn.example/m.mp4");
  }
}
