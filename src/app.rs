use anyhow::Result;
use ratatui::widgets::ListState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::api::SearchBackend;
use crate::config::Config;
use crate::constants::constants;
use crate::coordinator::SearchCoordinator;
use crate::player::ScenePlayer;
use crate::theme::THEMES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Results,
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub coordinator: SearchCoordinator,
  pub list_state: ListState,
  pub player: ScenePlayer,
  pub last_error: Option<String>,
  pub should_quit: bool,
  pub input_scroll: usize,
  /// When the last error was set — used for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(backend: Arc<dyn SearchBackend>, movie_url: String) -> Self {
    let config = Config::load();
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name).unwrap_or(0) } else { 0 };

    Self {
      input: String::new(),
      cursor_position: 0,
      mode: AppMode::Input,
      theme_index,
      coordinator: SearchCoordinator::new(backend),
      list_state: ListState::default(),
      player: ScenePlayer::new(movie_url),
      last_error: None,
      should_quit: false,
      input_scroll: 0,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index is always bounded by modular arithmetic in next_theme()
    // and clamped to THEMES.len() - 1 on initialization.
    &THEMES[self.theme_index]
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages once the dismiss window passes.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  fn save_config(&self) {
    let mut config = Config::load();
    config.theme_name = Some(self.theme().name.to_string());
    config.save();
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  /// Fold completed search attempts into state; called every tick.
  pub fn check_pending(&mut self) {
    if self.coordinator.poll_outcomes() {
      if self.coordinator.state().hits.is_empty() {
        self.list_state.select(None);
      } else {
        self.list_state.select(Some(0));
        self.mode = AppMode::Results;
      }
    }
  }

  /// Kick off a search for the current input line.
  ///
  /// The coordinator ignores blank input and supersedes any attempt still
  /// in flight, so this is safe to call at any time.
  pub fn trigger_search(&mut self) {
    self.clear_error();
    let query = self.input.clone();
    self.coordinator.run_search(&query);
  }

  /// Seek the player to the selected hit and mark it active.
  pub async fn activate_selected(&mut self) -> Result<()> {
    let Some(selected) = self.list_state.selected() else { return Ok(()) };
    let Some(hit) = self.coordinator.state().hits.get(selected) else { return Ok(()) };

    let start_sec = hit.seek_seconds();
    info!(title = %hit.title, start_sec, "scene activated");
    self.player.seek_and_play(start_sec).await?;
    self.coordinator.set_active(selected);
    Ok(())
  }

  /// Stop playback and drop the active-hit marker.
  pub async fn stop_playback(&mut self) -> Result<()> {
    self.player.stop().await?;
    self.coordinator.clear_active();
    Ok(())
  }
}
