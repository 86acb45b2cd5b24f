use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
    if app.player.is_playing() {
      app.stop_playback().await.context("Failed to stop playback")?;
    }
    return Ok(());
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Results => handle_results_key(app, key).await.context("Failed to handle results key event")?,
  }
  Ok(())
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      // Double-submit guard: don't burn a generation while a search is in
      // flight. run_search itself stays safe under overlap regardless.
      if !app.coordinator.state().busy {
        app.trigger_search();
      }
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if !app.coordinator.state().hits.is_empty() {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.coordinator.state().hits.is_empty() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

async fn handle_results_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Enter => {
      if let Err(e) = app.activate_selected().await {
        app.set_error(format!("Playback error: {}", e));
      }
    }
    KeyCode::Char(' ') => {
      if app.player.is_playing()
        && let Err(e) = app.player.toggle_pause().await
      {
        app.set_error(format!("Pause error: {}", e));
      }
    }
    KeyCode::Down | KeyCode::Char('j') => {
      let count = app.coordinator.state().hits.len();
      if count > 0 {
        let i = app.list_state.selected().map_or(0, |i| (i + 1) % count);
        app.list_state.select(Some(i));
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let count = app.coordinator.state().hits.len();
      if count > 0 {
        let i = app.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
        app.list_state.select(Some(i));
      }
    }
    KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{SearchBackend, SearchError, SearchRequest, SearchResponse};
  use async_trait::async_trait;
  use std::sync::Arc;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tokio_util::sync::CancellationToken;

  /// Backend that never completes until its token fires, counting calls.
  #[derive(Default)]
  struct HangingBackend {
    calls: AtomicUsize,
  }

  #[async_trait]
  impl SearchBackend for HangingBackend {
    async fn search(&self, _req: &SearchRequest, cancel: &CancellationToken) -> Result<SearchResponse, SearchError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      cancel.cancelled().await;
      Err(SearchError::Cancelled)
    }
  }

  fn key(code: KeyCode) -> event::KeyEvent {
    event::KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn char_to_byte_index_handles_multibyte() {
    let s = "a밤c";
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 4);
    assert_eq!(char_to_byte_index(s, 3), 5);
  }

  #[tokio::test]
  async fn enter_is_ignored_while_a_search_is_in_flight() {
    let backend = Arc::new(HangingBackend::default());
    let mut app = App::new(backend.clone(), "http://localhost/media/movie.mp4".to_string());
    app.input = "cat".to_string();
    app.cursor_position = 3;

    handle_key_event(&mut app, key(KeyCode::Enter)).await.unwrap();
    tokio::task::yield_now().await;
    assert!(app.coordinator.state().busy);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    // Still busy: a second Enter must not start another attempt.
    handle_key_event(&mut app, key(KeyCode::Enter)).await.unwrap();
    tokio::task::yield_now().await;
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn typing_edits_around_the_cursor() {
    let backend = Arc::new(HangingBackend::default());
    let mut app = App::new(backend, "http://localhost/media/movie.mp4".to_string());

    for c in "cast".chars() {
      handle_key_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
    }
    assert_eq!(app.input, "cast");

    handle_key_event(&mut app, key(KeyCode::Left)).await.unwrap();
    handle_key_event(&mut app, key(KeyCode::Backspace)).await.unwrap();
    assert_eq!(app.input, "cat");
    assert_eq!(app.cursor_position, 2);
  }

  #[tokio::test]
  async fn esc_clears_input_before_quitting() {
    let backend = Arc::new(HangingBackend::default());
    let mut app = App::new(backend, "http://localhost/media/movie.mp4".to_string());
    app.input = "cat".to_string();
    app.cursor_position = 3;

    handle_key_event(&mut app, key(KeyCode::Esc)).await.unwrap();
    assert!(app.input.is_empty());
    assert!(!app.should_quit);

    handle_key_event(&mut app, key(KeyCode::Esc)).await.unwrap();
    assert!(app.should_quit);
  }
}
