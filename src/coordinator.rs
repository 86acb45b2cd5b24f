//! Asynchronous search-request coordinator.
//!
//! Owns every piece of mutable search-session state and guarantees the UI
//! only ever reflects the most recently initiated search. Each attempt
//! carries a monotonically increasing generation; an outcome arriving for
//! an older generation is discarded outright, so response arrival order
//! never matters. A busy flag alone can't do this — it can't tell attempt
//! #2's response apart from attempt #1's late one.
//!
//! All state mutation happens on the event-loop task: spawned transport
//! tasks only talk back through the outcome channel, drained by
//! `poll_outcomes` each tick.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{SearchBackend, SearchError, SearchRequest, SearchResponse, SceneHit};
use crate::constants::constants;
use crate::dedupe::dedupe;

/// Search-session state rendered by the UI. Mutated only by the coordinator.
#[derive(Default)]
pub struct SearchState {
  pub busy: bool,
  pub status: Option<String>,
  pub hits: Vec<SceneHit>,
  /// Index of the hit the player was last sought to, if any.
  pub active: Option<usize>,
}

struct AttemptOutcome {
  generation: u64,
  result: Result<SearchResponse, SearchError>,
}

pub struct SearchCoordinator {
  backend: Arc<dyn SearchBackend>,
  /// Generation of the current attempt; 0 before the first search.
  generation: u64,
  /// Cancellation handle for the in-flight attempt, if any.
  cancel: Option<CancellationToken>,
  outcome_tx: mpsc::UnboundedSender<AttemptOutcome>,
  outcome_rx: mpsc::UnboundedReceiver<AttemptOutcome>,
  state: SearchState,
}

impl SearchCoordinator {
  pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
    Self { backend, generation: 0, cancel: None, outcome_tx, outcome_rx, state: SearchState::default() }
  }

  pub fn state(&self) -> &SearchState {
    &self.state
  }

  /// Mark the hit at `idx` as the one the player was sought to.
  pub fn set_active(&mut self, idx: usize) {
    if idx < self.state.hits.len() {
      self.state.active = Some(idx);
    }
  }

  /// Clear the active-hit marker (playback stopped).
  pub fn clear_active(&mut self) {
    self.state.active = None;
  }

  /// Start a new search for `query`, superseding any attempt in flight.
  ///
  /// Whitespace-only input is ignored outright: no state change, no
  /// request. The prior attempt's token is cancelled before the new
  /// request is issued; its response, should it still arrive, fails the
  /// generation check and is discarded.
  pub fn run_search(&mut self, query: &str) {
    let query = query.trim();
    if query.is_empty() {
      return;
    }

    if let Some(token) = self.cancel.take() {
      token.cancel();
    }

    self.generation += 1;
    let generation = self.generation;
    let token = CancellationToken::new();
    self.cancel = Some(token.clone());

    info!(query = %query, generation, "search: starting attempt");
    self.state.busy = true;
    self.state.status = Some(format!("Searching '{}'…", query));
    self.state.hits.clear();
    self.state.active = None;

    let backend = Arc::clone(&self.backend);
    let tx = self.outcome_tx.clone();
    let request = SearchRequest { query: query.to_string(), top_k: constants().top_k };
    tokio::spawn(async move {
      let result = backend.search(&request, &token).await;
      // The receiver lives as long as the coordinator; a failed send just
      // means the whole session is gone.
      let _ = tx.send(AttemptOutcome { generation, result });
    });
  }

  /// Drain completed attempts, folding still-current outcomes into state.
  /// Returns whether state changed.
  pub fn poll_outcomes(&mut self) -> bool {
    let mut applied = false;
    while let Ok(outcome) = self.outcome_rx.try_recv() {
      applied |= self.apply(outcome);
    }
    applied
  }

  fn apply(&mut self, outcome: AttemptOutcome) -> bool {
    if outcome.generation != self.generation {
      // Superseded: a newer attempt owns the busy flag and the status line.
      debug!(generation = outcome.generation, latest = self.generation, "search: discarding superseded outcome");
      return false;
    }
    match outcome.result {
      Ok(response) => {
        let hits = dedupe(response.results);
        if hits.is_empty() {
          info!(generation = outcome.generation, "search: no results");
          self.state.hits.clear();
          self.state.status = Some("No results found.".to_string());
        } else {
          info!(generation = outcome.generation, count = hits.len(), "search: results ready");
          self.state.status = Some(format!("{} result{}", hits.len(), if hits.len() == 1 { "" } else { "s" }));
          self.state.hits = hits;
        }
        self.state.busy = false;
        true
      }
      Err(SearchError::Cancelled) => {
        // A cancelled attempt is normally superseded before its outcome
        // lands; reaching here means the token fired while the attempt was
        // still current. Leave state untouched.
        debug!(generation = outcome.generation, "search: current attempt reported cancellation");
        false
      }
      Err(SearchError::Status { status, ref text }) => {
        warn!(generation = outcome.generation, status, text = %text, "search: server error");
        self.state.hits.clear();
        self.state.status = Some(format!("Server error: {}", status));
        self.state.busy = false;
        true
      }
      Err(err) => {
        warn!(generation = outcome.generation, err = %err, "search: request failed");
        self.state.hits.clear();
        self.state.status = Some(format!("Search failed: {}", err));
        self.state.busy = false;
        true
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use std::collections::HashMap;
  use std::sync::Mutex as StdMutex;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tokio::sync::oneshot;

  fn hit(shot_id: &str, title: &str) -> SceneHit {
    SceneHit {
      rank: 1,
      score: 0.9,
      start_sec: Some(5.0),
      start_time: "0:05".to_string(),
      title: title.to_string(),
      shot_id: Some(shot_id.to_string()),
      characters: None,
    }
  }

  fn response(hits: Vec<SceneHit>) -> SearchResponse {
    SearchResponse { results: hits }
  }

  /// Scripted backend: each query resolves to a oneshot the test fulfils,
  /// so arrival order is fully under test control. The cancellation token
  /// is deliberately ignored — the coordinator must cope with a cancelled
  /// attempt completing anyway.
  #[derive(Default)]
  struct ScriptedBackend {
    replies: StdMutex<HashMap<String, oneshot::Receiver<Result<SearchResponse, SearchError>>>>,
    calls: AtomicUsize,
    last_top_k: StdMutex<Option<usize>>,
  }

  impl ScriptedBackend {
    fn script(&self, query: &str) -> oneshot::Sender<Result<SearchResponse, SearchError>> {
      let (tx, rx) = oneshot::channel();
      self.replies.lock().unwrap().insert(query.to_string(), rx);
      tx
    }
  }

  #[async_trait]
  impl SearchBackend for ScriptedBackend {
    async fn search(&self, req: &SearchRequest, _cancel: &CancellationToken) -> Result<SearchResponse, SearchError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      *self.last_top_k.lock().unwrap() = Some(req.top_k);
      let rx = self.replies.lock().unwrap().remove(&req.query);
      match rx {
        Some(rx) => rx.await.unwrap_or(Err(SearchError::Cancelled)),
        None => Ok(SearchResponse::default()),
      }
    }
  }

  /// Await the next outcome deterministically and fold it into state.
  async fn apply_next(coordinator: &mut SearchCoordinator) -> bool {
    let outcome = coordinator.outcome_rx.recv().await.expect("outcome channel closed");
    coordinator.apply(outcome)
  }

  fn coordinator_with_backend() -> (SearchCoordinator, Arc<ScriptedBackend>) {
    let backend = Arc::new(ScriptedBackend::default());
    (SearchCoordinator::new(backend.clone()), backend)
  }

  #[tokio::test]
  async fn empty_query_is_a_silent_noop() {
    let (mut coordinator, backend) = coordinator_with_backend();
    coordinator.run_search("   ");
    coordinator.run_search("");
    tokio::task::yield_now().await;
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    assert_eq!(coordinator.generation, 0);
    assert!(!coordinator.state().busy);
    assert!(coordinator.state().status.is_none());
  }

  #[tokio::test]
  async fn single_hit_reports_count_and_clears_busy() {
    let (mut coordinator, backend) = coordinator_with_backend();
    let reply = backend.script("cat");
    coordinator.run_search("cat");
    assert!(coordinator.state().busy);
    assert!(coordinator.state().status.as_deref().unwrap().contains("cat"));

    reply.send(Ok(response(vec![hit("s1", "Cat video")]))).unwrap();
    assert!(apply_next(&mut coordinator).await);

    let state = coordinator.state();
    assert!(!state.busy);
    assert_eq!(state.hits.len(), 1);
    assert_eq!(state.hits[0].title, "Cat video");
    assert!(state.status.as_deref().unwrap().contains("1 result"));
    // top_k is a fixed constant, never user input.
    assert_eq!(backend.last_top_k.lock().unwrap().unwrap(), constants().top_k);
  }

  #[tokio::test]
  async fn query_is_trimmed_before_sending() {
    let (mut coordinator, backend) = coordinator_with_backend();
    let reply = backend.script("cat");
    coordinator.run_search("  cat  ");
    reply.send(Ok(response(vec![hit("s1", "Cat video")]))).unwrap();
    assert!(apply_next(&mut coordinator).await);
    assert_eq!(coordinator.state().hits.len(), 1);
  }

  #[tokio::test]
  async fn stale_response_arriving_late_is_discarded() {
    let (mut coordinator, backend) = coordinator_with_backend();
    let reply_a = backend.script("a");
    let reply_b = backend.script("b");

    coordinator.run_search("a");
    coordinator.run_search("b");

    // "b" completes first and renders.
    reply_b.send(Ok(response(vec![hit("sb", "b hit")]))).unwrap();
    assert!(apply_next(&mut coordinator).await);
    assert_eq!(coordinator.state().hits[0].title, "b hit");
    assert!(!coordinator.state().busy);

    // "a" straggles in afterwards: discarded wholesale.
    reply_a.send(Ok(response(vec![hit("sa", "a hit")]))).unwrap();
    assert!(!apply_next(&mut coordinator).await);
    assert_eq!(coordinator.state().hits.len(), 1);
    assert_eq!(coordinator.state().hits[0].title, "b hit");
    assert!(!coordinator.state().busy);
  }

  #[tokio::test]
  async fn only_last_of_rapid_searches_is_applied() {
    let (mut coordinator, backend) = coordinator_with_backend();
    let reply_one = backend.script("one");
    let reply_two = backend.script("two");
    let reply_three = backend.script("three");

    coordinator.run_search("one");
    coordinator.run_search("two");
    coordinator.run_search("three");

    // Completions arrive shuffled: one, three, two.
    reply_one.send(Ok(response(vec![hit("s1", "one hit")]))).unwrap();
    reply_three.send(Ok(response(vec![hit("s3", "three hit")]))).unwrap();
    reply_two.send(Ok(response(vec![hit("s2", "two hit")]))).unwrap();

    // Let the spawned transport tasks run, then drain like the event loop.
    for _ in 0..16 {
      tokio::task::yield_now().await;
    }
    assert!(coordinator.poll_outcomes());

    let state = coordinator.state();
    assert_eq!(state.hits.len(), 1);
    assert_eq!(state.hits[0].title, "three hit");
    assert!(!state.busy);
  }

  #[tokio::test]
  async fn new_search_clears_previous_hits_and_active() {
    let (mut coordinator, backend) = coordinator_with_backend();
    let reply = backend.script("cat");
    coordinator.run_search("cat");
    reply.send(Ok(response(vec![hit("s1", "Cat video")]))).unwrap();
    apply_next(&mut coordinator).await;
    coordinator.set_active(0);
    assert_eq!(coordinator.state().active, Some(0));

    backend.script("dog");
    coordinator.run_search("dog");
    assert!(coordinator.state().hits.is_empty());
    assert_eq!(coordinator.state().active, None);
    assert!(coordinator.state().busy);
  }

  #[tokio::test]
  async fn server_error_surfaces_status_code() {
    let (mut coordinator, backend) = coordinator_with_backend();
    let reply = backend.script("cat");
    coordinator.run_search("cat");
    reply.send(Err(SearchError::Status { status: 500, text: "boom".to_string() })).unwrap();
    assert!(apply_next(&mut coordinator).await);

    let state = coordinator.state();
    assert!(state.status.as_deref().unwrap().contains("500"));
    assert!(state.hits.is_empty());
    assert!(!state.busy);
  }

  #[tokio::test]
  async fn empty_result_set_is_not_an_error() {
    let (mut coordinator, backend) = coordinator_with_backend();
    let reply = backend.script("cat");
    coordinator.run_search("cat");
    reply.send(Ok(response(Vec::new()))).unwrap();
    assert!(apply_next(&mut coordinator).await);

    let state = coordinator.state();
    assert_eq!(state.status.as_deref(), Some("No results found."));
    assert!(state.hits.is_empty());
    assert!(!state.busy);
  }

  #[tokio::test]
  async fn duplicate_hits_are_removed_before_counting() {
    let (mut coordinator, backend) = coordinator_with_backend();
    let reply = backend.script("cat");
    coordinator.run_search("cat");
    reply.send(Ok(response(vec![hit("s1", "first"), hit("s1", "second")]))).unwrap();
    assert!(apply_next(&mut coordinator).await);

    let state = coordinator.state();
    assert_eq!(state.hits.len(), 1);
    assert_eq!(state.hits[0].title, "first");
    assert!(state.status.as_deref().unwrap().contains("1 result"));
  }

  #[tokio::test]
  async fn cancelled_current_attempt_leaves_state_untouched() {
    let (mut coordinator, backend) = coordinator_with_backend();
    let reply = backend.script("cat");
    coordinator.run_search("cat");
    let status_before = coordinator.state().status.clone();

    reply.send(Err(SearchError::Cancelled)).unwrap();
    assert!(!apply_next(&mut coordinator).await);

    let state = coordinator.state();
    assert!(state.busy, "cancellation must not clear the busy flag");
    assert_eq!(state.status, status_before);
  }

  #[tokio::test]
  async fn superseding_cancels_the_previous_token() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut coordinator = SearchCoordinator::new(backend.clone());
    backend.script("a");
    coordinator.run_search("a");
    let first_token = coordinator.cancel.clone().unwrap();
    assert!(!first_token.is_cancelled());

    backend.script("b");
    coordinator.run_search("b");
    assert!(first_token.is_cancelled());
    // Cancelling again is idempotent and harmless after supersession.
    first_token.cancel();
  }
}
