use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::constants::constants;
use crate::timecode;

/// Request body for the scene search endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
  pub query: String,
  pub top_k: usize,
}

/// A single ranked scene match returned by the search service.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneHit {
  pub rank: u32,
  pub score: f64,
  #[serde(default)]
  pub start_sec: Option<f64>,
  #[serde(default)]
  pub start_time: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub shot_id: Option<String>,
  #[serde(default)]
  pub characters: Option<String>,
}

impl SceneHit {
  /// Seconds to seek the player to. Falls back to parsing `start_time`
  /// when the service omits `start_sec`.
  pub fn seek_seconds(&self) -> f64 {
    self.start_sec.unwrap_or_else(|| timecode::time_to_seconds(&self.start_time))
  }

  /// Timestamp for display: `start_time` as sent, or derived from `start_sec`.
  pub fn display_time(&self) -> String {
    if self.start_time.is_empty() {
      timecode::format_seconds(self.start_sec.unwrap_or(0.0))
    } else {
      self.start_time.clone()
    }
  }
}

/// Response body. A missing `results` field is an empty result set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
  #[serde(default)]
  pub results: Vec<SceneHit>,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("server returned status {status}: {text}")]
  Status { status: u16, text: String },
  #[error("search cancelled")]
  Cancelled,
}

/// Transport seam for the search endpoint.
///
/// The cancellation token is advisory: an implementation should abandon the
/// call when it fires, but may complete anyway. The coordinator tolerates
/// either — outcomes for attempts that are no longer current are discarded.
#[async_trait]
pub trait SearchBackend: Send + Sync {
  async fn search(&self, req: &SearchRequest, cancel: &CancellationToken) -> Result<SearchResponse, SearchError>;
}

/// reqwest-backed transport POSTing to `{base_url}{search_path}`.
pub struct HttpSearchClient {
  client: Client,
  base_url: String,
}

impl HttpSearchClient {
  /// Create the HTTP search client.
  ///
  /// # Panics
  /// If the underlying reqwest client can't be constructed.
  #[must_use]
  pub fn new(base_url: &str) -> Self {
    let c = constants();
    Self {
      client: Client::builder()
        .connect_timeout(Duration::from_secs(c.connect_timeout_secs))
        .timeout(Duration::from_secs(c.request_timeout_secs))
        .build()
        .expect("Failed to create HTTP client"),
      base_url: base_url.trim_end_matches('/').to_string(),
    }
  }
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
  async fn search(&self, req: &SearchRequest, cancel: &CancellationToken) -> Result<SearchResponse, SearchError> {
    let url = format!("{}{}", self.base_url, constants().search_path);
    let request = async {
      let response = self.client.post(&url).json(req).send().await?;
      let status = response.status();
      if status.is_success() {
        Ok(response.json().await?)
      } else {
        let text = response.text().await.unwrap_or_default();
        Err(SearchError::Status { status: status.as_u16(), text })
      }
    };
    tokio::select! {
      _ = cancel.cancelled() => Err(SearchError::Cancelled),
      result = request => result,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_serializes_query_and_top_k() {
    let req = SearchRequest { query: "cat".to_string(), top_k: 5 };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["query"], "cat");
    assert_eq!(json["top_k"], 5);
  }

  #[test]
  fn response_deserializes_full_hit() {
    let body = r#"{"results":[{"rank":1,"score":0.9,"start_sec":5.0,"start_time":"0:05","title":"Cat video","shot_id":"s1","characters":"Tom, Jerry"}]}"#;
    let resp: SearchResponse = serde_json::from_str(body).unwrap();
    assert_eq!(resp.results.len(), 1);
    let hit = &resp.results[0];
    assert_eq!(hit.rank, 1);
    assert_eq!(hit.start_sec, Some(5.0));
    assert_eq!(hit.shot_id.as_deref(), Some("s1"));
    assert_eq!(hit.characters.as_deref(), Some("Tom, Jerry"));
  }

  #[test]
  fn response_without_results_field_is_empty() {
    let resp: SearchResponse = serde_json::from_str("{}").unwrap();
    assert!(resp.results.is_empty());
  }

  #[test]
  fn hit_optional_fields_default_to_none() {
    let body = r#"{"results":[{"rank":2,"score":0.87}]}"#;
    let resp: SearchResponse = serde_json::from_str(body).unwrap();
    let hit = &resp.results[0];
    assert!(hit.start_sec.is_none());
    assert!(hit.shot_id.is_none());
    assert!(hit.start_time.is_empty());
  }

  #[test]
  fn seek_seconds_falls_back_to_start_time() {
    let body = r#"{"results":[{"rank":1,"score":0.9,"start_time":"1:41","title":"t"}]}"#;
    let resp: SearchResponse = serde_json::from_str(body).unwrap();
    assert_eq!(resp.results[0].seek_seconds(), 101.0);
  }

  #[test]
  fn display_time_derives_from_start_sec() {
    let body = r#"{"results":[{"rank":1,"score":0.9,"start_sec":101.0,"title":"t"}]}"#;
    let resp: SearchResponse = serde_json::from_str(body).unwrap();
    assert_eq!(resp.results[0].display_time(), "1:41");
  }
}
