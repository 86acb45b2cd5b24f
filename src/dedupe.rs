//! Order-preserving duplicate removal for scene hits.
//!
//! Nearby shots of the same segment often surface more than once in a
//! ranked result list. Identity follows the underlying video segment, not
//! presentation metadata: the shot id when known, else the start offset,
//! else a rank+score composite.

use std::collections::HashSet;

use crate::api::SceneHit;

/// Identity of a hit for duplicate detection.
///
/// Two hits lacking both `shot_id` and `start_sec` collapse whenever their
/// rank and score are equal, even with different titles — inherited
/// behavior of the fallback key, kept as-is.
fn identity_key(hit: &SceneHit) -> String {
  if let Some(ref sid) = hit.shot_id {
    format!("sid:{}", sid)
  } else if let Some(sec) = hit.start_sec {
    format!("t:{}", sec)
  } else {
    format!("rank:{}-score:{}", hit.rank, hit.score)
  }
}

/// Remove duplicate hits, keeping the first occurrence of each identity.
pub fn dedupe(hits: Vec<SceneHit>) -> Vec<SceneHit> {
  let mut seen = HashSet::new();
  let mut out = Vec::with_capacity(hits.len());
  for hit in hits {
    if seen.insert(identity_key(&hit)) {
      out.push(hit);
    }
  }
  out
}
