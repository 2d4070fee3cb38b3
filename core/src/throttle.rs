// florist/src/throttle.rs

//! Best-effort throttle for review "helpful" votes.
//!
//! State is process-local and lost on restart.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Entries are pruned once the map grows past this size.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug)]
pub struct VoteThrottle {
  window: Duration,
  last_votes: Mutex<HashMap<(Uuid, String), Instant>>,
}

impl VoteThrottle {
  pub fn new(window: Duration) -> Self {
    Self {
      window,
      last_votes: Mutex::new(HashMap::new()),
    }
  }

  /// Records a vote by `voter_key` on `review_id` unless one was recorded within the window.
  pub fn try_register(&self, review_id: Uuid, voter_key: &str, now: Instant) -> bool {
    let mut votes = self.last_votes.lock();
    if votes.len() > PRUNE_THRESHOLD {
      let window = self.window;
      votes.retain(|_, at| now.saturating_duration_since(*at) < window);
    }
    let key = (review_id, voter_key.to_string());
    match votes.get(&key) {
      Some(last) if now.saturating_duration_since(*last) < self.window => false,
      _ => {
        votes.insert(key, now);
        true
      }
    }
  }

  pub fn tracked(&self) -> usize {
    self.last_votes.lock().len()
  }
}
