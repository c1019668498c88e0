//! Query state as seen by subscribers.

use serde_json::Value;

use crate::transport::ApiError;

/// The state of a cached query.
#[derive(Debug, Clone)]
pub enum QueryState {
  /// First fetch is in flight; no data has ever arrived.
  Loading,
  /// Last fetch succeeded.
  Success(Value),
  /// Last fetch failed. The error does not poison other entries.
  Error(ApiError),
}

impl QueryState {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&Value> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&ApiError> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// Snapshot of a cache entry published to subscribers. `stale` is set from
/// the instant a matching invalidation lands until a fetch issued after that
/// invalidation settles, so consumers can keep rendering the old data while
/// the re-fetch runs.
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub state: QueryState,
  pub stale: bool,
}

impl Snapshot {
  pub(crate) fn loading() -> Self {
    Self {
      state: QueryState::Loading,
      stale: false,
    }
  }

  /// The settled, post-invalidation outcome, if one is available.
  pub fn fresh(&self) -> Option<Result<Value, ApiError>> {
    match &self.state {
      QueryState::Success(data) if !self.stale => Some(Ok(data.clone())),
      QueryState::Error(e) => Some(Err(e.clone())),
      _ => None,
    }
  }
}
