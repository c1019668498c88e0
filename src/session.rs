//! Persistent session store holding the bearer token.
//!
//! The stored blob mirrors the `userData` record the web front-end keeps in
//! local storage: a bearer token plus role/user-level fields. The store
//! re-reads the file on every access, so a token written by one part of the
//! process (login, token refresh) is visible to the next request without
//! restarting anything.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Session data created at login and read by every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub token: String,
  #[serde(default)]
  pub user_id: Option<i64>,
  #[serde(default)]
  pub user_name: Option<String>,
  #[serde(default)]
  pub user_level: Option<i64>,
  #[serde(default)]
  pub role: Option<String>,
  #[serde(default)]
  pub logged_in_at: Option<DateTime<Utc>>,
}

/// File-backed session store.
#[derive(Debug, Clone)]
pub struct SessionStore {
  path: PathBuf,
}

impl SessionStore {
  /// Open the store at the default location
  /// (`<data dir>/dsms/session.json`).
  pub fn open() -> Result<Self> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(Self::at(data_dir.join("dsms").join("session.json")))
  }

  /// Open the store at an explicit path.
  pub fn at(path: PathBuf) -> Self {
    Self { path }
  }

  /// Read the current session. Returns `None` when logged out or when the
  /// stored blob cannot be parsed.
  pub fn load(&self) -> Option<Session> {
    let contents = std::fs::read_to_string(&self.path).ok()?;
    serde_json::from_str(&contents).ok()
  }

  /// The bearer token, if a session exists.
  pub fn token(&self) -> Option<String> {
    self.load().map(|s| s.token)
  }

  /// Persist a session, replacing any previous one.
  pub fn save(&self, session: &Session) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    let contents = serde_json::to_string_pretty(session)
      .map_err(|e| eyre!("Failed to serialize session: {}", e))?;
    std::fs::write(&self.path, contents)
      .map_err(|e| eyre!("Failed to write session file {}: {}", self.path.display(), e))?;

    Ok(())
  }

  /// Destroy the session (logout).
  pub fn clear(&self) -> Result<()> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(eyre!(
        "Failed to remove session file {}: {}",
        self.path.display(),
        e
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store_in(dir: &tempfile::TempDir) -> SessionStore {
    SessionStore::at(dir.path().join("session.json"))
  }

  fn session(token: &str) -> Session {
    Session {
      token: token.to_string(),
      user_id: Some(7),
      user_name: Some("ops".to_string()),
      user_level: Some(2),
      role: Some("planner".to_string()),
      logged_in_at: Some(Utc::now()),
    }
  }

  #[test]
  fn save_is_visible_to_next_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    assert!(store.load().is_none());
    store.save(&session("tok-1")).unwrap();
    assert_eq!(store.token().as_deref(), Some("tok-1"));

    // A second handle over the same path sees the update without restart.
    let other = store_in(&dir);
    assert_eq!(other.token().as_deref(), Some("tok-1"));

    store.save(&session("tok-2")).unwrap();
    assert_eq!(other.token().as_deref(), Some("tok-2"));
  }

  #[test]
  fn clear_removes_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.save(&session("tok")).unwrap();
    store.clear().unwrap();
    assert!(store.load().is_none());

    // Clearing an already-empty store is fine.
    store.clear().unwrap();
  }

  #[test]
  fn corrupt_blob_reads_as_logged_out() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(dir.path().join("session.json"), "not json").unwrap();
    assert!(store.load().is_none());
  }
}
