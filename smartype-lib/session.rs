//! Per-editor state.
//!
//! Each attached editor gets a [`Session`] in the [`Sessions`] arena. A
//! session only owns the revert state of its own last substitution, so edits
//! in one editor never consume or clear another editor's record.

use std::fmt;

use slotmap::SlotMap;

use crate::revert::RevertState;

slotmap::new_key_type! {
    pub struct SessionId;
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.0)
  }
}

#[derive(Debug, Default)]
pub struct Session {
  pub revert: RevertState,
}

#[derive(Debug, Default)]
pub struct Sessions {
  sessions: SlotMap<SessionId, Session>,
}

impl Sessions {
  pub fn attach(&mut self) -> SessionId {
    let id = self.sessions.insert(Session::default());
    tracing::debug!(%id, "session attached");
    id
  }

  /// Retire `id`. Returns false if it was not attached.
  pub fn detach(&mut self, id: SessionId) -> bool {
    let removed = self.sessions.remove(id).is_some();
    if removed {
      tracing::debug!(%id, "session detached");
    }
    removed
  }

  pub fn contains(&self, id: SessionId) -> bool {
    self.sessions.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.sessions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sessions.is_empty()
  }

  pub fn get(&self, id: SessionId) -> Option<&Session> {
    self.sessions.get(id)
  }

  pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
    self.sessions.get_mut(id)
  }
}
