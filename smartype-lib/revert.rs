//! Single-backspace revert of the last substitution.
//!
//! After a rule fires the session holds a [`RevertRecord`]: the transaction
//! that puts back what the user literally typed, plus enough of the post-edit
//! state to tell whether that transaction still applies. The very next
//! backspace consumes it. Anything else, or a backspace the record no longer
//! fits, drops it.

use std::mem;

use ropey::Rope;
use smallvec::SmallVec;

use crate::{
  Tendril,
  selection::Selection,
  transaction::Transaction,
};

/// One substituted glyph in the post-edit document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
  pub rule:        &'static str,
  pub from:        usize,
  pub output:      Tendril,
  pub literal:     Tendril,
  pub cursor_back: usize,
}

impl Substitution {
  fn is_intact(&self, doc: &Rope) -> bool {
    let to = self.from + self.output.chars().count();
    to <= doc.len_chars() && doc.slice(self.from..to) == self.output.as_str()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertRecord {
  inverse:       Transaction,
  expected:      Selection,
  /// One slot per cursor; `None` where the keystroke was inserted verbatim.
  substitutions: SmallVec<[Option<Substitution>; 1]>,
}

impl RevertRecord {
  pub fn new(
    inverse: Transaction,
    expected: Selection,
    substitutions: SmallVec<[Option<Substitution>; 1]>,
  ) -> Self {
    Self {
      inverse,
      expected,
      substitutions,
    }
  }

  pub fn inverse(&self) -> &Transaction {
    &self.inverse
  }

  pub fn expected(&self) -> &Selection {
    &self.expected
  }

  pub fn substitutions(&self) -> impl Iterator<Item = &Substitution> {
    self.substitutions.iter().flatten()
  }

  /// Whether a backspace at `selection` in `doc` continues the substitution.
  pub fn applies_to(&self, doc: &Rope, selection: &Selection) -> bool {
    selection.is_cursors()
      && selection.ranges() == self.expected.ranges()
      && doc.len_chars() == self.inverse.changes().len()
      && self.substitutions().all(|sub| sub.is_intact(doc))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RevertState {
  #[default]
  Idle,
  Pending(RevertRecord),
}

impl RevertState {
  pub fn record(&mut self, record: RevertRecord) {
    *self = Self::Pending(record);
  }

  /// Drop any pending record. Returns whether there was one.
  pub fn clear(&mut self) -> bool {
    matches!(mem::take(self), Self::Pending(_))
  }

  pub fn pending(&self) -> Option<&RevertRecord> {
    match self {
      Self::Pending(record) => Some(record),
      Self::Idle => None,
    }
  }

  /// Consume the record. The inverse is returned only if it still fits the
  /// buffer and the cursors; the state is idle afterwards either way.
  pub fn take_for_delete(&mut self, doc: &Rope, selection: &Selection) -> Option<Transaction> {
    match mem::take(self) {
      Self::Pending(record) if record.applies_to(doc, selection) => Some(record.inverse),
      Self::Pending(_) => {
        tracing::trace!("revert record no longer applies, dropping");
        None
      },
      Self::Idle => None,
    }
  }
}

#[cfg(test)]
mod test {
  use smallvec::smallvec;

  use super::*;
  use crate::compose::{
    Edit,
    build_transaction,
  };

  // "wait…|" produced from "wait..."
  fn ellipsis_record() -> (Rope, RevertRecord) {
    let doc = Rope::from("wait…");
    let inverse =
      build_transaction(&doc, &[Edit::new(4, 5, "...")], 0).unwrap();
    let record = RevertRecord::new(
      inverse,
      Selection::point(5),
      smallvec![Some(Substitution {
        rule:        "ellipsis",
        from:        4,
        output:      "…".into(),
        literal:     "...".into(),
        cursor_back: 0,
      })],
    );
    (doc, record)
  }

  #[test]
  fn delete_replays_inverse() {
    let (doc, record) = ellipsis_record();
    let mut state = RevertState::default();
    state.record(record);
    let tx = state.take_for_delete(&doc, &Selection::point(5)).unwrap();
    assert_eq!(tx.apply_to(&doc).unwrap(), "wait...");
    assert_eq!(tx.selection(), Some(&Selection::point(7)));
    assert_eq!(state, RevertState::Idle);
  }

  #[test]
  fn moved_cursor_drops_record() {
    let (doc, record) = ellipsis_record();
    let mut state = RevertState::Pending(record);
    assert_eq!(state.take_for_delete(&doc, &Selection::point(4)), None);
    assert_eq!(state, RevertState::Idle);
  }

  #[test]
  fn missing_glyph_drops_record() {
    let (_, record) = ellipsis_record();
    let mut state = RevertState::Pending(record);
    let edited = Rope::from("wait!");
    assert_eq!(state.take_for_delete(&edited, &Selection::point(5)), None);
    assert_eq!(state, RevertState::Idle);
  }

  #[test]
  fn clear_reports_pending() {
    let (_, record) = ellipsis_record();
    let mut state = RevertState::Pending(record);
    assert!(state.clear());
    assert!(!state.clear());
    assert!(state.pending().is_none());
  }
}
