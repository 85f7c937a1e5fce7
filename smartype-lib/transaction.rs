//! Declarative edits against a [`Rope`].
//!
//! A [`ChangeSet`] is a run of [`Operation`]s walked from the start of the
//! document: `Retain(n)` keeps `n` characters, `Delete(n)` drops them and
//! `Insert(s)` splices in `s`. The operations always cover the whole input
//! document, so a changeset knows both the length it expects (`len`) and the
//! length it produces (`len_after`) and refuses to touch a buffer of any
//! other length.
//!
//! A [`Transaction`] pairs a changeset with the selection the host should
//! adopt once the changes are applied.
//!
//! ```ignore
//! use ropey::Rope;
//! use smartype_lib::transaction::Transaction;
//!
//! let mut doc = Rope::from("wait...");
//! let tx = Transaction::change(&doc, [(4, 7, Some("…".into()))])?;
//! tx.apply(&mut doc)?;
//! assert_eq!(doc, "wait…");
//! ```
//!
//! Every edit is expressed as `(from, to, text)` against the document the
//! transaction was built for. Nothing here moves a cursor imperatively:
//! cursor updates are computed by mapping positions through the changeset
//! (see [`ChangeSet::map_pos`]) or supplied explicitly via
//! [`Transaction::with_selection`].
//!
//! # All-or-nothing
//!
//! Ranges are validated while the changeset is built and the document length
//! is checked before the first mutation, so [`ChangeSet::apply`] either
//! applies every operation or returns an error having changed nothing.

use ropey::Rope;
use thiserror::Error;

use crate::{
  Tendril,
  selection::{
    Range,
    Selection,
  },
};

pub type Result<T> = std::result::Result<T, TransactionError>;

/// (from, to) replacement. `None` deletes the range.
pub type Change = (usize, usize, Option<Tendril>);

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error(
    "changeset compose length mismatch: left output {left_len_after}, right input {right_len}"
  )]
  ComposeLengthMismatch {
    left_len_after: usize,
    right_len:      usize,
  },
  #[error("invalid change range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("change range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("change range {from}..{to} overlaps previous end {prev_end}")]
  OverlappingRange {
    prev_end: usize,
    from:     usize,
    to:       usize,
  },
  #[error("position {pos} is out of bounds for changeset length {len}")]
  PositionOutOfBounds { pos: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  /// Keep n characters.
  Retain(usize),

  /// Delete n characters.
  Delete(usize),

  /// Insert text at the current position.
  Insert(Tendril),
}

impl Operation {
  pub fn len_chars(&self) -> usize {
    match self {
      Operation::Retain(n) | Operation::Delete(n) => *n,
      Operation::Insert(s) => s.chars().count(),
    }
  }
}

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  Before,
  After,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  ops:       Vec<Operation>,
  /// Length of the document this changeset applies to.
  len:       usize,
  len_after: usize,
}

impl ChangeSet {
  /// A changeset that leaves a document of `len` characters untouched.
  pub fn identity(len: usize) -> Self {
    let mut changes = Self::default();
    changes.retain(len);
    changes
  }

  pub fn ops(&self) -> &[Operation] {
    &self.ops
  }

  /// Expected document length before the changes.
  pub fn len(&self) -> usize {
    self.len
  }

  /// Document length after the changes.
  pub fn len_after(&self) -> usize {
    self.len_after
  }

  /// True when applying the changeset would not alter the document.
  pub fn is_empty(&self) -> bool {
    self.ops.iter().all(|op| matches!(op, Operation::Retain(_)))
  }

  // Builder operations. Adjacent operations of the same kind are merged and
  // an insert is always kept ahead of a delete at the same position, so two
  // changesets describing the same edit compare equal.
  //

  pub fn retain(&mut self, n: usize) {
    if n == 0 {
      return;
    }
    self.len += n;
    self.len_after += n;
    match self.ops.last_mut() {
      Some(Operation::Retain(count)) => *count += n,
      _ => self.ops.push(Operation::Retain(n)),
    }
  }

  pub fn delete(&mut self, n: usize) {
    if n == 0 {
      return;
    }
    self.len += n;
    match self.ops.last_mut() {
      Some(Operation::Delete(count)) => *count += n,
      _ => self.ops.push(Operation::Delete(n)),
    }
  }

  pub fn insert(&mut self, text: Tendril) {
    if text.is_empty() {
      return;
    }
    self.len_after += text.chars().count();
    match self.ops.as_mut_slice() {
      [.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
        prev.push_str(&text);
      },
      [.., last @ Operation::Delete(_)] => {
        let deleted = std::mem::replace(last, Operation::Insert(text));
        self.ops.push(deleted);
      },
      _ => self.ops.push(Operation::Insert(text)),
    }
  }

  fn ensure_len(&self, actual: usize) -> Result<()> {
    if actual != self.len {
      return Err(TransactionError::LengthMismatch {
        expected: self.len,
        actual,
      });
    }
    Ok(())
  }

  /// Apply the changes in place. The document is left untouched on error.
  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    self.ensure_len(doc.len_chars())?;

    let mut pos = 0;
    for op in &self.ops {
      match op {
        Operation::Retain(n) => pos += n,
        Operation::Delete(n) => doc.remove(pos..pos + n),
        Operation::Insert(text) => {
          doc.insert(pos, text);
          pos += text.chars().count();
        },
      }
    }
    Ok(())
  }

  /// Apply the changes to a copy of `doc`.
  pub fn apply_to(&self, doc: &Rope) -> Result<Rope> {
    let mut updated = doc.clone();
    self.apply(&mut updated)?;
    Ok(updated)
  }

  /// Build the changeset that undoes this one. `original` is the document
  /// as it was before this changeset was applied.
  pub fn invert(&self, original: &Rope) -> Result<Self> {
    self.ensure_len(original.len_chars())?;

    let mut inverse = Self::default();
    let mut pos = 0;
    for op in &self.ops {
      match op {
        Operation::Retain(n) => {
          inverse.retain(*n);
          pos += n;
        },
        Operation::Delete(n) => {
          let removed: String = original.slice(pos..pos + n).chars().collect();
          inverse.insert(Tendril::from(removed));
          pos += n;
        },
        Operation::Insert(text) => inverse.delete(text.chars().count()),
      }
    }
    Ok(inverse)
  }

  /// Combine `self` followed by `other` into a single changeset. Applying
  /// the result equals applying `self` and then `other`.
  pub fn compose(self, other: Self) -> Result<Self> {
    use Operation::*;

    if self.len_after != other.len {
      return Err(TransactionError::ComposeLengthMismatch {
        left_len_after: self.len_after,
        right_len:      other.len,
      });
    }

    let mut composed = Self::default();
    let mut ops_a = self.ops.into_iter();
    let mut ops_b = other.ops.into_iter();
    let mut head_a = ops_a.next();
    let mut head_b = ops_b.next();

    loop {
      match (head_a.take(), head_b.take()) {
        (None, None) => break,
        // text removed by the first changeset never reaches the second
        (Some(Delete(n)), b) => {
          composed.delete(n);
          head_a = ops_a.next();
          head_b = b;
        },
        // text added by the second changeset was never seen by the first
        (a, Some(Insert(text))) => {
          composed.insert(text);
          head_a = a;
          head_b = ops_b.next();
        },
        (Some(Retain(i)), Some(Retain(j))) => {
          let n = i.min(j);
          composed.retain(n);
          head_a = remainder(Retain(i - n), &mut ops_a);
          head_b = remainder(Retain(j - n), &mut ops_b);
        },
        (Some(Retain(i)), Some(Delete(j))) => {
          let n = i.min(j);
          composed.delete(n);
          head_a = remainder(Retain(i - n), &mut ops_a);
          head_b = remainder(Delete(j - n), &mut ops_b);
        },
        (Some(Insert(text)), Some(Retain(j))) => {
          let len = text.chars().count();
          let n = len.min(j);
          let (kept, rest) = split_at_char(text, n);
          composed.insert(kept);
          head_a = remainder(Insert(rest), &mut ops_a);
          head_b = remainder(Retain(j - n), &mut ops_b);
        },
        (Some(Insert(text)), Some(Delete(j))) => {
          let len = text.chars().count();
          let n = len.min(j);
          let (_, rest) = split_at_char(text, n);
          head_a = remainder(Insert(rest), &mut ops_a);
          head_b = remainder(Delete(j - n), &mut ops_b);
        },
        (a, b) => unreachable!("changesets of matching length ran out unevenly: {a:?} {b:?}"),
      }
    }

    debug_assert_eq!(composed.len, self.len);
    debug_assert_eq!(composed.len_after, other.len_after);
    Ok(composed)
  }

  /// Map a position in the original document to the changed document.
  ///
  /// A position inside deleted text collapses to the start of the deletion.
  /// At an insertion point, or inside replaced text, `Before` keeps the
  /// position ahead of the new text and `After` moves it past the new text.
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    use Operation::*;

    let mut old = 0;
    let mut new = 0;
    let mut ops = self.ops.iter().peekable();

    while let Some(op) = ops.next() {
      match op {
        Retain(n) => {
          if pos < old + n {
            return Ok(new + (pos - old));
          }
          old += n;
          new += n;
        },
        Delete(n) => {
          if pos < old + n {
            return Ok(new);
          }
          old += n;
        },
        Insert(text) => {
          let inserted = text.chars().count();
          let replaced = match ops.peek() {
            Some(Delete(n)) => {
              let n = *n;
              ops.next();
              n
            },
            _ => 0,
          };
          if pos == old || pos < old + replaced {
            return Ok(match assoc {
              Assoc::Before if pos == old => new,
              Assoc::Before | Assoc::After => new + inserted,
            });
          }
          old += replaced;
          new += inserted;
        },
      }
    }

    if pos == old {
      Ok(new)
    } else {
      Err(TransactionError::PositionOutOfBounds { pos, len: self.len })
    }
  }

  pub fn changes_iter(&self) -> ChangeIterator<'_> {
    ChangeIterator {
      ops: self.ops.iter().peekable(),
      pos: 0,
    }
  }
}

fn remainder(op: Operation, rest: &mut impl Iterator<Item = Operation>) -> Option<Operation> {
  if op.len_chars() == 0 {
    rest.next()
  } else {
    Some(op)
  }
}

fn split_at_char(mut text: Tendril, n: usize) -> (Tendril, Tendril) {
  match text.char_indices().nth(n) {
    Some((byte, _)) => {
      let rest = text.split_off(byte);
      (text, rest)
    },
    None => (text, Tendril::new()),
  }
}

/// Yields the changes of a [`ChangeSet`] as `(from, to, text)` triples in
/// original document coordinates.
pub struct ChangeIterator<'a> {
  ops: std::iter::Peekable<std::slice::Iter<'a, Operation>>,
  pos: usize,
}

impl Iterator for ChangeIterator<'_> {
  type Item = Change;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      match self.ops.next()? {
        Operation::Retain(n) => self.pos += n,
        Operation::Delete(n) => {
          let from = self.pos;
          self.pos += n;
          return Some((from, self.pos, None));
        },
        Operation::Insert(text) => {
          let from = self.pos;
          if let Some(Operation::Delete(n)) = self.ops.peek() {
            self.pos += n;
            self.ops.next();
          }
          return Some((from, self.pos, Some(text.clone())));
        },
      }
    }
  }
}

fn validate_change_bounds(from: usize, to: usize, len: usize) -> Result<()> {
  if from > to {
    return Err(TransactionError::InvalidRange { from, to });
  }
  if to > len {
    return Err(TransactionError::RangeOutOfBounds { from, to, len });
  }
  Ok(())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transaction {
  changes:   ChangeSet,
  selection: Option<Selection>,
}

impl From<ChangeSet> for Transaction {
  fn from(changes: ChangeSet) -> Self {
    Self {
      changes,
      selection: None,
    }
  }
}

impl Transaction {
  /// Build a transaction from changes sorted by position. Overlapping or
  /// out-of-bounds ranges are rejected.
  pub fn change<I>(doc: &Rope, changes: I) -> Result<Self>
  where
    I: IntoIterator<Item = Change>,
  {
    let len = doc.len_chars();
    let mut changeset = ChangeSet::default();
    let mut last = 0;

    for (from, to, text) in changes {
      validate_change_bounds(from, to, len)?;
      if from < last {
        return Err(TransactionError::OverlappingRange {
          prev_end: last,
          from,
          to,
        });
      }
      changeset.retain(from - last);
      if let Some(text) = text {
        changeset.insert(text);
      }
      changeset.delete(to - from);
      last = to;
    }
    changeset.retain(len - last);

    Ok(Self::from(changeset))
  }

  /// Type `text` at every range, replacing whatever the range selects. The
  /// resulting selection is a cursor after each insertion.
  pub fn insert(doc: &Rope, selection: &Selection, text: &str) -> Result<Self> {
    let transaction = Self::change(
      doc,
      selection
        .iter()
        .map(|range| (range.from(), range.to(), Some(Tendril::from(text)))),
    )?;
    let selection = selection
      .clone()
      .transform(|range| Range::point(range.to()))
      .map(transaction.changes(), Assoc::After)?;
    Ok(transaction.with_selection(selection))
  }

  /// Delete the character before every cursor, or the selected text of
  /// non-empty ranges.
  pub fn delete_backward(doc: &Rope, selection: &Selection) -> Result<Self> {
    let transaction = Self::change(
      doc,
      selection.iter().filter_map(|range| {
        if range.is_empty() {
          let head = range.head;
          (head > 0).then(|| (head - 1, head, None))
        } else {
          Some((range.from(), range.to(), None))
        }
      }),
    )?;
    let selection = selection
      .clone()
      .transform(|range| Range::point(range.from()))
      .map(transaction.changes(), Assoc::Before)?;
    Ok(transaction.with_selection(selection))
  }

  /// Changes made to the buffer.
  pub fn changes(&self) -> &ChangeSet {
    &self.changes
  }

  /// When set, the selection the host should adopt after applying.
  pub fn selection(&self) -> Option<&Selection> {
    self.selection.as_ref()
  }

  pub fn with_selection(mut self, selection: Selection) -> Self {
    self.selection = Some(selection);
    self
  }

  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    self.changes.apply(doc)
  }

  pub fn apply_to(&self, doc: &Rope) -> Result<Rope> {
    self.changes.apply_to(doc)
  }

  /// Generate a transaction that reverts this one.
  pub fn invert(&self, original: &Rope) -> Result<Self> {
    Ok(Self::from(self.changes.invert(original)?))
  }

  /// Run `other` after `self`. The selection of `other` wins.
  pub fn compose(self, other: Self) -> Result<Self> {
    Ok(Self {
      changes:   self.changes.compose(other.changes)?,
      selection: other.selection,
    })
  }

  pub fn changes_iter(&self) -> ChangeIterator<'_> {
    self.changes.changes_iter()
  }
}
