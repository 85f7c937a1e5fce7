//! Cursor positions and multi-cursor selections.
//!
//! A [`Range`] has an `anchor` and a `head`; the head is where text is typed.
//! Positions are char offsets into the document and sit *between*
//! characters, so `Range::point(3)` in `"abcdef"` is the gap after `c`.
//!
//! ```text
//! anchor=2, head=5: "ab[cde]f"  (forward)
//! anchor=5, head=2: "ab]cde[f"  (backward)
//! anchor=3, head=3: "abc|def"   (point)
//! ```
//!
//! A [`Selection`] holds one or more ranges, sorted by position with
//! overlapping ranges merged, plus the index of the primary range.

use smallvec::{
  SmallVec,
  smallvec,
};
use thiserror::Error;

use crate::transaction::{
  self,
  Assoc,
  ChangeSet,
  TransactionError,
};

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
  #[error("selection must contain at least one range")]
  EmptySelection,
  #[error("primary index {index} out of bounds for selection of length {len}")]
  PrimaryOutOfBounds { index: usize, len: usize },
  #[error("range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
  pub anchor: usize,
  pub head:   usize,
}

impl Range {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  #[inline]
  pub fn point(head: usize) -> Self {
    Self::new(head, head)
  }

  /// Start of the range
  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    self.anchor.min(self.head)
  }

  /// End of the range
  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    self.anchor.max(self.head)
  }

  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.to() - self.from()
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.anchor == self.head
  }

  #[inline]
  pub fn overlaps(&self, other: &Self) -> bool {
    (self.from() < other.to() && other.from() < self.to()) || self == other
  }

  /// Map both ends of the range through `changes`.
  pub fn map(self, changes: &ChangeSet, assoc: Assoc) -> transaction::Result<Self> {
    if changes.is_empty() {
      return Ok(self);
    }
    let head = changes.map_pos(self.head, assoc)?;
    let anchor = if self.is_empty() {
      head
    } else {
      changes.map_pos(self.anchor, assoc)?
    };
    Ok(Self::new(anchor, head))
  }
}

impl From<(usize, usize)> for Range {
  fn from((anchor, head): (usize, usize)) -> Self {
    Self::new(anchor, head)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
  ranges:        SmallVec<[Range; 1]>,
  primary_index: usize,
}

impl Selection {
  pub fn new(ranges: SmallVec<[Range; 1]>) -> Result<Self> {
    Self::with_primary(ranges, 0)
  }

  pub fn with_primary(ranges: SmallVec<[Range; 1]>, primary_index: usize) -> Result<Self> {
    if ranges.is_empty() {
      return Err(SelectionError::EmptySelection);
    }
    if primary_index >= ranges.len() {
      return Err(SelectionError::PrimaryOutOfBounds {
        index: primary_index,
        len:   ranges.len(),
      });
    }
    Ok(
      Self {
        ranges,
        primary_index,
      }
      .normalize(),
    )
  }

  /// A single cursor.
  pub fn point(pos: usize) -> Self {
    Self::single(pos, pos)
  }

  pub fn single(anchor: usize, head: usize) -> Self {
    Self {
      ranges:        smallvec![Range::new(anchor, head)],
      primary_index: 0,
    }
  }

  pub fn ranges(&self) -> &[Range] {
    &self.ranges
  }

  pub fn primary(&self) -> Range {
    self.ranges[self.primary_index]
  }

  pub fn primary_index(&self) -> usize {
    self.primary_index
  }

  pub fn len(&self) -> usize {
    self.ranges.len()
  }

  /// Always false; a selection holds at least one range.
  pub fn is_empty(&self) -> bool {
    self.ranges.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Range> {
    self.ranges.iter()
  }

  /// True when every range is a bare cursor.
  pub fn is_cursors(&self) -> bool {
    self.ranges.iter().all(Range::is_empty)
  }

  /// Check that every range fits in a document of `len` chars.
  pub fn ensure_within(&self, len: usize) -> Result<()> {
    match self.ranges.iter().find(|range| range.to() > len) {
      Some(range) => Err(SelectionError::RangeOutOfBounds {
        from: range.from(),
        to: range.to(),
        len,
      }),
      None => Ok(()),
    }
  }

  /// Replace each range with `f(range)` and re-normalize.
  pub fn transform<F>(mut self, mut f: F) -> Self
  where
    F: FnMut(Range) -> Range,
  {
    for range in self.ranges.iter_mut() {
      *range = f(*range);
    }
    self.normalize()
  }

  /// Map every range through `changes`.
  pub fn map(mut self, changes: &ChangeSet, assoc: Assoc) -> transaction::Result<Self> {
    for range in self.ranges.iter_mut() {
      *range = range.map(changes, assoc)?;
    }
    Ok(self.normalize())
  }

  // Sort by start and fold overlapping ranges together, keeping the primary
  // pointed at whichever range absorbed it.
  fn normalize(mut self) -> Self {
    if self.ranges.len() < 2 {
      return self;
    }

    let primary = self.ranges[self.primary_index];
    self.ranges.sort_by_key(|range| (range.from(), range.to()));

    let mut merged: SmallVec<[Range; 1]> = SmallVec::with_capacity(self.ranges.len());
    let mut primary_index = 0;
    for range in self.ranges.drain(..) {
      match merged.last_mut() {
        Some(last) if last.overlaps(&range) => {
          let from = last.from().min(range.from());
          let to = last.to().max(range.to());
          *last = if last.anchor > last.head {
            Range::new(to, from)
          } else {
            Range::new(from, to)
          };
        },
        _ => merged.push(range),
      }
      if range == primary {
        primary_index = merged.len() - 1;
      }
    }

    Self {
      ranges: merged,
      primary_index,
    }
  }
}

impl<'a> IntoIterator for &'a Selection {
  type IntoIter = std::slice::Iter<'a, Range>;
  type Item = &'a Range;

  fn into_iter(self) -> Self::IntoIter {
    self.ranges.iter()
  }
}

impl From<Range> for Selection {
  fn from(range: Range) -> Self {
    Self {
      ranges:        smallvec![range],
      primary_index: 0,
    }
  }
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;
  use crate::transaction::Transaction;

  #[test]
  fn range_bounds() {
    let range = Range::new(5, 2);
    assert_eq!(range.from(), 2);
    assert_eq!(range.to(), 5);
    assert_eq!(range.len(), 3);
    assert!(!range.is_empty());
    assert!(Range::point(4).is_empty());
  }

  #[test]
  fn new_rejects_empty_and_bad_primary() {
    assert_eq!(
      Selection::new(SmallVec::new()).unwrap_err(),
      SelectionError::EmptySelection
    );
    assert_eq!(
      Selection::with_primary(smallvec![Range::point(0)], 1).unwrap_err(),
      SelectionError::PrimaryOutOfBounds { index: 1, len: 1 }
    );
  }

  #[test]
  fn normalize_sorts_and_merges() {
    let selection = Selection::with_primary(
      smallvec![
        Range::point(9),
        Range::new(2, 5),
        Range::new(4, 7),
        Range::point(9)
      ],
      0,
    )
    .unwrap();
    assert_eq!(selection.ranges(), &[Range::new(2, 7), Range::point(9)]);
    assert_eq!(selection.primary(), Range::point(9));
  }

  #[test]
  fn adjacent_cursors_stay_apart() {
    let selection = Selection::new(smallvec![Range::point(3), Range::point(4)]).unwrap();
    assert_eq!(selection.len(), 2);
  }

  #[test]
  fn map_shifts_downstream_cursors() {
    let doc = Rope::from("one... two... three");
    let tx = Transaction::change(&doc, vec![(3, 6, Some("…".into()))]).unwrap();
    let selection = Selection::new(smallvec![Range::point(6), Range::point(13)]).unwrap();
    let mapped = selection.map(tx.changes(), Assoc::After).unwrap();
    assert_eq!(mapped.ranges(), &[Range::point(4), Range::point(11)]);
  }

  #[test]
  fn ensure_within_reports_overflow() {
    let selection = Selection::single(2, 8);
    assert!(selection.ensure_within(8).is_ok());
    assert_eq!(
      selection.ensure_within(7).unwrap_err(),
      SelectionError::RangeOutOfBounds {
        from: 2,
        to:   8,
        len:  7,
      }
    );
  }
}
