//! Turning per-cursor edits into one transaction.
//!
//! Every range of a selection produces exactly one [`Edit`], in document
//! order. The edits become a single changeset and each cursor is placed
//! relative to its own edit, shifted by the net length change of every edit
//! before it.

use ropey::Rope;
use smallvec::SmallVec;

use crate::{
  Tendril,
  selection::{
    self,
    Range,
    Selection,
  },
  transaction::Transaction,
};

/// Replace `from..to` (pre-edit positions) with `text`, leaving the cursor
/// `cursor_back` characters before the end of `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
  pub from:        usize,
  pub to:          usize,
  pub text:        Tendril,
  pub cursor_back: usize,
}

impl Edit {
  pub fn new(from: usize, to: usize, text: impl Into<Tendril>) -> Self {
    Self {
      from,
      to,
      text: text.into(),
      cursor_back: 0,
    }
  }

  pub fn with_cursor_back(mut self, cursor_back: usize) -> Self {
    self.cursor_back = cursor_back;
    self
  }

  fn inserted_len(&self) -> usize {
    self.text.chars().count()
  }

  /// Signed length change this edit causes.
  fn delta(&self) -> isize {
    self.inserted_len() as isize - (self.to - self.from) as isize
  }
}

/// Cursor positions after applying `edits`, in post-edit coordinates.
pub fn adjust_selection(edits: &[Edit], primary_index: usize) -> selection::Result<Selection> {
  let mut ranges: SmallVec<[Range; 1]> = SmallVec::with_capacity(edits.len());
  let mut offset: isize = 0;

  for edit in edits {
    let start = edit.from.saturating_add_signed(offset);
    let head = start + edit.inserted_len() - edit.cursor_back.min(edit.inserted_len());
    ranges.push(Range::point(head));
    offset += edit.delta();
  }

  Selection::with_primary(ranges, primary_index)
}

/// One transaction applying every edit at once and carrying the adjusted
/// selection.
pub fn build_transaction(
  doc: &Rope,
  edits: &[Edit],
  primary_index: usize,
) -> selection::Result<Transaction> {
  let selection = adjust_selection(edits, primary_index)?;
  let transaction = Transaction::change(
    doc,
    edits
      .iter()
      .filter(|edit| edit.from != edit.to || !edit.text.is_empty())
      .map(|edit| (edit.from, edit.to, Some(edit.text.clone()))),
  )?;
  Ok(transaction.with_selection(selection))
}

/// Edits undoing `edits` against the document they produce. Each edit with
/// an original gets that text back; an edit without one is undone like a
/// plain backspace, removing the single character before its cursor.
pub fn invert_edits<'a, I>(edits: &[Edit], originals: I) -> SmallVec<[Edit; 1]>
where
  I: IntoIterator<Item = Option<(&'a Tendril, usize)>>,
{
  let mut offset: isize = 0;
  edits
    .iter()
    .zip(originals)
    .map(|(edit, original)| {
      let from = edit.from.saturating_add_signed(offset);
      let to = from + edit.inserted_len();
      offset += edit.delta();
      match original {
        Some((original, cursor_back)) => {
          Edit {
            from,
            to,
            text: original.clone(),
            cursor_back,
          }
        },
        None => {
          let head = to - edit.cursor_back.min(edit.inserted_len());
          let start = if head > from { head - 1 } else { head };
          Edit::new(start, head, Tendril::new())
        },
      }
    })
    .collect()
}

#[cfg(test)]
mod test {
  use smallvec::smallvec;

  use super::*;

  #[test]
  fn cursors_shift_by_preceding_deltas() {
    // "a...|b...|c" with both ellipses collapsing to one char
    let doc = Rope::from("a..b..c");
    let edits = [Edit::new(1, 3, "…"), Edit::new(4, 6, "…")];
    let tx = build_transaction(&doc, &edits, 0).unwrap();
    assert_eq!(tx.apply_to(&doc).unwrap(), "a…b…c");
    assert_eq!(
      tx.selection().unwrap().ranges(),
      &[Range::point(2), Range::point(4)]
    );
  }

  #[test]
  fn paired_output_keeps_cursor_between() {
    let doc = Rope::from("say ");
    let edits = [Edit::new(4, 4, "“”").with_cursor_back(1)];
    let tx = build_transaction(&doc, &edits, 0).unwrap();
    assert_eq!(tx.apply_to(&doc).unwrap(), "say “”");
    assert_eq!(tx.selection().unwrap().primary(), Range::point(5));
  }

  #[test]
  fn unrelated_cursors_move_with_growth() {
    let doc = Rope::from("x—y");
    let edits = [Edit::new(1, 2, "---"), Edit::new(3, 3, "z")];
    let tx = build_transaction(&doc, &edits, 1).unwrap();
    assert_eq!(tx.apply_to(&doc).unwrap(), "x---yz");
    let selection = tx.selection().unwrap();
    assert_eq!(selection.ranges(), &[Range::point(4), Range::point(6)]);
    assert_eq!(selection.primary_index(), 1);
  }

  #[test]
  fn inverse_restores_literal() {
    let doc = Rope::from("a..b..c");
    let edits = [Edit::new(1, 3, "…"), Edit::new(4, 6, "…")];
    let forward = build_transaction(&doc, &edits, 0).unwrap();
    let after = forward.apply_to(&doc).unwrap();

    let literal = Tendril::from("...");
    let inverse = invert_edits(&edits, [Some((&literal, 0)), Some((&literal, 0))]);
    let expected: SmallVec<[Edit; 1]> =
      smallvec![Edit::new(1, 2, "..."), Edit::new(3, 4, "...")];
    assert_eq!(inverse, expected);

    let back = build_transaction(&after, &inverse, 0).unwrap();
    assert_eq!(back.apply_to(&after).unwrap(), "a...b...c");
    assert_eq!(
      back.selection().unwrap().ranges(),
      &[Range::point(4), Range::point(8)]
    );
  }

  #[test]
  fn plain_edit_inverts_to_one_backspace() {
    // an auto-paired `""` typed without substitution, then `…` elsewhere
    let doc = Rope::from("ab..");
    let edits = [
      Edit::new(1, 1, "\"\"").with_cursor_back(1),
      Edit::new(2, 4, "…"),
    ];
    let forward = build_transaction(&doc, &edits, 0).unwrap();
    let after = forward.apply_to(&doc).unwrap();
    assert_eq!(after, "a\"\"b…");

    let literal = Tendril::from("...");
    let inverse = invert_edits(&edits, [None, Some((&literal, 0))]);
    let expected: SmallVec<[Edit; 1]> = smallvec![Edit::new(1, 2, ""), Edit::new(4, 5, "...")];
    assert_eq!(inverse, expected);

    let back = build_transaction(&after, &inverse, 0).unwrap();
    assert_eq!(back.apply_to(&after).unwrap(), "a\"b...");
    assert_eq!(
      back.selection().unwrap().ranges(),
      &[Range::point(1), Range::point(6)]
    );
  }
}
