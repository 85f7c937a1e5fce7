//! Matching typed text against the catalog.
//!
//! The trigger lookup narrows the catalog to the rules keyed by the inserted
//! text. Their contexts are then tested, in priority order, against the
//! committed text just before the insertion point. Syntax classification is
//! only consulted once some context passes.

use ropey::{
  Rope,
  RopeSlice,
};

use crate::{
  Tendril,
  catalog::{
    Catalog,
    Entry,
  },
  settings::Settings,
  syntax::SuppressionFilter,
};

/// A rule that fired at one insertion point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a> {
  pub entry:   &'a Entry,
  /// Start of the replaced text, in the pre-edit document.
  pub from:    usize,
  /// What the user typed, as it would read without the substitution.
  pub literal: Tendril,
}

impl Match<'_> {
  pub fn output(&self) -> &Tendril {
    &self.entry.output
  }

  pub fn cursor_back(&self) -> usize {
    self.entry.rule.cursor_back()
  }
}

/// The (at most) `window` characters before `pos`.
pub fn lookbehind(text: RopeSlice, pos: usize, window: usize) -> String {
  text.slice(pos.saturating_sub(window)..pos).chars().collect()
}

/// Find the rule that `inserted` fires when typed at `pos`.
pub fn evaluate<'a>(
  catalog: &'a Catalog,
  settings: &Settings,
  doc: &Rope,
  pos: usize,
  inserted: &str,
  filter: &mut SuppressionFilter<'_>,
) -> Option<Match<'a>> {
  if !catalog.has_trigger(inserted) {
    return None;
  }

  let before = lookbehind(doc.slice(..), pos, catalog.window());
  for entry in catalog.candidates(inserted) {
    if !entry.rule.context.matches(&before, settings) {
      continue;
    }
    if filter.is_suppressed(doc, pos) {
      tracing::trace!(pos, rule = entry.rule.name, "substitution suppressed");
      return None;
    }
    return Some(Match {
      entry,
      from: pos - entry.rule.context.consumed(),
      literal: entry.rule.literal(&before),
    });
  }
  None
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    catalog::build_catalog,
    syntax::{
      MarkdownClassifier,
      PlainText,
      Regions,
    },
  };

  fn fire(before: &str, inserted: &str) -> Option<(String, String)> {
    let settings = Settings::default();
    let catalog = build_catalog(&settings);
    let doc = Rope::from(before);
    let mut filter = SuppressionFilter::new(&PlainText, Regions::all());
    evaluate(
      &catalog,
      &settings,
      &doc,
      doc.len_chars(),
      inserted,
      &mut filter,
    )
    .map(|found| (found.output().to_string(), found.literal.to_string()))
  }

  fn output(before: &str, inserted: &str) -> Option<String> {
    fire(before, inserted).map(|(output, _)| output)
  }

  #[test]
  fn lookbehind_is_clamped_at_start() {
    let doc = Rope::from("ab");
    assert_eq!(lookbehind(doc.slice(..), 2, 4), "ab");
    assert_eq!(lookbehind(doc.slice(..), 1, 4), "a");
    assert_eq!(lookbehind(doc.slice(..), 0, 4), "");
  }

  #[test]
  fn dash_chain() {
    assert_eq!(output("", "-"), None);
    assert_eq!(
      fire("a -", "-"),
      Some(("–".to_string(), "--".to_string()))
    );
    assert_eq!(output("a –", "-").as_deref(), Some("—"));
    assert_eq!(output("a —", "-").as_deref(), Some("---"));
    assert_eq!(output("a ---", "-"), None);
  }

  #[test]
  fn quotes() {
    assert_eq!(output("", "\"").as_deref(), Some("“"));
    assert_eq!(output("He said ", "\"").as_deref(), Some("“"));
    assert_eq!(output("He said “hi", "\"").as_deref(), Some("”"));
    assert_eq!(output("don", "'").as_deref(), Some("’"));
    assert_eq!(output("(", "'").as_deref(), Some("‘"));
    assert_eq!(output("x", "\"\"").as_deref(), Some("“”"));
  }

  #[test]
  fn pairs_of_ascii() {
    assert_eq!(output("a <", "-").as_deref(), Some("←"));
    assert_eq!(output("a -", ">").as_deref(), Some("→"));
    assert_eq!(output("<", "<").as_deref(), Some("«"));
    assert_eq!(output(">", ">").as_deref(), Some("»"));
    assert_eq!(output("a <", "=").as_deref(), Some("≤"));
    assert_eq!(output("a >", "=").as_deref(), Some("≥"));
    assert_eq!(output("a /", "=").as_deref(), Some("≠"));
    assert_eq!(output("a ", "=").as_deref(), None);
    assert_eq!(output("wait..", ".").as_deref(), Some("…"));
    assert_eq!(output("wait.", ".").as_deref(), None);
  }

  #[test]
  fn fractions() {
    assert_eq!(fire("1/", "2"), Some(("½".to_string(), "1/2".to_string())));
    assert_eq!(output("take 3/", "4").as_deref(), Some("¾"));
    assert_eq!(
      fire("a 1/1", "0"),
      Some(("⅒".to_string(), "1/10".to_string()))
    );
    assert_eq!(output("11/", "2"), None);
    assert_eq!(output("2/", "7"), None);
    assert_eq!(output("x1/", "2"), None);
  }

  #[test]
  fn replaced_range_starts_at_consumed_text() {
    let settings = Settings::default();
    let catalog = build_catalog(&settings);
    let doc = Rope::from("wait..");
    let mut filter = SuppressionFilter::new(&PlainText, Regions::all());
    let found = evaluate(&catalog, &settings, &doc, 6, ".", &mut filter).unwrap();
    assert_eq!(found.from, 4);
    assert_eq!(found.cursor_back(), 0);
  }

  #[test]
  fn suppressed_in_code() {
    let settings = Settings::default();
    let catalog = build_catalog(&settings);
    let doc = Rope::from("run `cargo -");
    let mut filter = SuppressionFilter::new(&MarkdownClassifier, settings.suppress_in);
    assert_eq!(
      evaluate(
        &catalog,
        &settings,
        &doc,
        doc.len_chars(),
        "-",
        &mut filter
      ),
      None
    );
  }
}
