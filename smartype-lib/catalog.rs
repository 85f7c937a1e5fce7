//! The rule catalog.
//!
//! [`build_catalog`] turns [`Settings`] into the ordered list of enabled rules
//! with their outputs resolved, a trigger index and the look-behind window the
//! context evaluator has to fetch. A catalog is never edited in place: when
//! settings change, a new one is built and swapped in.
//!
//! Order is priority. Inside one category no two rules accept the same
//! trigger and look-behind, so order only matters across categories.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::{
  Tendril,
  rule::{
    Context,
    Replacement,
    Rule,
  },
  settings::{
    Categories,
    GlyphSelector,
    Settings,
  },
};

const fn after(
  name: &'static str,
  category: Categories,
  trigger: &'static str,
  prev: &'static str,
  replacement: Replacement,
) -> Rule {
  Rule {
    name,
    category,
    trigger,
    context: Context::After(prev),
    replacement,
  }
}

const fn glyph(selector: &'static [GlyphSelector]) -> Replacement {
  Replacement::FromSettings(selector)
}

const fn fraction(prefix: &'static str, trigger: &'static str, glyph: &'static str) -> Rule {
  Rule {
    name: glyph,
    category: Categories::FRACTIONS,
    trigger,
    context: Context::AtWordStart(prefix),
    replacement: Replacement::Literal(glyph),
  }
}

const QUOTE_RULES: &[Rule] = &[
  Rule {
    name:        "paired-double-quote",
    category:    Categories::QUOTES,
    trigger:     "\"\"",
    context:     Context::Always,
    replacement: glyph(&[GlyphSelector::OpenDouble, GlyphSelector::CloseDouble]),
  },
  Rule {
    name:        "paired-single-quote",
    category:    Categories::QUOTES,
    trigger:     "''",
    context:     Context::Always,
    replacement: glyph(&[GlyphSelector::OpenSingle, GlyphSelector::CloseSingle]),
  },
  Rule {
    name:        "open-double-quote",
    category:    Categories::QUOTES,
    trigger:     "\"",
    context:     Context::OpeningQuote,
    replacement: glyph(&[GlyphSelector::OpenDouble]),
  },
  Rule {
    name:        "close-double-quote",
    category:    Categories::QUOTES,
    trigger:     "\"",
    context:     Context::ClosingQuote,
    replacement: glyph(&[GlyphSelector::CloseDouble]),
  },
  Rule {
    name:        "open-single-quote",
    category:    Categories::QUOTES,
    trigger:     "'",
    context:     Context::OpeningQuote,
    replacement: glyph(&[GlyphSelector::OpenSingle]),
  },
  Rule {
    name:        "close-single-quote",
    category:    Categories::QUOTES,
    trigger:     "'",
    context:     Context::ClosingQuote,
    replacement: glyph(&[GlyphSelector::CloseSingle]),
  },
];

// `--` becomes an en dash, a third `-` an em dash and a fourth spells out
// `---`. Dashes typed after `---` stay literal.
const DASH_RULES: &[Rule] = &[
  Rule {
    name:        "en-dash",
    category:    Categories::DASHES,
    trigger:     "-",
    context:     Context::AfterUnless {
      text:   "-",
      unless: '-',
    },
    replacement: Replacement::Literal("–"),
  },
  after(
    "em-dash",
    Categories::DASHES,
    "-",
    "–",
    Replacement::Literal("—"),
  ),
  after(
    "triple-dash",
    Categories::DASHES,
    "-",
    "—",
    Replacement::Literal("---"),
  ),
];

const ELLIPSIS_RULES: &[Rule] = &[after(
  "ellipsis",
  Categories::ELLIPSIS,
  ".",
  "..",
  Replacement::Literal("…"),
)];

const ARROW_RULES: &[Rule] = &[
  after(
    "left-arrow",
    Categories::ARROWS,
    "-",
    "<",
    glyph(&[GlyphSelector::LeftArrow]),
  ),
  after(
    "right-arrow",
    Categories::ARROWS,
    ">",
    "-",
    glyph(&[GlyphSelector::RightArrow]),
  ),
];

const GUILLEMET_RULES: &[Rule] = &[
  after(
    "left-guillemet",
    Categories::GUILLEMETS,
    "<",
    "<",
    glyph(&[GlyphSelector::LeftGuillemet]),
  ),
  after(
    "right-guillemet",
    Categories::GUILLEMETS,
    ">",
    ">",
    glyph(&[GlyphSelector::RightGuillemet]),
  ),
];

const COMPARISON_RULES: &[Rule] = &[
  after(
    "less-or-equal",
    Categories::COMPARISONS,
    "=",
    "<",
    glyph(&[GlyphSelector::LessOrEqual]),
  ),
  after(
    "greater-or-equal",
    Categories::COMPARISONS,
    "=",
    ">",
    glyph(&[GlyphSelector::GreaterOrEqual]),
  ),
  after(
    "not-equal",
    Categories::COMPARISONS,
    "=",
    "/",
    glyph(&[GlyphSelector::NotEqual]),
  ),
];

const FRACTION_RULES: &[Rule] = &[
  fraction("1/", "2", "½"),
  fraction("1/", "3", "⅓"),
  fraction("2/", "3", "⅔"),
  fraction("1/", "4", "¼"),
  fraction("3/", "4", "¾"),
  fraction("1/", "5", "⅕"),
  fraction("2/", "5", "⅖"),
  fraction("3/", "5", "⅗"),
  fraction("4/", "5", "⅘"),
  fraction("1/", "6", "⅙"),
  fraction("5/", "6", "⅚"),
  fraction("1/", "7", "⅐"),
  fraction("1/", "8", "⅛"),
  fraction("3/", "8", "⅜"),
  fraction("5/", "8", "⅝"),
  fraction("7/", "8", "⅞"),
  fraction("1/", "9", "⅑"),
  fraction("1/1", "0", "⅒"),
];

const RULES: &[&[Rule]] = &[
  QUOTE_RULES,
  DASH_RULES,
  ELLIPSIS_RULES,
  ARROW_RULES,
  GUILLEMET_RULES,
  COMPARISON_RULES,
  FRACTION_RULES,
];

/// A rule with its output resolved against the settings it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
  pub rule:   Rule,
  pub output: Tendril,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
  entries: Vec<Entry>,
  index:   HashMap<&'static str, SmallVec<[usize; 4]>>,
  window:  usize,
}

impl Catalog {
  pub fn entries(&self) -> &[Entry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Number of committed characters before the insertion point that any
  /// rule reads.
  pub fn window(&self) -> usize {
    self.window
  }

  pub fn has_trigger(&self, text: &str) -> bool {
    self.index.contains_key(text)
  }

  /// Rules triggered by `text`, in priority order.
  pub fn candidates<'a>(&'a self, text: &str) -> impl Iterator<Item = &'a Entry> + 'a {
    self
      .index
      .get(text)
      .into_iter()
      .flatten()
      .map(|&idx| &self.entries[idx])
  }
}

pub fn build_catalog(settings: &Settings) -> Catalog {
  let mut catalog = Catalog::default();

  for rule in RULES.iter().copied().flatten() {
    if !settings.is_enabled(rule.category) {
      continue;
    }
    let idx = catalog.entries.len();
    catalog.window = catalog.window.max(rule.lookbehind());
    catalog.index.entry(rule.trigger).or_default().push(idx);
    catalog.entries.push(Entry {
      rule:   rule.clone(),
      output: rule.replacement.resolve(settings),
    });
  }

  tracing::trace!(
    rules = catalog.entries.len(),
    window = catalog.window,
    "built rule catalog"
  );
  catalog
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn default_catalog_has_every_rule() {
    let catalog = build_catalog(&Settings::default());
    let total: usize = RULES.iter().map(|rules| rules.len()).sum();
    assert_eq!(catalog.len(), total);
    // `1/1` + boundary
    assert_eq!(catalog.window(), 4);
  }

  #[test]
  fn disabled_categories_contribute_nothing() {
    let mut settings = Settings::default();
    settings.set_enabled(Categories::FRACTIONS, false);
    let catalog = build_catalog(&settings);
    assert!(
      catalog
        .entries()
        .iter()
        .all(|entry| entry.rule.category != Categories::FRACTIONS)
    );
    assert!(!catalog.has_trigger("0"));
    assert_eq!(catalog.window(), 2);

    settings.enabled = Categories::empty();
    let catalog = build_catalog(&settings);
    assert!(catalog.is_empty());
    assert_eq!(catalog.window(), 0);
    assert_eq!(catalog.candidates("-").count(), 0);
  }

  #[test]
  fn candidates_keep_priority_order() {
    let catalog = build_catalog(&Settings::default());
    let names: Vec<_> = catalog.candidates("\"").map(|entry| entry.rule.name).collect();
    assert_eq!(names, ["open-double-quote", "close-double-quote"]);
    let names: Vec<_> = catalog.candidates("-").map(|entry| entry.rule.name).collect();
    assert_eq!(names, ["en-dash", "em-dash", "triple-dash", "left-arrow"]);
  }

  #[test]
  fn outputs_follow_settings() {
    let mut settings = Settings::default();
    settings.set_glyph(GlyphSelector::RightArrow, "⇒");
    let catalog = build_catalog(&settings);
    let arrow = catalog
      .candidates(">")
      .find(|entry| entry.rule.name == "right-arrow")
      .unwrap();
    assert_eq!(arrow.output, "⇒");
  }

  // At most one rule per category accepts any trigger and look-behind.
  #[test]
  fn categories_are_unambiguous() {
    let settings = Settings::default();
    let catalog = build_catalog(&settings);
    let samples = [
      "", " ", "\n", "a", "-", "a-", "--", "–", "—", "<", ">", "/", ".", "..", "(", "“", "‘",
      "\"", "1/", " 1/", "x1/", "1/1", " 1/1", "2/", "3/", "5/", "7/", "4/",
    ];
    for (trigger, _) in catalog.index.iter() {
      for before in samples {
        let mut matched: Vec<Categories> = catalog
          .candidates(trigger)
          .filter(|entry| entry.rule.context.matches(before, &settings))
          .map(|entry| entry.rule.category)
          .collect();
        let len = matched.len();
        matched.dedup();
        assert_eq!(matched.len(), len, "trigger {trigger:?} after {before:?}");
      }
    }
  }
}
