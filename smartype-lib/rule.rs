//! A single substitution rule.
//!
//! A rule fires when its `trigger` is typed and the committed text just before
//! the insertion point satisfies its [`Context`]. The rule then replaces the
//! trigger together with the part of the context it consumed (the `span`)
//! with its [`Replacement`].

use smartype_core::chars::{
  char_is_blank,
  char_is_opening_punctuation,
};

use crate::{
  Tendril,
  settings::{
    Categories,
    GlyphSelector,
    Settings,
  },
};

/// Predicate over the look-behind text ending at the insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
  Always,
  /// The look-behind ends with the given text, which is consumed.
  After(&'static str),
  /// Like `After`, but the character before the match must not be `unless`.
  AfterUnless { text: &'static str, unless: char },
  /// The look-behind ends with the given text, which starts the document or
  /// follows whitespace. The text is consumed.
  AtWordStart(&'static str),
  /// Empty look-behind, whitespace, opening punctuation or an opening quote.
  OpeningQuote,
  /// Anything `OpeningQuote` does not accept.
  ClosingQuote,
}

impl Context {
  /// How many committed characters the predicate reads.
  pub fn lookbehind(&self) -> usize {
    match self {
      Self::Always => 0,
      Self::After(text) => text.chars().count(),
      Self::AfterUnless { text, .. } | Self::AtWordStart(text) => text.chars().count() + 1,
      Self::OpeningQuote | Self::ClosingQuote => 1,
    }
  }

  /// How many committed characters a match replaces.
  pub fn consumed(&self) -> usize {
    match self {
      Self::After(text) | Self::AfterUnless { text, .. } | Self::AtWordStart(text) => {
        text.chars().count()
      },
      Self::Always | Self::OpeningQuote | Self::ClosingQuote => 0,
    }
  }

  /// Test `before`, the committed text ending at the insertion point. It is
  /// shorter than the catalog window only at the start of the document.
  pub fn matches(&self, before: &str, settings: &Settings) -> bool {
    match *self {
      Self::Always => true,
      Self::After(text) => before.ends_with(text),
      Self::AfterUnless { text, unless } => {
        before
          .strip_suffix(text)
          .is_some_and(|rest| rest.chars().next_back() != Some(unless))
      },
      Self::AtWordStart(text) => {
        before
          .strip_suffix(text)
          .is_some_and(|rest| rest.chars().next_back().is_none_or(char_is_blank))
      },
      Self::OpeningQuote => opens_quote(before, settings),
      Self::ClosingQuote => !opens_quote(before, settings),
    }
  }
}

fn opens_quote(before: &str, settings: &Settings) -> bool {
  match before.chars().next_back() {
    None => true,
    Some(ch) => {
      char_is_blank(ch)
        || char_is_opening_punctuation(ch)
        || matches!(ch, '"' | '\'')
        || settings.is_opening_quote(ch)
    },
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
  Literal(&'static str),
  /// Concatenation of the configured glyphs.
  FromSettings(&'static [GlyphSelector]),
}

impl Replacement {
  pub fn resolve(&self, settings: &Settings) -> Tendril {
    match self {
      Self::Literal(text) => Tendril::from(*text),
      Self::FromSettings(selectors) => {
        selectors
          .iter()
          .map(|selector| settings.glyph(*selector))
          .collect()
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
  pub name:        &'static str,
  pub category:    Categories,
  /// One character, or a doubled pair inserted atomically.
  pub trigger:     &'static str,
  pub context:     Context,
  pub replacement: Replacement,
}

impl Rule {
  pub fn lookbehind(&self) -> usize {
    self.context.lookbehind()
  }

  /// Length of the original text replaced, counted backward from and
  /// including the trigger.
  pub fn span(&self) -> usize {
    self.context.consumed() + self.trigger.chars().count()
  }

  /// Paired rules leave the cursor between the two halves of their output.
  pub fn is_paired(&self) -> bool {
    self.trigger.chars().count() == 2
  }

  /// Distance of the resulting cursor from the end of the output.
  pub fn cursor_back(&self) -> usize {
    usize::from(self.is_paired())
  }

  /// The text the user actually typed, as it would read without the rule.
  pub fn literal(&self, before: &str) -> Tendril {
    let consumed = self.context.consumed();
    let mut literal: Tendril = before
      .chars()
      .skip(before.chars().count().saturating_sub(consumed))
      .collect();
    literal.push_str(self.trigger);
    literal
  }
}
