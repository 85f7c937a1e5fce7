//! User-facing settings: which rule categories are enabled, the glyphs the
//! configurable rules produce and where substitution is suppressed.
//!
//! Settings files are TOML with kebab-case keys. Every key is optional:
//!
//! ```toml
//! curly-quotes = true
//! dashes = true
//! fractions = false
//! suppress-in = ["code", "math"]
//!
//! [glyphs]
//! open-double = "„"
//! close-double = "“"
//! ```

use std::collections::HashMap;

use bitflags::bitflags;
use serde::Deserialize;
use thiserror::Error;

use crate::syntax::{
  Regions,
  SyntaxCategory,
};

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
  #[error("failed to parse settings: {0}")]
  Parse(#[from] toml::de::Error),
}

bitflags! {
  /// Rule categories that can be switched on and off.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct Categories: u8 {
    const QUOTES      = 1 << 0;
    const DASHES      = 1 << 1;
    const ELLIPSIS    = 1 << 2;
    const ARROWS      = 1 << 3;
    const GUILLEMETS  = 1 << 4;
    const COMPARISONS = 1 << 5;
    const FRACTIONS   = 1 << 6;
  }
}

impl Default for Categories {
  fn default() -> Self {
    Self::all()
  }
}

/// Names one customizable output glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlyphSelector {
  OpenDouble,
  CloseDouble,
  OpenSingle,
  CloseSingle,
  LeftArrow,
  RightArrow,
  LeftGuillemet,
  RightGuillemet,
  LessOrEqual,
  GreaterOrEqual,
  NotEqual,
}

const GLYPH_COUNT: usize = 11;

impl GlyphSelector {
  pub const ALL: [Self; GLYPH_COUNT] = [
    Self::OpenDouble,
    Self::CloseDouble,
    Self::OpenSingle,
    Self::CloseSingle,
    Self::LeftArrow,
    Self::RightArrow,
    Self::LeftGuillemet,
    Self::RightGuillemet,
    Self::LessOrEqual,
    Self::GreaterOrEqual,
    Self::NotEqual,
  ];

  pub fn default_glyph(self) -> char {
    match self {
      Self::OpenDouble => '“',
      Self::CloseDouble => '”',
      Self::OpenSingle => '‘',
      Self::CloseSingle => '’',
      Self::LeftArrow => '←',
      Self::RightArrow => '→',
      Self::LeftGuillemet => '«',
      Self::RightGuillemet => '»',
      Self::LessOrEqual => '≤',
      Self::GreaterOrEqual => '≥',
      Self::NotEqual => '≠',
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyphs([char; GLYPH_COUNT]);

impl Default for Glyphs {
  fn default() -> Self {
    Self(GlyphSelector::ALL.map(GlyphSelector::default_glyph))
  }
}

impl Glyphs {
  pub fn get(&self, selector: GlyphSelector) -> char {
    self.0[selector as usize]
  }

  fn set(&mut self, selector: GlyphSelector, glyph: char) {
    self.0[selector as usize] = glyph;
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
  pub enabled:     Categories,
  pub suppress_in: Regions,
  glyphs:          Glyphs,
}

impl Settings {
  pub fn glyph(&self, selector: GlyphSelector) -> char {
    self.glyphs.get(selector)
  }

  pub fn glyphs(&self) -> &Glyphs {
    &self.glyphs
  }

  /// Update one glyph. The value must be exactly one character; anything
  /// else is rejected and the previous glyph stays in place.
  pub fn set_glyph(&mut self, selector: GlyphSelector, value: &str) -> bool {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
      (Some(glyph), None) => {
        self.glyphs.set(selector, glyph);
        true
      },
      _ => {
        tracing::warn!(?selector, value, "glyph must be a single character, keeping previous");
        false
      },
    }
  }

  pub fn set_enabled(&mut self, categories: Categories, enabled: bool) {
    self.enabled.set(categories, enabled);
  }

  pub fn is_enabled(&self, category: Categories) -> bool {
    self.enabled.contains(category)
  }

  /// Whether `ch` is one of the configured opening quote glyphs.
  pub fn is_opening_quote(&self, ch: char) -> bool {
    ch == self.glyph(GlyphSelector::OpenDouble) || ch == self.glyph(GlyphSelector::OpenSingle)
  }

  pub fn from_toml(source: &str) -> Result<Self> {
    let raw: SettingsRaw = toml::from_str(source)?;
    Ok(raw.into())
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
struct SettingsRaw {
  curly_quotes: bool,
  dashes:       bool,
  ellipsis:     bool,
  arrows:       bool,
  guillemets:   bool,
  comparisons:  bool,
  fractions:    bool,
  suppress_in:  Option<Vec<SyntaxCategory>>,
  glyphs:       HashMap<GlyphSelector, String>,
}

impl Default for SettingsRaw {
  fn default() -> Self {
    Self {
      curly_quotes: true,
      dashes:       true,
      ellipsis:     true,
      arrows:       true,
      guillemets:   true,
      comparisons:  true,
      fractions:    true,
      suppress_in:  None,
      glyphs:       HashMap::new(),
    }
  }
}

impl From<SettingsRaw> for Settings {
  fn from(raw: SettingsRaw) -> Self {
    let mut settings = Settings::default();
    for (category, enabled) in [
      (Categories::QUOTES, raw.curly_quotes),
      (Categories::DASHES, raw.dashes),
      (Categories::ELLIPSIS, raw.ellipsis),
      (Categories::ARROWS, raw.arrows),
      (Categories::GUILLEMETS, raw.guillemets),
      (Categories::COMPARISONS, raw.comparisons),
      (Categories::FRACTIONS, raw.fractions),
    ] {
      settings.set_enabled(category, enabled);
    }
    if let Some(suppress_in) = raw.suppress_in {
      settings.suppress_in = suppress_in.into_iter().collect();
    }
    for (selector, value) in &raw.glyphs {
      settings.set_glyph(*selector, value);
    }
    settings
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn defaults_enable_everything() {
    let settings = Settings::default();
    assert_eq!(settings.enabled, Categories::all());
    assert_eq!(settings.suppress_in, Regions::all());
    assert_eq!(settings.glyph(GlyphSelector::OpenDouble), '“');
    assert_eq!(settings.glyph(GlyphSelector::NotEqual), '≠');
  }

  #[test]
  fn set_glyph_requires_one_char() {
    let mut settings = Settings::default();
    assert!(!settings.set_glyph(GlyphSelector::RightArrow, ""));
    assert!(!settings.set_glyph(GlyphSelector::RightArrow, "=>"));
    assert_eq!(settings.glyph(GlyphSelector::RightArrow), '→');
    assert!(settings.set_glyph(GlyphSelector::RightArrow, "⇒"));
    assert_eq!(settings.glyph(GlyphSelector::RightArrow), '⇒');
  }

  #[test]
  fn opening_quotes_follow_glyphs() {
    let mut settings = Settings::default();
    assert!(settings.is_opening_quote('“'));
    assert!(settings.is_opening_quote('‘'));
    assert!(!settings.is_opening_quote('”'));
    settings.set_glyph(GlyphSelector::OpenDouble, "„");
    assert!(settings.is_opening_quote('„'));
    assert!(!settings.is_opening_quote('“'));
  }

  #[test]
  fn toggles_categories() {
    let mut settings = Settings::default();
    settings.set_enabled(Categories::DASHES | Categories::ARROWS, false);
    assert!(!settings.is_enabled(Categories::DASHES));
    assert!(!settings.is_enabled(Categories::ARROWS));
    assert!(settings.is_enabled(Categories::QUOTES));
  }

  #[test]
  fn parse_toml() {
    let settings = Settings::from_toml(
      r#"
      fractions = false
      suppress-in = ["code", "front-matter"]

      [glyphs]
      open-double = "„"
      close-double = "“"
      not-equal = "too long"
      "#,
    )
    .unwrap();
    assert!(!settings.is_enabled(Categories::FRACTIONS));
    assert!(settings.is_enabled(Categories::DASHES));
    assert_eq!(settings.suppress_in, Regions::CODE | Regions::FRONT_MATTER);
    assert_eq!(settings.glyph(GlyphSelector::OpenDouble), '„');
    assert_eq!(settings.glyph(GlyphSelector::CloseDouble), '“');
    assert_eq!(settings.glyph(GlyphSelector::NotEqual), '≠');
  }

  #[test]
  fn empty_toml_is_default() {
    assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
  }

  #[test]
  fn unknown_keys_are_rejected() {
    assert!(matches!(
      Settings::from_toml("smart-apostrophes = true"),
      Err(SettingsError::Parse(_))
    ));
    assert!(Settings::from_toml("[glyphs]\nbullet = \"•\"").is_err());
  }
}
