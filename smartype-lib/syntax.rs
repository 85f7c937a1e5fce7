//! Syntax-aware suppression.
//!
//! The host tells us what kind of region a position sits in through a
//! [`SyntaxClassifier`]. Substitutions at positions classified into one of the
//! excluded [`Regions`] are vetoed before anything is written.
//!
//! [`MarkdownClassifier`] is a small line scanner for hosts without a syntax
//! tree of their own. It recognises:
//!
//! - leading `---` front matter (up to the closing `---` or `...`)
//! - fenced code blocks (```` ``` ```` or `~~~`) and inline code spans
//! - `$$` math blocks and inline `$…$` / `$$…$$` math
//! - `{{ … }}`, `{% … %}` and `<% … %>` template tags
//!
//! Regions that are still open at the position (the user is typing inside
//! them) count as containing it.

use std::collections::HashMap;

use bitflags::bitflags;
use ropey::{
  Rope,
  RopeSlice,
};
use serde::Deserialize;
use smartype_core::line_ending::line_without_line_ending;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyntaxCategory {
  Code,
  Math,
  FrontMatter,
  Template,
  Other,
}

bitflags! {
  /// A set of syntax categories in which substitution is suppressed.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct Regions: u8 {
    const CODE         = 1 << 0;
    const MATH         = 1 << 1;
    const FRONT_MATTER = 1 << 2;
    const TEMPLATE     = 1 << 3;
  }
}

impl Default for Regions {
  fn default() -> Self {
    Self::all()
  }
}

impl SyntaxCategory {
  /// The suppression flag for this category. `Other` never maps to one.
  pub fn region(self) -> Regions {
    match self {
      Self::Code => Regions::CODE,
      Self::Math => Regions::MATH,
      Self::FrontMatter => Regions::FRONT_MATTER,
      Self::Template => Regions::TEMPLATE,
      Self::Other => Regions::empty(),
    }
  }
}

impl FromIterator<SyntaxCategory> for Regions {
  fn from_iter<I: IntoIterator<Item = SyntaxCategory>>(iter: I) -> Self {
    iter
      .into_iter()
      .fold(Regions::empty(), |regions, category| regions | category.region())
  }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassifyError {
  #[error("syntax information is not available")]
  Unavailable,
  #[error("position {pos} is out of bounds for document length {len}")]
  OutOfBounds { pos: usize, len: usize },
  #[error("classifier failed: {0}")]
  Failed(String),
}

/// Host-provided syntax classification.
pub trait SyntaxClassifier {
  /// Classify the gap at char offset `pos`. `Ok(None)` means plain text.
  fn classify(&self, doc: &Rope, pos: usize) -> Result<Option<SyntaxCategory>, ClassifyError>;

  /// Whether a failed classification may be treated as plain text. When
  /// false, a position the classifier could not vouch for is suppressed.
  fn safe_defaults(&self) -> bool {
    false
  }
}

impl<F> SyntaxClassifier for F
where
  F: Fn(&Rope, usize) -> Result<Option<SyntaxCategory>, ClassifyError>,
{
  fn classify(&self, doc: &Rope, pos: usize) -> Result<Option<SyntaxCategory>, ClassifyError> {
    self(doc, pos)
  }
}

/// Classifies everything as plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainText;

impl SyntaxClassifier for PlainText {
  fn classify(&self, _doc: &Rope, _pos: usize) -> Result<Option<SyntaxCategory>, ClassifyError> {
    Ok(None)
  }

  fn safe_defaults(&self) -> bool {
    true
  }
}

/// Vetoes positions inside excluded regions. Answers are cached per position
/// for the lifetime of the filter, which is one edit operation.
pub struct SuppressionFilter<'a> {
  classifier: &'a dyn SyntaxClassifier,
  excluded:   Regions,
  cache:      HashMap<usize, bool>,
}

impl<'a> SuppressionFilter<'a> {
  pub fn new(classifier: &'a dyn SyntaxClassifier, excluded: Regions) -> Self {
    Self {
      classifier,
      excluded,
      cache: HashMap::new(),
    }
  }

  pub fn is_suppressed(&mut self, doc: &Rope, pos: usize) -> bool {
    if self.excluded.is_empty() {
      return false;
    }
    let classifier = self.classifier;
    let excluded = self.excluded;
    *self.cache.entry(pos).or_insert_with(|| {
      match classifier.classify(doc, pos) {
        Ok(Some(category)) => excluded.intersects(category.region()),
        Ok(None) => false,
        Err(err) => {
          let allow = classifier.safe_defaults();
          tracing::warn!(pos, %err, allow, "syntax classification failed");
          !allow
        },
      }
    })
  }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownClassifier;

impl SyntaxClassifier for MarkdownClassifier {
  fn classify(&self, doc: &Rope, pos: usize) -> Result<Option<SyntaxCategory>, ClassifyError> {
    let len = doc.len_chars();
    if pos > len {
      return Err(ClassifyError::OutOfBounds { pos, len });
    }

    let text = doc.slice(..);
    let line_idx = text.char_to_line(pos);

    let body_start = match front_matter_end(text, line_idx) {
      FrontMatter::None => 0,
      FrontMatter::Contains => return Ok(Some(SyntaxCategory::FrontMatter)),
      FrontMatter::ClosedAt(last) => last + 1,
    };

    let mut blocks = BlockState::default();
    for idx in body_start..line_idx {
      blocks.feed(line(text, idx));
    }

    if blocks.fence.is_some() || fence_marker(line(text, line_idx)).is_some() {
      return Ok(Some(SyntaxCategory::Code));
    }
    if blocks.math {
      return Ok(Some(SyntaxCategory::Math));
    }

    let line_start = text.line_to_char(line_idx);
    Ok(inline_region(text.slice(line_start..pos).chars()))
  }
}

enum FrontMatter {
  None,
  /// The line sits on or inside the front matter block.
  Contains,
  /// Index of the closing delimiter line, which lies before the line.
  ClosedAt(usize),
}

/// Locate the front matter relative to line `line_idx`, reading no further
/// than that line.
fn front_matter_end(text: RopeSlice, line_idx: usize) -> FrontMatter {
  if text.len_lines() < 2 || line(text, 0) != "---" {
    return FrontMatter::None;
  }
  (1..line_idx)
    .find(|&idx| {
      let delim = line(text, idx);
      delim == "---" || delim == "..."
    })
    .map_or(FrontMatter::Contains, FrontMatter::ClosedAt)
}

fn line(text: RopeSlice<'_>, idx: usize) -> RopeSlice<'_> {
  line_without_line_ending(&text.line(idx))
}

/// Whether `line` is `expected` once surrounding whitespace is ignored.
fn line_is(line: RopeSlice, expected: &str) -> bool {
  let mut chars = line.chars().skip_while(|ch| ch.is_whitespace());
  expected.chars().all(|want| chars.next() == Some(want)) && chars.all(char::is_whitespace)
}

fn fence_marker(line: RopeSlice) -> Option<char> {
  let mut chars = line.chars().skip_while(|ch| ch.is_whitespace());
  let marker = chars.next().filter(|&ch| matches!(ch, '`' | '~'))?;
  (chars.next() == Some(marker) && chars.next() == Some(marker)).then_some(marker)
}

#[derive(Default)]
struct BlockState {
  fence: Option<char>,
  math:  bool,
}

impl BlockState {
  fn feed(&mut self, line: RopeSlice) {
    match (self.fence, fence_marker(line)) {
      (Some(open), Some(marker)) if open == marker => self.fence = None,
      (Some(_), _) => {},
      (None, Some(marker)) if !self.math => self.fence = Some(marker),
      _ if line_is(line, "$$") => self.math = !self.math,
      _ => {},
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MathDelim {
  Inline,
  Display,
}

/// An inline `$` opens math only when followed by a non-space character that
/// is not a digit, so `$5` stays a price. Nothing after it means the cursor
/// sits right behind the dollar sign, which counts as opening.
fn opens_inline_math(next: Option<char>) -> bool {
  next.is_none_or(|ch| !ch.is_whitespace() && !ch.is_ascii_digit())
}

fn closes_inline_math(prev: Option<char>, next: Option<char>) -> bool {
  prev.is_some_and(|ch| !ch.is_whitespace()) && !next.is_some_and(|ch| ch.is_ascii_digit())
}

fn inline_region(prefix: impl Iterator<Item = char>) -> Option<SyntaxCategory> {
  let mut code = false;
  let mut math: Option<MathDelim> = None;
  let mut template: Option<[char; 2]> = None;
  let mut prev: Option<char> = None;
  let mut chars = prefix.peekable();

  while let Some(mut ch) = chars.next() {
    if let Some([first, second]) = template {
      if ch == first && chars.peek() == Some(&second) {
        chars.next();
        ch = second;
        template = None;
      }
      prev = Some(ch);
      continue;
    }
    match ch {
      '\\' => {
        if let Some(escaped) = chars.next() {
          ch = escaped;
        }
      },
      '`' => code = !code,
      '$' if !code => {
        let display = chars.next_if_eq(&'$').is_some();
        let next = chars.peek().copied();
        math = match math {
          None if display => Some(MathDelim::Display),
          None if opens_inline_math(next) => Some(MathDelim::Inline),
          Some(MathDelim::Display) if display => None,
          Some(MathDelim::Inline) if !display && closes_inline_math(prev, next) => None,
          open => open,
        };
      },
      '{' | '<' if !code && math.is_none() => {
        template = match (ch, chars.peek()) {
          ('{', Some('{')) => Some(['}', '}']),
          ('{', Some('%')) => Some(['%', '}']),
          ('<', Some('%')) => Some(['%', '>']),
          _ => None,
        };
        if let Some(opened) = template.and_then(|_| chars.next()) {
          ch = opened;
        }
      },
      _ => {},
    }
    prev = Some(ch);
  }

  if code {
    Some(SyntaxCategory::Code)
  } else if math.is_some() {
    Some(SyntaxCategory::Math)
  } else if template.is_some() {
    Some(SyntaxCategory::Template)
  } else {
    None
  }
}
