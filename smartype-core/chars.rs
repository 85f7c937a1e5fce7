use crate::line_ending::LineEnding;

#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  LineEnding::from_char(ch).is_some()
}

#[inline]
pub fn char_is_whitespace(ch: char) -> bool {
  match ch {
      '\u{0009}' | // Character Tabulation
      '\u{0020}' | // Space
      '\u{00A0}' | // No-break Space
      '\u{180E}' | // Mongolian Vowel Separator
      '\u{202F}' | // Narrow No-break Space
      '\u{205F}' | // Medium Mathematical Space
      '\u{3000}' | // Ideographic Space
      '\u{FEFF}'   // Zero Width No-break Space
      => true,

      // En Quad through Zero Width Space.
      ch if ('\u{2000}' ..= '\u{200B}').contains(&ch) => true,

      _ => false,
    }
}

/// Whitespace or a line break; the boundary before a word.
#[inline]
pub fn char_is_blank(ch: char) -> bool {
  char_is_whitespace(ch) || char_is_line_ending(ch)
}

/// Opening brackets and initial quotation marks, e.g. `(`, `[`, `“`, `‘`, `«`.
#[inline]
pub fn char_is_opening_punctuation(ch: char) -> bool {
  use unicode_general_category::{
    GeneralCategory,
    get_general_category,
  };

  matches!(
    get_general_category(ch),
    GeneralCategory::OpenPunctuation | GeneralCategory::InitialPunctuation
  )
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn opening_punctuation() {
    for ch in ['(', '[', '{', '“', '‘', '«', '„'] {
      assert!(char_is_opening_punctuation(ch), "{ch:?} should open");
    }
    for ch in [')', '”', '’', '»', '"', '\'', '-', 'a'] {
      assert!(!char_is_opening_punctuation(ch), "{ch:?} should not open");
    }
  }

  #[test]
  fn blank_covers_whitespace_and_line_breaks() {
    for ch in [' ', '\t', '\u{00A0}', '\n', '\r', '\u{2028}'] {
      assert!(char_is_blank(ch), "{ch:?} should be blank");
    }
    for ch in ['a', '1', '/', '"'] {
      assert!(!char_is_blank(ch), "{ch:?} should not be blank");
    }
  }
}
