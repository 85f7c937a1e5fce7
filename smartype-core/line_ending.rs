use ropey::RopeSlice;

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LineEnding {
  /// CarriageReturn followed by LineFeed.
  Crlf,

  /// U+000A -- LineFeed
  LF,

  /// U+000B -- VerticalTab
  VT,

  /// U+000C -- FormFeed
  FF,

  /// U+000D -- CarriageReturn
  CR,

  /// U+0085 -- NextLine
  Nel,

  /// U+2028 -- Line Separator
  LS,

  /// U+2029 -- ParagraphSeparator
  PS,
}

impl LineEnding {
  #[inline]
  pub const fn len_chars(&self) -> usize {
    match self {
      Self::Crlf => 2,
      _ => 1,
    }
  }

  #[inline]
  pub const fn from_char(ch: char) -> Option<LineEnding> {
    match ch {
      '\u{000A}' => Some(LineEnding::LF),
      '\u{000B}' => Some(LineEnding::VT),
      '\u{000C}' => Some(LineEnding::FF),
      '\u{000D}' => Some(LineEnding::CR),
      '\u{0085}' => Some(LineEnding::Nel),
      '\u{2028}' => Some(LineEnding::LS),
      '\u{2029}' => Some(LineEnding::PS),
      // Not a line ending
      _ => None,
    }
  }
}

/// Returns the line ending at the end of `line`, if any.
pub fn get_line_ending(line: &RopeSlice) -> Option<LineEnding> {
  let len = line.len_chars();
  let last = line.get_char(len.checked_sub(1)?)?;
  if last == '\n' && len >= 2 && line.get_char(len - 2) == Some('\r') {
    return Some(LineEnding::Crlf);
  }
  LineEnding::from_char(last)
}

/// Returns `line` with its trailing line ending (if any) removed.
pub fn line_without_line_ending<'a>(line: &RopeSlice<'a>) -> RopeSlice<'a> {
  let end = line.len_chars() - get_line_ending(line).map_or(0, |le| le.len_chars());
  line.slice(..end)
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;

  #[test]
  fn detects_line_endings() {
    let doc = Rope::from("one\r\ntwo\nthree");
    assert_eq!(get_line_ending(&doc.line(0)), Some(LineEnding::Crlf));
    assert_eq!(get_line_ending(&doc.line(1)), Some(LineEnding::LF));
    assert_eq!(get_line_ending(&doc.line(2)), None);
  }

  #[test]
  fn strips_line_endings() {
    let doc = Rope::from("one\r\ntwo\nthree");
    assert_eq!(line_without_line_ending(&doc.line(0)), "one");
    assert_eq!(line_without_line_ending(&doc.line(1)), "two");
    assert_eq!(line_without_line_ending(&doc.line(2)), "three");
  }
}
