//! Keystroke scripts and their replay against an [`Engine`].

use anyhow::{
  Result,
  bail,
};
use ropey::Rope;
use smartype_lib::{
  engine::{
    Engine,
    Intercept,
  },
  selection::Selection,
  session::SessionId,
  settings::Settings,
  syntax::{
    MarkdownClassifier,
    PlainText,
    SyntaxClassifier,
  },
  transaction::Transaction,
};

use crate::cli::SyntaxMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
  Text(String),
  Backspace,
  Left,
  Right,
}

/// Split a script into keys. Plain characters are typed one at a time;
/// `<name>` tokens name special keys.
pub fn parse(script: &str) -> Result<Vec<Key>> {
  let mut keys = Vec::new();
  let mut rest = script;

  while let Some(ch) = rest.chars().next() {
    if ch == '<' {
      let Some(end) = rest.find('>') else {
        bail!("unterminated key name in {rest:?}");
      };
      let key = match &rest[1..end] {
        "bs" => Key::Backspace,
        "left" => Key::Left,
        "right" => Key::Right,
        "dq" => Key::Text("\"\"".into()),
        "sq" => Key::Text("''".into()),
        "lt" => Key::Text("<".into()),
        name => bail!("unknown key <{name}>"),
      };
      keys.push(key);
      rest = &rest[end + 1..];
    } else {
      keys.push(Key::Text(ch.to_string()));
      rest = &rest[ch.len_utf8()..];
    }
  }

  Ok(keys)
}

/// A minimal editor: one document with a single cursor.
pub struct Replay {
  engine:     Engine,
  session:    SessionId,
  classifier: Box<dyn SyntaxClassifier>,
  doc:        Rope,
  selection:  Selection,
}

impl Replay {
  pub fn new(settings: Settings, text: &str, syntax: SyntaxMode) -> Self {
    let mut engine = Engine::new(settings);
    let session = engine.attach();
    let doc = Rope::from(text);
    let selection = Selection::point(doc.len_chars());
    let classifier: Box<dyn SyntaxClassifier> = match syntax {
      SyntaxMode::Markdown => Box::new(MarkdownClassifier),
      SyntaxMode::Plain => Box::new(PlainText),
    };
    Self {
      engine,
      session,
      classifier,
      doc,
      selection,
    }
  }

  pub fn press(&mut self, key: &Key) -> Result<()> {
    match key {
      Key::Text(text) => {
        let tx = match self.engine.on_insert(
          self.session,
          &self.doc,
          &self.selection,
          text,
          self.classifier.as_ref(),
        )? {
          Intercept::Replace(tx) => tx,
          Intercept::PassThrough => Transaction::insert(&self.doc, &self.selection, text)?,
        };
        self.apply(&tx)
      },
      Key::Backspace => {
        let tx = match self
          .engine
          .on_delete(self.session, &self.doc, &self.selection)?
        {
          Intercept::Replace(tx) => tx,
          Intercept::PassThrough => Transaction::delete_backward(&self.doc, &self.selection)?,
        };
        self.apply(&tx)
      },
      Key::Left | Key::Right => {
        let len = self.doc.len_chars();
        let head = self.selection.primary().head;
        let head = if *key == Key::Left {
          head.saturating_sub(1)
        } else {
          (head + 1).min(len)
        };
        self.selection = Selection::point(head);
        self.engine.on_selection_change(self.session)?;
        Ok(())
      },
    }
  }

  fn apply(&mut self, tx: &Transaction) -> Result<()> {
    tx.apply(&mut self.doc)?;
    if let Some(selection) = tx.selection() {
      self.selection = selection.clone();
    }
    Ok(())
  }

  pub fn text(&self) -> String {
    self.doc.to_string()
  }

  /// The document with `|` at every cursor.
  pub fn text_with_cursors(&self) -> String {
    let mut doc = self.doc.clone();
    for range in self.selection.iter().rev() {
      doc.insert_char(range.head, '|');
    }
    doc.to_string()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn replay(text: &str, script: &str) -> Replay {
    let mut replay = Replay::new(Settings::default(), text, SyntaxMode::Markdown);
    for key in parse(script).unwrap() {
      replay.press(&key).unwrap();
    }
    replay
  }

  #[test]
  fn parse_keys() {
    assert_eq!(
      parse("a<bs><dq><lt>-").unwrap(),
      [
        Key::Text("a".into()),
        Key::Backspace,
        Key::Text("\"\"".into()),
        Key::Text("<".into()),
        Key::Text("-".into()),
      ]
    );
    assert!(parse("<bogus>").is_err());
    assert!(parse("a<bs").is_err());
  }

  #[test]
  fn typing_and_reverting() {
    assert_eq!(replay("", "wait... --").text(), "wait… –");
    assert_eq!(replay("", "wait...<bs>").text(), "wait...");
    assert_eq!(replay("", "a --<left><right><bs>").text(), "a ");
  }

  #[test]
  fn auto_paired_quotes() {
    let replay = replay("say ", "<dq>hi");
    assert_eq!(replay.text_with_cursors(), "say “hi|”");
  }

  #[test]
  fn markdown_code_is_left_alone() {
    assert_eq!(replay("", "`a -- b` --").text(), "`a -- b` –");
  }
}
