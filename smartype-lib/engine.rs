//! The entry points a host editor calls.
//!
//! The host forwards every insertion and backspace before applying it. The
//! engine answers with [`Intercept::PassThrough`] (apply your own edit) or
//! [`Intercept::Replace`] with a transaction to apply instead. Cursor moves
//! and edits the engine did not see (undo, paste, other plugins) must be
//! reported so a stale revert record is dropped.
//!
//! ```ignore
//! let mut engine = Engine::new(Settings::default());
//! let session = engine.attach();
//! match engine.on_insert(session, &doc, &selection, "-", &MarkdownClassifier)? {
//!   Intercept::Replace(tx) => apply(tx),
//!   Intercept::PassThrough => insert_normally(),
//! }
//! ```

use ropey::Rope;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
  catalog::{
    Catalog,
    build_catalog,
  },
  compose::{
    Edit,
    adjust_selection,
    build_transaction,
    invert_edits,
  },
  context::{
    Match,
    evaluate,
  },
  revert::{
    RevertRecord,
    Substitution,
  },
  selection::{
    Selection,
    SelectionError,
  },
  session::{
    Session,
    SessionId,
    Sessions,
  },
  settings::{
    Categories,
    GlyphSelector,
    Settings,
  },
  syntax::{
    SuppressionFilter,
    SyntaxClassifier,
  },
  transaction::{
    Transaction,
    TransactionError,
  },
};

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
  #[error("unknown session {0}")]
  UnknownSession(SessionId),
  #[error(transparent)]
  Transaction(#[from] TransactionError),
  #[error(transparent)]
  Selection(#[from] SelectionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept {
  /// Not ours; the host applies its default edit.
  PassThrough,
  /// Apply this instead of the default edit, then adopt its selection.
  Replace(Transaction),
}

#[derive(Debug)]
pub struct Engine {
  settings: Settings,
  catalog:  Catalog,
  sessions: Sessions,
}

impl Default for Engine {
  fn default() -> Self {
    Self::new(Settings::default())
  }
}

impl Engine {
  pub fn new(settings: Settings) -> Self {
    let catalog = build_catalog(&settings);
    Self {
      settings,
      catalog,
      sessions: Sessions::default(),
    }
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn set_settings(&mut self, settings: Settings) {
    self.settings = settings;
    self.catalog = build_catalog(&self.settings);
  }

  /// Change one glyph. Returns false, keeping the previous glyph, unless
  /// `value` is exactly one character.
  pub fn set_glyph(&mut self, selector: GlyphSelector, value: &str) -> bool {
    let changed = self.settings.set_glyph(selector, value);
    if changed {
      self.catalog = build_catalog(&self.settings);
    }
    changed
  }

  pub fn set_enabled(&mut self, categories: Categories, enabled: bool) {
    self.settings.set_enabled(categories, enabled);
    self.catalog = build_catalog(&self.settings);
  }

  pub fn attach(&mut self) -> SessionId {
    self.sessions.attach()
  }

  pub fn detach(&mut self, id: SessionId) -> Result<()> {
    if self.sessions.detach(id) {
      Ok(())
    } else {
      Err(EngineError::UnknownSession(id))
    }
  }

  pub fn sessions(&self) -> &Sessions {
    &self.sessions
  }

  /// The host is about to insert `text` at every range of `selection`.
  ///
  /// Every cursor is evaluated against `doc` as it was before this insert,
  /// so one cursor never sees what another cursor is typing. With `-` and
  /// cursors at 0 and 1, the second cursor forms `–` from the existing dash
  /// while the first inserts a plain `-`, giving `-–`.
  pub fn on_insert(
    &mut self,
    id: SessionId,
    doc: &Rope,
    selection: &Selection,
    text: &str,
    classifier: &dyn SyntaxClassifier,
  ) -> Result<Intercept> {
    tracing::trace!(%id, ?text, ?selection, "insert hook");
    let Self {
      settings,
      catalog,
      sessions,
    } = self;
    let session = session_mut(sessions, id)?;
    selection.ensure_within(doc.len_chars())?;

    if !catalog.has_trigger(text) {
      session.revert.clear();
      return Ok(Intercept::PassThrough);
    }

    let mut filter = SuppressionFilter::new(classifier, settings.suppress_in);
    let mut edits: SmallVec<[Edit; 1]> = SmallVec::with_capacity(selection.len());
    let mut matches: SmallVec<[Option<Match<'_>>; 1]> = SmallVec::with_capacity(selection.len());
    let mut prev_end = 0;

    for range in selection {
      let pos = range.from();
      let found = evaluate(catalog, settings, doc, pos, text, &mut filter)
        // a span reaching back into the previous cursor's edit cannot be
        // replaced without clobbering it
        .filter(|found| found.from >= prev_end);
      let edit = match &found {
        Some(found) => {
          Edit::new(found.from, range.to(), found.output().clone())
            .with_cursor_back(found.cursor_back())
        },
        None => Edit::new(pos, range.to(), text).with_cursor_back(plain_cursor_back(text)),
      };
      prev_end = range.to();
      edits.push(edit);
      matches.push(found);
    }

    if matches.iter().all(Option::is_none) {
      session.revert.clear();
      return Ok(Intercept::PassThrough);
    }

    let primary = selection.primary_index();
    let forward = build_transaction(doc, &edits, primary)?;
    let expected = adjust_selection(&edits, primary)?;

    let post = forward.apply_to(doc)?;
    let inverse_edits = invert_edits(
      &edits,
      matches
        .iter()
        .map(|found| found.as_ref().map(|found| (&found.literal, found.cursor_back()))),
    );
    let inverse = build_transaction(&post, &inverse_edits, primary)?;

    let substitutions = matches
      .into_iter()
      .zip(&inverse_edits)
      .map(|(found, inverse_edit)| {
        found.map(|found| {
          Substitution {
            rule:        found.entry.rule.name,
            from:        inverse_edit.from,
            output:      found.output().clone(),
            cursor_back: found.cursor_back(),
            literal:     found.literal,
          }
        })
      })
      .collect();
    let record = RevertRecord::new(inverse, expected, substitutions);
    for sub in record.substitutions() {
      tracing::debug!(%id, rule = sub.rule, at = sub.from, output = %sub.output, "substituted");
    }
    session.revert.record(record);

    Ok(Intercept::Replace(forward))
  }

  /// The host is about to delete backward at `selection`.
  pub fn on_delete(
    &mut self,
    id: SessionId,
    doc: &Rope,
    selection: &Selection,
  ) -> Result<Intercept> {
    tracing::trace!(%id, ?selection, "delete hook");
    let session = session_mut(&mut self.sessions, id)?;
    match session.revert.take_for_delete(doc, selection) {
      Some(inverse) => {
        tracing::debug!(%id, "reverting substitution");
        Ok(Intercept::Replace(inverse))
      },
      None => Ok(Intercept::PassThrough),
    }
  }

  pub fn on_selection_change(&mut self, id: SessionId) -> Result<()> {
    if session_mut(&mut self.sessions, id)?.revert.clear() {
      tracing::trace!(%id, "cursor moved, revert dropped");
    }
    Ok(())
  }

  /// An edit the engine did not intercept, such as an undo.
  pub fn on_external_edit(&mut self, id: SessionId) -> Result<()> {
    if session_mut(&mut self.sessions, id)?.revert.clear() {
      tracing::trace!(%id, "external edit, revert dropped");
    }
    Ok(())
  }

  pub fn pending_revert(&self, id: SessionId) -> Result<Option<&RevertRecord>> {
    self
      .sessions
      .get(id)
      .map(|session| session.revert.pending())
      .ok_or(EngineError::UnknownSession(id))
  }
}

fn session_mut(sessions: &mut Sessions, id: SessionId) -> Result<&mut Session> {
  sessions
    .get_mut(id)
    .ok_or(EngineError::UnknownSession(id))
}

// An auto-paired `""` leaves the cursor between its halves.
fn plain_cursor_back(text: &str) -> usize {
  let mut chars = text.chars();
  match (chars.next(), chars.next(), chars.next()) {
    (Some(first), Some(second), None) if first == second => 1,
    _ => 0,
  }
}
