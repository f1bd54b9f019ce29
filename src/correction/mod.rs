//! Error-correction search. When a sentence doesn't parse, token-level edits
//! (delete, insert, move) are tried in order of edit distance until one makes
//! it parse. The `cyk` and `earley` submodules hold the search strategy of
//! each engine; this module holds what they share.

pub mod cyk;
pub mod earley;

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::stts;
use crate::token::{tag_sequence, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EditKind {
  Deleted,
  Switched,
  Added,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EditDistance {
  One,
  Two,
}

impl EditDistance {
  pub fn value(self) -> usize {
    match self {
      Self::One => 1,
      Self::Two => 2,
    }
  }

  pub fn from_value(value: usize) -> Option<Self> {
    match value {
      1 => Some(Self::One),
      2 => Some(Self::Two),
      _ => None,
    }
  }
}

impl fmt::Display for EditDistance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.value())
  }
}

/// One correction suggestion, rendered once when it is created
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorMessage {
  pub kind: EditKind,
  pub distance: EditDistance,
  pub text: String,
}

impl ErrorMessage {
  pub fn new(kind: EditKind, distance: EditDistance, text: String) -> Self {
    Self {
      kind,
      distance,
      text,
    }
  }

  /// "please delete" message for `tokens[index]`, `tokens` being the sentence
  /// before the deletion
  pub fn deleted(distance: EditDistance, tokens: &[Token], index: usize) -> Self {
    let token = &tokens[index];
    let text = format!(
      "[ERROR]: {}\nPlease delete {}. word '{}' from the sentence!",
      token.document,
      index + 1,
      token.text
    );
    Self::new(EditKind::Deleted, distance, text)
  }

  /// "please insert" message for `tokens[index]`, `tokens` being the sentence
  /// after the edit. Moved tokens are named by their text, added ones by
  /// their tag.
  pub fn inserted(kind: EditKind, distance: EditDistance, tokens: &[Token], index: usize) -> Self {
    let token = &tokens[index];
    let what = if kind == EditKind::Switched {
      format!("the word '{}'", token.text)
    } else {
      format!("a word of the type '{}'", token.pos)
    };

    let place = match (index.checked_sub(1).map(|i| &tokens[i]), tokens.get(index + 1)) {
      (None, Some(next)) => format!(" before '{}'", next.text),
      (Some(prev), None) => format!(" after '{}'", prev.text),
      (Some(prev), Some(next)) => format!(" between '{}' and '{}'", prev.text, next.text),
      (None, None) => String::new(),
    };

    let text = format!("[ERROR]: {}\nPlease insert {}{}!", token.document, what, place);
    Self::new(kind, distance, text)
  }
}

impl fmt::Display for ErrorMessage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.text)
  }
}

/// A single token-level edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
  Delete(usize),
  /// remove the token at `from` and insert it so it ends up at `to`
  Move { from: usize, to: usize },
  /// insert the inventory word for `tag` at `index`
  Insert { index: usize, tag: String },
}

impl Edit {
  pub fn kind(&self) -> EditKind {
    match self {
      Self::Delete(_) => EditKind::Deleted,
      Self::Move { .. } => EditKind::Switched,
      Self::Insert { .. } => EditKind::Added,
    }
  }

  /// Applies the edit to a copy of `tokens`. Inserted tokens span the gap
  /// between their neighbours (zero-width at the sentence edges).
  pub fn apply(&self, tokens: &[Token]) -> Vec<Token> {
    let mut edited = tokens.to_vec();
    match self {
      Self::Delete(index) => {
        edited.remove(*index);
      }
      Self::Move { from, to } => {
        let token = edited.remove(*from);
        edited.insert(*to, token);
      }
      Self::Insert { index, tag } => {
        let (begin, end) = gap(tokens, *index);
        let document = tokens
          .first()
          .map(|t| t.document.clone())
          .unwrap_or_else(|| Rc::from(""));
        let word = stts::word_for_tag(tag).unwrap_or(tag.as_str());
        edited.insert(*index, Token::new(begin, end, word, document, tag.as_str()));
      }
    }
    edited
  }

  /// Renders the message for this edit. `original` is the sentence before
  /// the edit, `edited` after it (and after retagging).
  pub fn message(
    &self,
    distance: EditDistance,
    original: &[Token],
    edited: &[Token],
  ) -> ErrorMessage {
    match self {
      Self::Delete(index) => ErrorMessage::deleted(distance, original, *index),
      Self::Move { to, .. } => ErrorMessage::inserted(EditKind::Switched, distance, edited, *to),
      Self::Insert { index, .. } => {
        ErrorMessage::inserted(EditKind::Added, distance, edited, *index)
      }
    }
  }
}

impl fmt::Display for Edit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Delete(index) => write!(f, "delete {}", index),
      Self::Move { from, to } => write!(f, "move {} -> {}", from, to),
      Self::Insert { index, tag } => write!(f, "insert {} at {}", tag, index),
    }
  }
}

/// Byte span for a token inserted at `index`
fn gap(tokens: &[Token], index: usize) -> (usize, usize) {
  match (index.checked_sub(1).and_then(|i| tokens.get(i)), tokens.get(index)) {
    (Some(prev), Some(next)) => (prev.end, next.begin),
    (None, Some(next)) => (next.begin, next.begin),
    (Some(prev), None) => (prev.end, prev.end),
    (None, None) => (0, 0),
  }
}

/// Per-search state: the tag sequences that were already parsed, so that
/// edits leading to the same retagged sentence are only tried once. Keyed by
/// the number of edits still to be made after that sentence, because a
/// sentence that failed as a final attempt can still be worth extending.
#[derive(Debug, Default)]
pub struct SearchContext {
  tried: HashSet<(usize, Vec<String>)>,
  pub attempts: usize,
}

impl SearchContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records `tokens`; false if the same tag sequence was already tried
  pub fn first_try(&mut self, remaining: usize, tokens: &[Token]) -> bool {
    let fresh = self.tried.insert((remaining, tag_sequence(tokens)));
    if fresh {
      self.attempts += 1;
      debug!(remaining, tags = ?tag_sequence(tokens), "correction attempt");
    }
    fresh
  }

  pub fn clear(&mut self) {
    self.tried.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::{LexiconTagger, Tagger};

  fn tokens(s: &str) -> Vec<Token> {
    let mut tagger = LexiconTagger::with_inventory();
    tagger.insert("steht", "VVFIN");
    tagger.tag(s, 0)
  }

  #[test]
  fn test_apply_edits() {
    let t = tokens("der Tisch steht");

    let deleted = Edit::Delete(1).apply(&t);
    assert_eq!(tag_sequence(&deleted), vec!["ART", "VVFIN"]);

    let moved = Edit::Move { from: 2, to: 0 }.apply(&t);
    assert_eq!(tag_sequence(&moved), vec!["VVFIN", "ART", "NN"]);

    let inserted = Edit::Insert {
      index: 2,
      tag: "ADV".to_string(),
    }
    .apply(&t);
    assert_eq!(inserted[2].text, "schon");
    assert_eq!((inserted[2].begin, inserted[2].end), (9, 10));

    let at_end = Edit::Insert {
      index: 3,
      tag: "$.".to_string(),
    }
    .apply(&t);
    assert_eq!((at_end[3].begin, at_end[3].end), (15, 15));
  }

  #[test]
  fn test_messages() {
    let t = tokens("Tisch steht");
    let msg = ErrorMessage::deleted(EditDistance::One, &t, 1);
    assert_eq!(
      msg.text,
      "[ERROR]: Tisch steht\nPlease delete 2. word 'steht' from the sentence!"
    );

    let edit = Edit::Insert {
      index: 0,
      tag: "ART".to_string(),
    };
    let edited = edit.apply(&t);
    let msg = edit.message(EditDistance::One, &t, &edited);
    assert_eq!(msg.kind, EditKind::Added);
    assert_eq!(
      msg.text,
      "[ERROR]: Tisch steht\nPlease insert a word of the type 'ART' before 'Tisch'!"
    );

    let t = tokens("der steht Tisch");
    let edit = Edit::Move { from: 2, to: 1 };
    let edited = edit.apply(&t);
    assert_eq!(
      edit.message(EditDistance::Two, &t, &edited).text,
      "[ERROR]: der steht Tisch\nPlease insert the word 'Tisch' between 'der' and 'steht'!"
    );
  }

  #[test]
  fn test_search_context_dedup() {
    let mut ctx = SearchContext::new();
    let t = tokens("der Tisch steht");

    assert!(ctx.first_try(0, &t));
    assert!(!ctx.first_try(0, &t));
    assert!(ctx.first_try(1, &t));
    assert_eq!(ctx.attempts, 2);

    ctx.clear();
    assert!(ctx.first_try(0, &t));
  }
}
