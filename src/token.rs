use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use tracing::warn;

use crate::error::GrammarError;
use crate::stts;

/// Characters that end a token and are tokens themselves
const DELIMITERS: &[char] = &[',', '.', '?', '!', ';', '-', '"'];

/// A tagged token. `begin..end` are byte offsets into the text the sentence
/// was taken from; `document` is the sentence itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
  pub begin: usize,
  pub end: usize,
  pub text: String,
  pub document: Rc<str>,
  pub pos: String,
}

impl Token {
  pub fn new(
    begin: usize,
    end: usize,
    text: impl Into<String>,
    document: Rc<str>,
    pos: impl Into<String>,
  ) -> Self {
    Self {
      begin,
      end,
      text: text.into(),
      document,
      pos: pos.into(),
    }
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} [{} {}] ({})", self.text, self.begin, self.end, self.pos)
  }
}

/// The tag sequence of a token list, used as the dedup key while searching
pub fn tag_sequence(tokens: &[Token]) -> Vec<String> {
  tokens.iter().map(|t| t.pos.clone()).collect()
}

/// Splits a sentence on whitespace and on `, . ? ! ; - "`, keeping the
/// punctuation as tokens of its own. Offsets are shifted by `start`; tokens
/// come back untagged.
pub fn tokenize(sentence: &str, start: usize) -> Vec<Token> {
  let document: Rc<str> = Rc::from(sentence);
  let mut tokens = Vec::new();
  let mut word_start: Option<usize> = None;

  let flush = |from: Option<usize>, to: usize, tokens: &mut Vec<Token>| {
    if let Some(from) = from {
      tokens.push(Token::new(start + from, start + to, &sentence[from..to], document.clone(), ""));
    }
  };

  for (idx, c) in sentence.char_indices() {
    if c.is_whitespace() {
      flush(word_start.take(), idx, &mut tokens);
    } else if DELIMITERS.contains(&c) {
      flush(word_start.take(), idx, &mut tokens);
      flush(Some(idx), idx + c.len_utf8(), &mut tokens);
    } else if word_start.is_none() {
      word_start = Some(idx);
    }
  }
  flush(word_start.take(), sentence.len(), &mut tokens);

  tokens
}

/// A part-of-speech tagger: turns a sentence into tagged tokens
pub trait Tagger {
  /// Tags `sentence`, whose first byte sits at offset `start` of the text
  fn tag(&self, sentence: &str, start: usize) -> Vec<Token>;

  /// Re-tags an edited token sequence as one sentence and copies the new
  /// tags onto copies of the tokens. Neighbouring tags may change when a
  /// token is moved, added or removed.
  fn retag(&self, tokens: &[Token]) -> Vec<Token> {
    let joined = tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
    let tagged = self.tag(&joined, 0);

    if tagged.len() != tokens.len() {
      warn!(
        expected = tokens.len(),
        got = tagged.len(),
        sentence = %joined,
        "retagging changed the token count, keeping previous tags"
      );
      return tokens.to_vec();
    }

    tokens
      .iter()
      .zip(tagged)
      .map(|(token, tagged)| Token {
        pos: tagged.pos,
        ..token.clone()
      })
      .collect()
  }
}

/// Tags words by looking them up in a word -> tag table. Words are tried
/// as-is, then lowercased; punctuation gets the STTS punctuation tags and
/// anything else the fallback tag.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
  lexicon: HashMap<String, String>,
  fallback: String,
}

impl Default for LexiconTagger {
  fn default() -> Self {
    Self::new()
  }
}

impl LexiconTagger {
  pub fn new() -> Self {
    Self {
      lexicon: HashMap::new(),
      fallback: "XY".to_string(),
    }
  }

  /// A tagger that knows the representative word of every inventory tag.
  /// Where two tags share a word the first one listed wins.
  pub fn with_inventory() -> Self {
    let mut tagger = Self::new();
    for (tag, word) in stts::INVENTORY {
      tagger.lexicon.entry(word.to_string()).or_insert_with(|| tag.to_string());
    }
    tagger
  }

  pub fn with_fallback(mut self, tag: impl Into<String>) -> Self {
    self.fallback = tag.into();
    self
  }

  pub fn insert(&mut self, word: impl Into<String>, tag: impl Into<String>) {
    self.lexicon.insert(word.into(), tag.into());
  }

  /// Adds every `word TAG` line of `s`, overriding earlier entries
  pub fn extend_from_str(&mut self, s: &str) -> Result<(), GrammarError> {
    for line in s.lines().map(str::trim) {
      if line.is_empty() || line.starts_with("//") {
        continue;
      }

      let fields = line.split_whitespace().collect::<Vec<_>>();
      match fields.as_slice() {
        [word, tag] => self.insert(*word, *tag),
        _ => {
          return Err(GrammarError::InvalidLexiconEntry {
            line: line.to_string(),
          });
        }
      }
    }
    Ok(())
  }

  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| GrammarError::from_io(path.to_path_buf(), e))?;
    src.parse()
  }

  pub fn len(&self) -> usize {
    self.lexicon.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lexicon.is_empty()
  }

  pub fn lookup(&self, word: &str) -> &str {
    if let Some(tag) = self
      .lexicon
      .get(word)
      .or_else(|| self.lexicon.get(&word.to_lowercase()))
    {
      return tag;
    }

    match word {
      "," => "$,",
      "." | "?" | "!" | ";" | ":" => "$.",
      "-" | "\"" | "(" | ")" | "[" | "]" => "$(",
      _ => self.fallback.as_str(),
    }
  }
}

impl FromStr for LexiconTagger {
  type Err = GrammarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut tagger = Self::new();
    tagger.extend_from_str(s)?;
    Ok(tagger)
  }
}

impl Tagger for LexiconTagger {
  fn tag(&self, sentence: &str, start: usize) -> Vec<Token> {
    let mut tokens = tokenize(sentence, start);
    for token in tokens.iter_mut() {
      token.pos = self.lookup(&token.text).to_string();
    }
    tokens
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tokenize_offsets() {
    let tokens = tokenize("Der Tisch, der steht.", 10);
    let texts = tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>();
    assert_eq!(texts, vec!["Der", "Tisch", ",", "der", "steht", "."]);

    assert_eq!((tokens[0].begin, tokens[0].end), (10, 13));
    assert_eq!((tokens[2].begin, tokens[2].end), (19, 20));
    assert_eq!((tokens[5].begin, tokens[5].end), (30, 31));
    assert_eq!(&*tokens[0].document, "Der Tisch, der steht.");
  }

  #[test]
  fn test_tokenize_multibyte_and_blanks() {
    let tokens = tokenize("  große   Tür ", 0);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].text, "große");
    assert_eq!((tokens[0].begin, tokens[0].end), (2, 8));
    assert_eq!(tokens[1].text, "Tür");
  }

  #[test]
  fn test_lexicon_tagger() {
    let tagger: LexiconTagger = r#"
      // tiny lexicon
      der ART
      Tisch NN
      steht VVFIN
    "#
    .parse()
    .unwrap();

    let tags = tag_sequence(&tagger.tag("Der Tisch steht, oder?", 0));
    assert_eq!(tags, vec!["ART", "NN", "VVFIN", "$,", "XY", "$."]);

    assert!(matches!(
      "der ART extra".parse::<LexiconTagger>(),
      Err(GrammarError::InvalidLexiconEntry { .. })
    ));
  }

  #[test]
  fn test_inventory_seed() {
    let tagger = LexiconTagger::with_inventory();
    // "der" is both ART and PRELS, ART comes first
    assert_eq!(tagger.lookup("der"), "ART");
    assert_eq!(tagger.lookup("gehst"), "VVFIN");
    assert_eq!(tagger.lookup("Quatsch"), "XY");
  }

  #[test]
  fn test_retag_copies_tags() {
    let mut tagger = LexiconTagger::with_inventory();
    tagger.insert("steht", "VVFIN");

    let mut tokens = tagger.tag("Tisch steht", 4);
    tokens.insert(0, Token::new(4, 4, "der", tokens[0].document.clone(), "PRELS"));

    let retagged = tagger.retag(&tokens);
    assert_eq!(tag_sequence(&retagged), vec!["ART", "NN", "VVFIN"]);
    // offsets and document are kept from the edited tokens
    assert_eq!((retagged[1].begin, retagged[1].end), (4, 9));
    assert_eq!(retagged[0].document, tokens[0].document);
  }
}
