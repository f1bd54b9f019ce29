use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or compiling a grammar (or a text to parse)
#[derive(Debug, Error)]
pub enum GrammarError {
  #[error("the given path cannot be found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("couldn't read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("rule is missing '=': {line}")]
  MissingEquals { line: String },

  #[error("rule needs exactly one result symbol: {line}")]
  EmptySymbol { line: String },

  #[error("unbalanced parenthesis in rule: {line}")]
  UnbalancedParenthesis { line: String },

  #[error("operator after a group of multi-symbol alternatives: {line}")]
  AmbiguousGroupOperator { line: String },

  #[error("probability {value} is outside (0, 1] in rule: {line}")]
  InvalidProbability { line: String, value: f64 },

  #[error("empty ruleset")]
  EmptyGrammar,

  #[error("lexicon entry must be `word TAG`: {line}")]
  InvalidLexiconEntry { line: String },
}

impl GrammarError {
  pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
    if source.kind() == io::ErrorKind::NotFound {
      Self::NotFound { path }
    } else {
      Self::Io { path, source }
    }
  }
}
