use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::GrammarError;
use crate::parse_grammar::parse_rules;
use crate::rules::Rule;

/// Result symbol every complete parse must be rooted in
pub const START_SYMBOL: &str = "S";

/// A compiled grammar: the flat rule set, the rules indexed by their result
/// symbol (which is all the Earley engine needs for prediction) and the
/// display name of every result symbol.
#[derive(Debug, Clone)]
pub struct Grammar {
  pub start: String,
  /// flat rule set, in the order the rules were first compiled
  pub rules: Vec<Rc<Rule>>,
  /// result symbol -> rules producing it
  pub rule_map: HashMap<String, Vec<Rc<Rule>>>,
  /// result symbol -> display name
  pub rule_names: HashMap<String, String>,
}

impl Grammar {
  pub fn new(rules: Vec<(Rule, bool)>) -> Self {
    let mut flat: Vec<Rc<Rule>> = Vec::with_capacity(rules.len());
    let mut rule_map: HashMap<String, Vec<Rc<Rule>>> = HashMap::new();
    let mut rule_names: HashMap<String, String> = HashMap::new();

    // explicit names win over defaults, and the first explicit name wins
    for (rule, explicit) in rules.iter() {
      if *explicit {
        rule_names
          .entry(rule.symbol.clone())
          .or_insert_with(|| rule.name.clone());
      }
    }

    for (rule, _) in rules.into_iter() {
      rule_names
        .entry(rule.symbol.clone())
        .or_insert_with(|| rule.symbol.clone());

      if flat.iter().any(|r| **r == rule) {
        continue;
      }

      let rule = Rc::new(rule);
      rule_map
        .entry(rule.symbol.clone())
        .or_default()
        .push(rule.clone());
      flat.push(rule);
    }

    if !rule_map.contains_key(START_SYMBOL) {
      warn!(start = START_SYMBOL, "grammar has no rules for the start symbol");
    }
    debug!(
      rules = flat.len(),
      symbols = rule_map.len(),
      "compiled grammar"
    );

    Self {
      start: START_SYMBOL.to_string(),
      rules: flat,
      rule_map,
      rule_names,
    }
  }

  /// Reads and compiles a grammar file
  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| GrammarError::from_io(path.to_path_buf(), e))?;
    src.parse()
  }

  /// Compiles the grammar file at `source` if one exists, otherwise reads
  /// `source` as grammar text. A single line without any `=` is always taken
  /// for a path, so a missing file is reported as such.
  pub fn from_source(source: &str) -> Result<Self, GrammarError> {
    let trimmed = source.trim();
    let is_file = !trimmed.contains('\n') && Path::new(trimmed).is_file();
    if is_file || (!trimmed.contains('=') && !trimmed.contains('\n')) {
      Self::read_from_file(trimmed)
    } else {
      trimmed.parse()
    }
  }

  pub fn rules_for(&self, symbol: &str) -> &[Rc<Rule>] {
    self.rule_map.get(symbol).map_or(&[], |v| v.as_slice())
  }

  pub fn is_nonterminal(&self, symbol: &str) -> bool {
    self.rule_map.contains_key(symbol)
  }

  /// Display name of a result symbol, or the symbol itself
  pub fn display_name<'a>(&'a self, symbol: &'a str) -> &'a str {
    self.rule_names.get(symbol).map_or(symbol, |s| s.as_str())
  }
}

impl FromStr for Grammar {
  type Err = GrammarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let rules = parse_rules(s)?;
    if rules.is_empty() {
      return Err(GrammarError::EmptyGrammar);
    }

    Ok(Self::new(
      rules
        .into_iter()
        .map(|f| (f.rule, f.explicit_name))
        .collect(),
    ))
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** start: {}", self.start)?;
    for rule in self.rules.iter() {
      writeln!(f, "{}", rule)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::env;

  const GRAMMAR: &str = r#"
    [Sentence] S = NP VP
    [Noun Phrase] NP = ART NN | NE
    VP = VVFIN NP?
  "#;

  #[test]
  fn test_rule_map_and_names() {
    let g: Grammar = GRAMMAR.parse().unwrap();

    assert_eq!(g.rules.len(), 5);
    assert_eq!(g.rules_for("NP").len(), 2);
    assert_eq!(g.rules_for("VP").len(), 2);
    assert!(g.rules_for("ART").is_empty());
    assert!(g.is_nonterminal("S"));
    assert!(!g.is_nonterminal("NN"));

    assert_eq!(g.display_name("S"), "Sentence");
    assert_eq!(g.display_name("NP"), "Noun-Phrase");
    assert_eq!(g.display_name("VP"), "VP");
    assert_eq!(g.display_name("NN"), "NN");
  }

  #[test]
  fn test_duplicates_collapse() {
    let g: Grammar = "S = NP VP\nS = NP VP\nNP = NN".parse().unwrap();
    assert_eq!(g.rules.len(), 2);
  }

  #[test]
  fn test_empty_grammar() {
    assert!(matches!(
      "\n  // nothing\n".parse::<Grammar>(),
      Err(GrammarError::EmptyGrammar)
    ));
  }

  #[test]
  fn test_from_source_path() {
    let path = env::temp_dir().join(format!("chartmender-grammar-{}.txt", std::process::id()));
    fs::write(&path, GRAMMAR).unwrap();

    let g = Grammar::from_source(path.to_str().unwrap()).unwrap();
    assert_eq!(g.rules.len(), 5);
    fs::remove_file(&path).unwrap();

    assert!(matches!(
      Grammar::from_source("/definitely/not/a/grammar.txt"),
      Err(GrammarError::NotFound { .. })
    ));
  }

  #[test]
  fn test_from_source_path_with_equals() {
    let dir = env::temp_dir().join(format!("chartmender-lang=de-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("grammar.txt");
    fs::write(&path, GRAMMAR).unwrap();

    let g = Grammar::from_source(path.to_str().unwrap()).unwrap();
    assert_eq!(g.rules.len(), 5);
    fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn test_from_source_inline() {
    let g = Grammar::from_source("S = NP VP").unwrap();
    assert_eq!(g.rules.len(), 1);
  }
}
