use std::fmt;
use std::hash::{Hash, Hasher};

/// A flat grammar production, as produced by the grammar compiler.
///
/// Equality and hashing are structural over the result symbol, the
/// production sequence and the probability; the display name is ignored.
#[derive(Debug, Clone)]
pub struct Rule {
  pub symbol: String,
  pub productions: Vec<String>,
  pub probability: f64,
  pub name: String,
}

impl Rule {
  pub fn new(symbol: String, productions: Vec<String>, probability: f64, name: String) -> Self {
    Self {
      symbol,
      productions,
      probability,
      name,
    }
  }

  pub fn len(&self) -> usize {
    self.productions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl PartialEq for Rule {
  fn eq(&self, other: &Self) -> bool {
    self.symbol == other.symbol
      && self.productions == other.productions
      && self.probability.to_bits() == other.probability.to_bits()
  }
}

impl Eq for Rule {}

impl Hash for Rule {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.symbol.hash(state);
    self.productions.hash(state);
    self.probability.to_bits().hash(state);
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} = {} ({})",
      self.symbol,
      self.productions.join(" "),
      self.probability
    )
  }
}

/// A strictly binary production used by the CYK engine. `left` and `right`
/// are the two child symbols it matches; `symbol` may be a synthetic
/// (integer-named) symbol minted while binarizing a longer rule.
#[derive(Debug, Clone, PartialEq)]
pub struct CnfRule {
  pub left: String,
  pub right: String,
  pub symbol: String,
  pub probability: f64,
  pub name: String,
}

impl CnfRule {
  /// The key this rule is indexed under: `"left;right"`
  pub fn key(&self) -> String {
    cnf_key(&self.left, &self.right)
  }
}

impl fmt::Display for CnfRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} = {} {} ({})",
      self.symbol, self.left, self.right, self.probability
    )
  }
}

pub fn cnf_key(left: &str, right: &str) -> String {
  format!("{};{}", left, right)
}

/// Synthetic CNF symbols are plain integers
pub fn is_synthetic(symbol: &str) -> bool {
  !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  fn rule(symbol: &str, prods: &[&str], p: f64, name: &str) -> Rule {
    Rule::new(
      symbol.to_string(),
      prods.iter().map(|s| s.to_string()).collect(),
      p,
      name.to_string(),
    )
  }

  #[test]
  fn test_structural_equality_ignores_name() {
    let a = rule("NP", &["ART", "NN"], 0.5, "Noun-Phrase");
    let b = rule("NP", &["ART", "NN"], 0.5, "NP");
    let c = rule("NP", &["ART", "NN"], 0.4, "NP");

    assert_eq!(a, b);
    assert_ne!(a, c);

    let set: HashSet<Rule> = vec![a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
  }

  #[test]
  fn test_display() {
    assert_eq!(
      rule("S", &["NP", "VP"], 1.0, "S").to_string(),
      "S = NP VP (1)"
    );
  }

  #[test]
  fn test_is_synthetic() {
    assert!(is_synthetic("0"));
    assert!(is_synthetic("12"));
    assert!(!is_synthetic("NP"));
    assert!(!is_synthetic(""));
  }
}
