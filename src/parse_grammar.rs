//! Line-oriented parsing of extended BNF grammars into flat rules

use regex::Regex;
use tracing::warn;

use crate::error::GrammarError;
use crate::rules::{is_synthetic, Rule};

const OPERATORS: [char; 3] = ['*', '+', '?'];

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// A compiled rule, plus whether its display name came from an explicit
/// `[Name]` bracket or just defaulted to the result symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRule {
  pub rule: Rule,
  pub explicit_name: bool,
}

/// The parts of one production line, before any operator is expanded
#[derive(Debug, PartialEq)]
struct Header {
  name: Option<String>,
  symbol: String,
  rhs: String,
  probability: f64,
}

/// Parses every non-blank, non-comment line of `s` into flat rules.
/// Fails on the first malformed line.
pub fn parse_rules(s: &str) -> Result<Vec<FlatRule>, GrammarError> {
  let mut rules = Vec::new();
  for line in s.lines() {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
      continue;
    }
    rules.extend(parse_line(line)?);
  }
  Ok(rules)
}

/// Parses one production line: `[Name] LHS = RHS [probability]`
pub fn parse_line(line: &str) -> Result<Vec<FlatRule>, GrammarError> {
  let header = parse_header(line)?;
  let explicit_name = header.name.is_some();
  let name = header.name.unwrap_or_else(|| header.symbol.clone());

  let mut rules = Vec::new();
  for alternative in expand_groups(&header.rhs, line)? {
    let tokens = alternative
      .split_whitespace()
      .map(|s| s.to_string())
      .collect::<Vec<_>>();

    for (symbol, productions) in expand_operators(&header.symbol, tokens) {
      if productions.is_empty() {
        warn!(line, symbol = %symbol, "discarding empty alternative");
        continue;
      }

      let (name, explicit) = if symbol == header.symbol {
        (name.clone(), explicit_name)
      } else {
        (symbol.clone(), false)
      };

      let flat = FlatRule {
        rule: Rule::new(symbol, productions, header.probability, name),
        explicit_name: explicit,
      };
      if !rules.contains(&flat) {
        rules.push(flat);
      }
    }
  }

  Ok(rules)
}

/// Pulls the display name, the result symbol, the raw right-hand side and
/// the trailing probability out of a line, normalizing whitespace around
/// `|`, `=`, `(` and `)` on the way
fn parse_header(line: &str) -> Result<Header, GrammarError> {
  regex_static!(NAME, r"\[([^\]]*)\]");
  regex_static!(PIPE, r"\s*\|\s*");
  regex_static!(EQUALS, r"\s*=\s*");
  regex_static!(OPEN, r"\(\s*");
  regex_static!(CLOSE, r"\s*\)");
  regex_static!(AFTER_CLOSE, r"\)([^\s*+?|)])");
  regex_static!(SPACES, r"\s+");
  regex_static!(PROBABILITY, r"^\d+(\.\d+)?$");

  let (name, rest) = match NAME.captures(line) {
    Some(caps) => {
      let whole = caps.get(0).map_or("", |m| m.as_str());
      let inner = caps.get(1).map_or("", |m| m.as_str());
      let name = inner.split_whitespace().collect::<Vec<_>>().join("-");
      (Some(name).filter(|n| !n.is_empty()), line.replacen(whole, " ", 1))
    }
    None => (None, line.to_string()),
  };

  let formatted = PIPE.replace_all(&rest, "|");
  let formatted = EQUALS.replace_all(&formatted, "=");
  let formatted = OPEN.replace_all(&formatted, " (");
  let formatted = CLOSE.replace_all(&formatted, ")");
  let formatted = AFTER_CLOSE.replace_all(&formatted, ") $1");
  let formatted = SPACES.replace_all(&formatted, " ");
  let formatted = formatted.trim();

  let (symbol, rhs) = formatted
    .split_once('=')
    .ok_or_else(|| GrammarError::MissingEquals {
      line: line.to_string(),
    })?;

  let symbol = symbol.trim();
  if symbol.is_empty()
    || symbol.contains(' ')
    || symbol.contains(|c: char| OPERATORS.contains(&c) || "|()=".contains(c))
    // integers name synthetic CNF symbols
    || is_synthetic(symbol)
  {
    return Err(GrammarError::EmptySymbol {
      line: line.to_string(),
    });
  }

  let mut rhs = rhs.trim().to_string();
  let mut probability = 1.0;
  if let Some((head, last)) = rhs.rsplit_once(' ') {
    if PROBABILITY.is_match(last) {
      probability = parse_probability(last, line)?;
      rhs = head.trim().to_string();
    }
  } else if PROBABILITY.is_match(&rhs) {
    probability = parse_probability(&rhs, line)?;
    rhs.clear();
  }

  Ok(Header {
    name,
    symbol: symbol.to_string(),
    rhs,
    probability,
  })
}

fn parse_probability(s: &str, line: &str) -> Result<f64, GrammarError> {
  let value = s.parse::<f64>().map_err(|_| GrammarError::InvalidProbability {
    line: line.to_string(),
    value: f64::NAN,
  })?;

  if value > 0.0 && value <= 1.0 {
    Ok(value)
  } else {
    Err(GrammarError::InvalidProbability {
      line: line.to_string(),
      value,
    })
  }
}

/// Index of the parenthesis closing the one opened at `start`
fn matching_paren(s: &str, start: usize) -> Option<usize> {
  let mut depth = 0usize;
  for (idx, c) in s[start..].char_indices() {
    match c {
      '(' => depth += 1,
      ')' => {
        depth -= 1;
        if depth == 0 {
          return Some(start + idx);
        }
      }
      _ => {}
    }
  }
  None
}

/// Splits on `|` at nesting depth 0 only
fn split_top_level<'a>(s: &'a str, line: &str) -> Result<Vec<&'a str>, GrammarError> {
  let mut items = Vec::new();
  let mut depth = 0i32;
  let mut start = 0;
  for (idx, c) in s.char_indices() {
    match c {
      '(' => depth += 1,
      ')' => depth -= 1,
      '|' if depth == 0 => {
        items.push(&s[start..idx]);
        start = idx + 1;
      }
      _ => {}
    }
    if depth < 0 {
      return Err(GrammarError::UnbalancedParenthesis {
        line: line.to_string(),
      });
    }
  }
  items.push(&s[start..]);
  Ok(items)
}

/// Rewrites a right-hand side into its flat, pipe-free alternatives.
/// The first parenthesized group is replaced by each of its (recursively
/// flattened) alternatives in turn; once no group remains the top-level `|`
/// alternatives are split apart.
fn expand_groups(rhs: &str, line: &str) -> Result<Vec<String>, GrammarError> {
  let unbalanced = || GrammarError::UnbalancedParenthesis {
    line: line.to_string(),
  };

  let alternatives = if let Some(start) = rhs.find('(') {
    let end = matching_paren(rhs, start).ok_or_else(unbalanced)?;

    let mut items = Vec::new();
    for item in split_top_level(&rhs[start + 1..end], line)? {
      items.extend(expand_groups(item, line)?);
    }

    // an operator right after the group distributes onto single-symbol alternatives
    let rest = &rhs[end + 1..];
    let (op, rest) = match rest.chars().next() {
      Some(c) if OPERATORS.contains(&c) => (Some(c), &rest[c.len_utf8()..]),
      _ => (None, rest),
    };
    if op.is_some() && items.iter().any(|i| i.split_whitespace().count() > 1) {
      return Err(GrammarError::AmbiguousGroupOperator {
        line: line.to_string(),
      });
    }

    let mut alternatives = Vec::new();
    for item in items {
      let item = match op {
        Some(op) if !item.trim().is_empty() => format!("{}{}", item.trim(), op),
        _ => item,
      };
      let rewritten = format!("{}{}{}", &rhs[..start], item, rest);
      alternatives.extend(expand_groups(&rewritten, line)?);
    }
    alternatives
  } else if rhs.contains(')') {
    return Err(unbalanced());
  } else {
    rhs.split('|').map(|s| s.trim().to_string()).collect()
  };

  let mut unique = Vec::with_capacity(alternatives.len());
  for alt in alternatives {
    if !unique.contains(&alt) {
      unique.push(alt);
    }
  }
  Ok(unique)
}

/// Expands the first symbol carrying `*`, `+` or `?` (scanning left to right)
/// and recurses until no operator remains. Returns (result symbol,
/// productions) pairs; a pair may have no productions when an optional
/// symbol was the only one.
fn expand_operators(symbol: &str, tokens: Vec<String>) -> Vec<(String, Vec<String>)> {
  let Some(idx) = tokens.iter().position(|t| t.ends_with(OPERATORS)) else {
    return vec![(symbol.to_string(), tokens)];
  };

  let token = &tokens[idx];
  let op = token.chars().last().unwrap_or('?');
  let base = token[..token.len() - op.len_utf8()].to_string();

  let mut stripped = tokens.clone();
  stripped[idx] = base.clone();

  let mut without = tokens.clone();
  without.remove(idx);

  let mut out = Vec::new();
  match op {
    '*' => {
      // one-or-more, plus the variant without the symbol at all
      let mut plus = tokens.clone();
      plus[idx] = format!("{}+", base);
      out.extend(expand_operators(symbol, plus));
      if tokens.len() > 2 {
        out.extend(expand_operators(symbol, without));
      }
    }
    '+' => {
      let bare = base.trim_end_matches(OPERATORS).to_string();
      if idx == 0 {
        out.push((symbol.to_string(), vec![bare, symbol.to_string()]));
      } else {
        out.push((bare.clone(), vec![bare.clone(), bare]));
      }
      out.extend(expand_operators(symbol, stripped));
    }
    _ => {
      out.extend(expand_operators(symbol, stripped));
      if without.is_empty() {
        out.push((symbol.to_string(), without));
      } else {
        out.extend(expand_operators(symbol, without));
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn flat(line: &str) -> Vec<(String, Vec<String>)> {
    parse_line(line)
      .unwrap()
      .into_iter()
      .map(|f| (f.rule.symbol, f.rule.productions))
      .collect()
  }

  fn r(symbol: &str, prods: &[&str]) -> (String, Vec<String>) {
    (
      symbol.to_string(),
      prods.iter().map(|s| s.to_string()).collect(),
    )
  }

  #[test]
  fn test_plain_rule() {
    let rules = parse_line("S = NP VP").unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(
      rules[0].rule,
      Rule::new(
        "S".to_string(),
        vec!["NP".to_string(), "VP".to_string()],
        1.0,
        "S".to_string()
      )
    );
    assert!(!rules[0].explicit_name);
  }

  #[test]
  fn test_pipe() {
    assert_eq!(flat("A = b | c"), vec![r("A", &["b"]), r("A", &["c"])]);
  }

  #[test]
  fn test_plus() {
    assert_eq!(flat("A = x+"), vec![r("A", &["x", "A"]), r("A", &["x"])]);
    assert_eq!(
      flat("NP = ART ADJA+ NN"),
      vec![r("ADJA", &["ADJA", "ADJA"]), r("NP", &["ART", "ADJA", "NN"])]
    );
  }

  #[test]
  fn test_question_drops_empty_alternative() {
    assert_eq!(flat("A = x?"), vec![r("A", &["x"])]);
    assert_eq!(
      flat("NP = ART? NN"),
      vec![r("NP", &["ART", "NN"]), r("NP", &["NN"])]
    );
  }

  #[test]
  fn test_star() {
    assert_eq!(
      flat("NP = ART ADJA* NN"),
      vec![
        r("ADJA", &["ADJA", "ADJA"]),
        r("NP", &["ART", "ADJA", "NN"]),
        r("NP", &["ART", "NN"]),
      ]
    );
    // at the front the repetition recurses on the result symbol, and with
    // only one symbol left there is no absent variant
    assert_eq!(
      flat("VP = ADV* VVFIN"),
      vec![r("VP", &["ADV", "VP"]), r("VP", &["ADV", "VVFIN"])]
    );
  }

  #[test]
  fn test_brackets() {
    assert_eq!(
      flat("NP = ART (ADJA | ADV) NN"),
      vec![r("NP", &["ART", "ADJA", "NN"]), r("NP", &["ART", "ADV", "NN"])]
    );
    assert_eq!(
      flat("X = (a (b | c) | d) e"),
      vec![r("X", &["a", "b", "e"]), r("X", &["a", "c", "e"]), r("X", &["d", "e"])]
    );
    assert_eq!(
      flat("X = (a|b)? c"),
      vec![r("X", &["a", "c"]), r("X", &["c"]), r("X", &["b", "c"])]
    );
  }

  #[test]
  fn test_name_and_probability() {
    let rules = parse_line("[Noun Phrase] NP = ART NN 0.25").unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].rule.name, "Noun-Phrase");
    assert_eq!(rules[0].rule.probability, 0.25);
    assert_eq!(rules[0].rule.productions, vec!["ART", "NN"]);
    assert!(rules[0].explicit_name);

    let rules = parse_line("VP = VVFIN | VVFIN NP 1").unwrap();
    assert_eq!(rules.len(), 2);
    assert!(rules.iter().all(|f| f.rule.probability == 1.0));
  }

  #[test]
  fn test_malformed() {
    assert!(matches!(
      parse_line("S NP VP"),
      Err(GrammarError::MissingEquals { .. })
    ));
    assert!(matches!(
      parse_line("S = (NP | VP"),
      Err(GrammarError::UnbalancedParenthesis { .. })
    ));
    assert!(matches!(
      parse_line("S = NP | VP)"),
      Err(GrammarError::UnbalancedParenthesis { .. })
    ));
    assert!(matches!(
      parse_line("S = (ART NN | NE)+ VP"),
      Err(GrammarError::AmbiguousGroupOperator { .. })
    ));
    assert!(matches!(
      parse_line("S = NP VP 1.5"),
      Err(GrammarError::InvalidProbability { .. })
    ));
    assert!(matches!(
      parse_line("A B = c"),
      Err(GrammarError::EmptySymbol { .. })
    ));
    assert!(matches!(
      parse_line("12 = ART NN"),
      Err(GrammarError::EmptySymbol { .. })
    ));
  }

  #[test]
  fn test_parse_rules_skips_comments_and_blanks() {
    let rules = parse_rules(
      r#"
      // sentence
      S = NP VP

      NP = ART NN
    "#,
    )
    .unwrap();
    assert_eq!(rules.len(), 2);
  }
}
