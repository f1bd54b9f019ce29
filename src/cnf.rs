use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::grammar::Grammar;
use crate::rules::{cnf_key, is_synthetic, CnfRule, Rule};

/// `symbol = child`, applied by the CYK engine as a closure over each cell
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryRule {
  pub child: String,
  pub symbol: String,
  pub probability: f64,
}

/// The CYK view of a grammar: every production of two or more symbols is
/// binarized into `rule_set`, keyed by `"left;right"`. Longer productions are
/// split right to left into synthetic integer symbols, whose expansion text is
/// kept in `split_rules` for rendering.
#[derive(Debug)]
pub struct CnfGrammar {
  pub grammar: Grammar,
  pub rule_set: HashMap<String, CnfRule>,
  /// child symbol -> unary rules producing something from it
  pub unary_rules: HashMap<String, Vec<UnaryRule>>,
  pub split_rules: HashMap<usize, String>,
  next_split: usize,
}

/// A CYK chart entry. Terminals have no children and probability 1.0; unary
/// entries only have a `right` child.
#[derive(Debug, Clone, PartialEq)]
pub struct CykToken {
  pub name: String,
  pub symbol: String,
  pub probability: f64,
  pub left: Option<Rc<CykToken>>,
  pub right: Option<Rc<CykToken>>,
  pub begin: usize,
  pub end: usize,
}

impl CykToken {
  pub fn terminal(tag: &str, begin: usize, end: usize) -> Self {
    Self {
      name: tag.to_string(),
      symbol: tag.to_string(),
      probability: 1.0,
      left: None,
      right: None,
      begin,
      end,
    }
  }

  pub fn is_terminal(&self) -> bool {
    self.left.is_none() && self.right.is_none()
  }
}

impl fmt::Display for CykToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {} ({})", self.begin, self.end, self.symbol, self.probability)
  }
}

impl CnfGrammar {
  pub fn new(grammar: Grammar) -> Self {
    let mut cnf = Self {
      grammar,
      rule_set: HashMap::new(),
      unary_rules: HashMap::new(),
      split_rules: HashMap::new(),
      next_split: 0,
    };

    // shorter rules first, so real binary rules are in place before longer
    // rules look for a pair to reuse
    let mut rules = cnf.grammar.rules.clone();
    rules.sort_by_key(|r| r.len());

    for rule in rules.iter() {
      cnf.add_rule(rule);
    }

    debug!(
      binary = cnf.rule_set.len(),
      unary = cnf.unary_rules.values().map(Vec::len).sum::<usize>(),
      synthetic = cnf.split_rules.len(),
      "indexed grammar for cyk"
    );

    cnf
  }

  pub fn start(&self) -> &str {
    &self.grammar.start
  }

  fn add_rule(&mut self, rule: &Rule) {
    match rule.len() {
      0 => {}
      1 => {
        self
          .unary_rules
          .entry(rule.productions[0].clone())
          .or_default()
          .push(UnaryRule {
            child: rule.productions[0].clone(),
            symbol: rule.symbol.clone(),
            probability: rule.probability,
          });
      }
      _ => self.binarize(rule, rule.productions.clone()),
    }
  }

  fn binarize(&mut self, rule: &Rule, mut symbols: Vec<String>) {
    while symbols.len() > 2 {
      let (Some(right), Some(left)) = (symbols.pop(), symbols.pop()) else {
        return;
      };
      let key = cnf_key(&left, &right);

      let intermediate = if let Some(existing) = self.rule_set.get(&key) {
        existing.symbol.clone()
      } else {
        let n = self.next_split;
        self.next_split += 1;
        let text = format!("{} {}", self.display(&left), self.display(&right));
        self.split_rules.insert(n, text);

        let symbol = n.to_string();
        self.rule_set.insert(
          key,
          CnfRule {
            left,
            right,
            symbol: symbol.clone(),
            probability: 1.0,
            name: symbol.clone(),
          },
        );
        symbol
      };

      symbols.push(intermediate);
    }

    let right = symbols.pop().unwrap_or_default();
    let left = symbols.pop().unwrap_or_default();
    let key = cnf_key(&left, &right);

    if let Some(previous) = self.rule_set.get(&key) {
      if previous.symbol != rule.symbol {
        warn!(
          %key,
          previous = %previous.symbol,
          symbol = %rule.symbol,
          "cnf key collision, overwriting"
        );
      }
    }

    self.rule_set.insert(
      key,
      CnfRule {
        left,
        right,
        symbol: rule.symbol.clone(),
        probability: rule.probability,
        name: self.grammar.display_name(&rule.symbol).to_string(),
      },
    );
  }

  /// Human-readable text for a symbol: synthetic symbols resolve to their
  /// expansion, everything else to its display name.
  pub fn display(&self, symbol: &str) -> String {
    if is_synthetic(symbol) {
      symbol
        .parse::<usize>()
        .ok()
        .and_then(|n| self.split_rules.get(&n))
        .cloned()
        .unwrap_or_else(|| symbol.to_string())
    } else {
      self.grammar.display_name(symbol).to_string()
    }
  }

  /// Combines two adjacent chart entries through the rule indexed under
  /// their symbols, if there is one
  pub fn find_matching_rule(
    &self,
    left: &Rc<CykToken>,
    right: &Rc<CykToken>,
  ) -> Option<Rc<CykToken>> {
    let rule = self.rule_set.get(&cnf_key(&left.symbol, &right.symbol))?;

    Some(Rc::new(CykToken {
      name: self.display(&rule.symbol),
      symbol: rule.symbol.clone(),
      probability: rule.probability * left.probability * right.probability,
      left: Some(left.clone()),
      right: Some(right.clone()),
      begin: left.begin,
      end: right.end,
    }))
  }

  /// Every unary derivation reachable from `token`, not including `token`
  /// itself. A symbol is used at most once per chain.
  pub fn unary_closure(&self, token: &Rc<CykToken>) -> Vec<Rc<CykToken>> {
    let mut out = Vec::new();
    let mut stack = vec![(token.clone(), vec![token.symbol.clone()])];

    while let Some((child, seen)) = stack.pop() {
      for rule in self.unary_rules.get(&child.symbol).map_or(&[][..], |v| v.as_slice()) {
        if seen.contains(&rule.symbol) {
          continue;
        }

        let parent = Rc::new(CykToken {
          name: self.display(&rule.symbol),
          symbol: rule.symbol.clone(),
          probability: rule.probability * child.probability,
          left: None,
          right: Some(child.clone()),
          begin: child.begin,
          end: child.end,
        });

        let mut seen = seen.clone();
        seen.push(rule.symbol.clone());
        out.push(parent.clone());
        stack.push((parent, seen));
      }
    }

    out
  }
}

impl fmt::Display for CnfGrammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut binary = self.rule_set.values().collect::<Vec<_>>();
    binary.sort_by(|a, b| a.key().cmp(&b.key()));
    for rule in binary {
      writeln!(f, "{}", rule)?;
    }

    let mut unary = self.unary_rules.values().flatten().collect::<Vec<_>>();
    unary.sort_by(|a, b| (&a.symbol, &a.child).cmp(&(&b.symbol, &b.child)));
    for rule in unary {
      writeln!(f, "{} = {} ({})", rule.symbol, rule.child, rule.probability)?;
    }
    Ok(())
  }
}
