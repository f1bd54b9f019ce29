use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::config::ParseOptions;
use crate::correction::{self, ErrorMessage};
use crate::forest::find_tree_root;
use crate::grammar::Grammar;
use crate::rules::Rule;
use crate::syntree::{ParsedTree, ParserType};
use crate::token::{Tagger, Token};
use crate::SentenceParser;

/// A dotted rule. The grammar rule itself is shared and never changes; only
/// the dot position is per state. There is no separate completed flag: the
/// dot moves past the last symbol, so a state is completed exactly when
/// `pos == rule.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct LR0 {
  pub rule: Rc<Rule>,
  pub pos: usize,
}

impl LR0 {
  pub fn new(rule: &Rc<Rule>) -> Self {
    Self { rule: rule.clone(), pos: 0 }
  }

  pub fn is_active(&self) -> bool {
    self.pos < self.rule.len()
  }

  pub fn is_completed(&self) -> bool {
    !self.is_active()
  }

  pub fn advance(&self) -> Self {
    debug_assert!(self.is_active());
    Self {
      rule: self.rule.clone(),
      pos: self.pos + 1,
    }
  }

  pub fn next_symbol(&self) -> Option<&str> {
    self.rule.productions.get(self.pos).map(String::as_str)
  }
}

impl fmt::Display for LR0 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} =", self.rule.symbol)?;
    for idx in 0..self.rule.len() {
      if idx == self.pos {
        write!(f, " *")?;
      }
      write!(f, " {}", self.rule.productions[idx])?;
    }
    if !self.is_active() {
      write!(f, " *")?;
    }
    write!(f, " ({})", self.rule.probability)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
  pub lr0: LR0,
  pub origin: usize,
}

impl State {
  pub fn new(lr0: LR0, origin: usize) -> Self {
    Self { lr0, origin }
  }

  pub fn advance(&self) -> Self {
    Self::new(self.lr0.advance(), self.origin)
  }

  pub fn symbol(&self) -> &str {
    &self.lr0.rule.symbol
  }
}

impl fmt::Display for State {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.lr0, self.origin)
  }
}

/// The states at one input position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarleyChart(Vec<State>);

impl EarleyChart {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn has(&self, state: &State) -> bool {
    self.0.contains(state)
  }

  pub fn add(&mut self, state: State) {
    if !self.has(&state) {
      self.0.push(state);
    }
  }

  pub fn iter(&self) -> impl DoubleEndedIterator<Item = &State> {
    self.0.iter()
  }
}

/// One chart per input position `0..=n`, plus the edits that led to the
/// token sequence it was built for
#[derive(Debug, Clone, PartialEq)]
pub struct EarleyTable {
  pub charts: Vec<EarleyChart>,
  pub edit_distance: usize,
  pub error_log: BTreeSet<ErrorMessage>,
}

impl EarleyTable {
  pub fn new(tokens: usize) -> Self {
    Self {
      charts: vec![EarleyChart::default(); tokens + 1],
      edit_distance: 0,
      error_log: BTreeSet::new(),
    }
  }

  /// number of charts (tokens + 1)
  pub fn len(&self) -> usize {
    self.charts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.charts.is_empty()
  }

  pub fn len_at(&self, k: usize) -> usize {
    self.charts[k].len()
  }

  pub fn add(&mut self, k: usize, state: State) {
    self.charts[k].add(state);
  }

  /// Get an owned state so that passing around &mut table is more ergonomic
  fn get_state(&self, k: usize, idx: usize) -> State {
    self.charts[k].0[idx].clone()
  }

  /// Whether the final chart holds a completed start state spanning the
  /// whole input
  pub fn is_complete(&self, start: &str) -> bool {
    self.charts.last().is_some_and(|chart| {
      chart
        .iter()
        .any(|s| s.lr0.is_completed() && s.origin == 0 && s.symbol() == start)
    })
  }

  /// The last position that still holds states, i.e. how far the parse got
  /// before it died
  pub fn last_live_chart(&self) -> Option<usize> {
    (0..self.charts.len()).rev().find(|&k| !self.charts[k].is_empty())
  }

  /// A copy keeping charts `0..=keep`, resized for `tokens` input tokens.
  /// Parsing can be resumed from `keep` as long as the tokens before it are
  /// unchanged.
  pub fn truncated(&self, keep: usize, tokens: usize) -> Self {
    let mut table = Self::new(tokens);
    for (k, chart) in self.charts.iter().enumerate().take(keep.min(tokens) + 1) {
      table.charts[k] = chart.clone();
    }
    table.edit_distance = self.edit_distance;
    table.error_log = self.error_log.clone();
    table
  }

  pub fn annotate(&mut self, message: ErrorMessage) {
    self.error_log.insert(message);
  }
}

impl fmt::Display for EarleyTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (k, chart) in self.charts.iter().enumerate() {
      writeln!(f, "{}:", k)?;
      for state in chart.iter() {
        writeln!(f, "{}", state)?;
      }
    }
    Ok(())
  }
}

/// Builds the Earley table for `tokens`, seeded with the start rules
pub fn parse_chart(g: &Grammar, tokens: &[Token]) -> EarleyTable {
  let mut table = EarleyTable::new(tokens.len());

  for rule in g.rules_for(&g.start) {
    table.add(0, State::new(LR0::new(rule), 0));
  }

  parse_table(g, &mut table, tokens, 0);
  table
}

/// Runs predict/scan/complete over the charts `from..=n`. Charts before
/// `from` are taken as they are.
pub fn parse_table(g: &Grammar, table: &mut EarleyTable, tokens: &[Token], from: usize) {
  for k in from..table.len() {
    // need to use while loop because the number of states at k can expand during the loop
    let mut idx = 0;
    while idx < table.len_at(k) {
      let state = table.get_state(k, idx);
      idx += 1;

      match state.lr0.next_symbol() {
        None => completer(table, k, &state),
        Some(symbol) if k < tokens.len() && tokens[k].pos == symbol => scanner(table, k, &state),
        Some(symbol) => predictor(g, table, k, symbol),
      }
    }
  }

  debug!(
    tokens = tokens.len(),
    from,
    states = table.charts.iter().map(EarleyChart::len).sum::<usize>(),
    "filled earley table"
  );
}

fn completer(table: &mut EarleyTable, k: usize, state: &State) {
  // look for states at the origin that are waiting for this symbol
  for idx in 0..table.len_at(state.origin) {
    let other = table.get_state(state.origin, idx);

    if other.lr0.next_symbol() == Some(state.symbol()) {
      trace!(k, state = %other, "complete");
      table.add(k, other.advance());
    }
  }
}

fn predictor(g: &Grammar, table: &mut EarleyTable, k: usize, symbol: &str) {
  for rule in g.rules_for(symbol) {
    table.add(k, State::new(LR0::new(rule), k));
  }
}

fn scanner(table: &mut EarleyTable, k: usize, state: &State) {
  trace!(k, state = %state, "scan");
  table.add(k + 1, state.advance());
}

#[derive(Debug)]
pub struct EarleyParser {
  pub grammar: Grammar,
  pub options: ParseOptions,
}

impl EarleyParser {
  pub fn new(grammar: Grammar) -> Self {
    Self::with_options(grammar, ParseOptions::default())
  }

  pub fn with_options(mut grammar: Grammar, options: ParseOptions) -> Self {
    grammar.start = options.start_symbol.clone();
    Self { grammar, options }
  }

  pub fn parse_chart(&self, tokens: &[Token]) -> EarleyTable {
    parse_chart(&self.grammar, tokens)
  }

  pub fn find_tree_root(&self, table: &EarleyTable, tokens: &[Token]) -> Vec<ParsedTree> {
    find_tree_root(&self.grammar, table, tokens)
  }
}

impl SentenceParser for EarleyParser {
  fn parser_type(&self) -> ParserType {
    ParserType::Earley
  }

  fn options(&self) -> &ParseOptions {
    &self.options
  }

  fn parse(&self, tokens: &[Token]) -> Vec<ParsedTree> {
    let table = self.parse_chart(tokens);
    if table.is_complete(&self.grammar.start) {
      self.find_tree_root(&table, tokens)
    } else {
      Vec::new()
    }
  }

  fn parse_with_corrections(&self, tokens: &[Token], tagger: &dyn Tagger) -> Vec<ParsedTree> {
    let table = self.parse_chart(tokens);
    if table.is_complete(&self.grammar.start) {
      return self.find_tree_root(&table, tokens);
    }

    correction::earley::correct(self, &table, tokens, tagger)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::tokenize;

  fn tagged(s: &str, tags: &[&str]) -> Vec<Token> {
    let mut tokens = tokenize(s, 0);
    for (t, tag) in tokens.iter_mut().zip(tags) {
      t.pos = tag.to_string();
    }
    tokens
  }

  fn grammar() -> Grammar {
    "S = NP VP\nNP = ART NN\nVP = VVFIN".parse().unwrap()
  }

  #[test]
  fn test_parse_chart() {
    let g = grammar();
    let table = parse_chart(&g, &tagged("der Tisch steht", &["ART", "NN", "VVFIN"]));

    assert_eq!(table.len(), 4);
    assert!(table.is_complete("S"));
    assert_eq!(table.last_live_chart(), Some(3));

    // S = * NP VP and the predicted NP = * ART NN
    assert_eq!(table.len_at(0), 2);
    println!("{}", table);
  }

  #[test]
  fn test_incomplete_chart() {
    let g = grammar();
    let table = parse_chart(&g, &tagged("Tisch steht", &["NN", "VVFIN"]));

    assert!(!table.is_complete("S"));
    assert_eq!(table.last_live_chart(), Some(0));
    assert!(table.charts[1].is_empty());
  }

  #[test]
  fn test_acceptance_requires_origin_zero() {
    let g: Grammar = "S = NN\nS = ART S".parse().unwrap();
    let table = parse_chart(&g, &tagged("der Tisch", &["ART", "NN"]));
    assert!(table.is_complete("S"));

    let table = parse_chart(&g, &tagged("Tisch Tisch", &["NN", "NN"]));
    // S = NN completes at 1 but nothing spans 0..2
    assert!(!table.is_complete("S"));
  }

  #[test]
  fn test_resume_from_truncated_table() {
    let g = grammar();
    let broken = tagged("der Tisch schon", &["ART", "NN", "ADV"]);
    let table = parse_chart(&g, &broken);
    assert!(!table.is_complete("S"));

    let fixed = tagged("der Tisch steht", &["ART", "NN", "VVFIN"]);
    let mut resumed = table.truncated(2, fixed.len());
    parse_table(&g, &mut resumed, &fixed, 2);
    assert!(resumed.is_complete("S"));
    assert_eq!(resumed, parse_chart(&g, &fixed));
  }

  #[test]
  fn test_lr0_display() {
    let g = grammar();
    let lr0 = LR0::new(&g.rules_for("S")[0]).advance();
    assert_eq!(lr0.to_string(), "S = NP * VP (1)");
    assert_eq!(lr0.advance().to_string(), "S = NP VP * (1)");
  }
}
