use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::cnf::{CnfGrammar, CykToken};
use crate::config::ParseOptions;
use crate::correction;
use crate::grammar::Grammar;
use crate::syntree::{extend_unique, ParsedTree, ParserType, TreeItem, TreeType};
use crate::token::{Tagger, Token};
use crate::SentenceParser;

/// Label and symbol of the root put over a forest of fragments
pub const INCOMPLETE_LABEL: &str = "Incomplete Sentence";
pub const INCOMPLETE_SYMBOL: &str = "Incomplete";

/// The CYK chart: `cells[height][col]` holds every derivation spanning the
/// `height + 1` tokens starting at `col`.
#[derive(Debug, Clone)]
pub struct CykMatrix(Vec<Vec<Vec<Rc<CykToken>>>>);

impl CykMatrix {
  fn new(size: usize) -> Self {
    Self((0..size).map(|h| vec![Vec::new(); size - h]).collect())
  }

  /// number of tokens
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn cell(&self, height: usize, col: usize) -> &[Rc<CykToken>] {
    &self.0[height][col]
  }

  /// derivations spanning the whole sentence
  pub fn top(&self) -> &[Rc<CykToken>] {
    match self.0.last() {
      Some(row) => &row[0],
      None => &[],
    }
  }

  /// the terminal entry of token `col`
  fn terminal(&self, col: usize) -> Option<&Rc<CykToken>> {
    self.0[0][col].iter().find(|t| t.is_terminal())
  }
}

impl fmt::Display for CykMatrix {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (height, row) in self.0.iter().enumerate() {
      writeln!(f, "{}:", height)?;
      for (col, cell) in row.iter().enumerate() {
        for token in cell.iter() {
          writeln!(f, "  [{}] {}", col, token)?;
        }
      }
    }
    Ok(())
  }
}

#[derive(Debug)]
pub struct CykParser {
  pub grammar: CnfGrammar,
  pub options: ParseOptions,
}

impl CykParser {
  pub fn new(grammar: Grammar) -> Self {
    Self::with_options(grammar, ParseOptions::default())
  }

  pub fn with_options(mut grammar: Grammar, options: ParseOptions) -> Self {
    grammar.start = options.start_symbol.clone();
    Self {
      grammar: CnfGrammar::new(grammar),
      options,
    }
  }

  /// Fills the chart bottom-up. Every cell is closed under the grammar's
  /// unary rules after its binary combinations are in.
  pub fn parse_matrix(&self, tokens: &[Token]) -> CykMatrix {
    let n = tokens.len();
    let mut m = CykMatrix::new(n);

    for (col, token) in tokens.iter().enumerate() {
      let terminal = Rc::new(CykToken::terminal(&token.pos, token.begin, token.end));
      let derived = self.grammar.unary_closure(&terminal);
      m.0[0][col].push(terminal);
      m.0[0][col].extend(derived);
    }

    for height in 1..n {
      for col in 0..n - height {
        let mut found = Vec::new();

        for split in 0..height {
          let left = m.cell(split, col);
          let right = m.cell(height - 1 - split, col + split + 1);

          for l in left.iter() {
            for r in right.iter() {
              if let Some(token) = self.grammar.find_matching_rule(l, r) {
                trace!(height, col, symbol = %token.symbol, "cyk match");
                found.push(token);
              }
            }
          }
        }

        if self.options.best_match {
          found = best_matches(found);
        }

        let derived = found
          .iter()
          .flat_map(|t| self.grammar.unary_closure(t))
          .collect::<Vec<_>>();
        m.0[height][col].extend(found);
        m.0[height][col].extend(derived);
      }
    }

    debug!(
      tokens = n,
      entries = m.0.iter().flatten().map(Vec::len).sum::<usize>(),
      "filled cyk matrix"
    );
    m
  }

  /// Whether the top cell holds a derivation of the start symbol
  pub fn has_sentence(&self, m: &CykMatrix) -> bool {
    m.top().iter().any(|t| t.symbol == self.grammar.start())
  }

  /// One `Completed` tree per start-symbol derivation of the whole sentence
  pub fn completed_trees(&self, m: &CykMatrix) -> Vec<ParsedTree> {
    let mut trees = Vec::new();
    extend_unique(
      &mut trees,
      m.top()
        .iter()
        .filter(|t| t.symbol == self.grammar.start())
        .map(|t| {
          ParsedTree::new(
            ParserType::Cyk,
            TreeType::Completed,
            self.create_parsing_tree(t),
          )
        }),
    );
    trees
  }

  /// The completed trees or, when there are none, every covering forest of
  /// the largest fragments the chart holds, each under an incomplete root.
  pub fn find_parsing_tree(&self, m: &CykMatrix) -> Vec<ParsedTree> {
    let completed = self.completed_trees(m);
    if !completed.is_empty() || m.is_empty() {
      return completed;
    }

    let (Some(first), Some(last)) = (m.terminal(0), m.terminal(m.len() - 1)) else {
      return Vec::new();
    };
    let (begin, end) = (first.begin, last.end);

    let mut trees = Vec::new();
    extend_unique(
      &mut trees,
      self
        .create_incomplete_parsing_tree(m, 0, m.len())
        .into_iter()
        .map(|children| {
          ParsedTree::new(
            ParserType::Cyk,
            TreeType::Incompleted,
            TreeItem::new(begin, end, INCOMPLETE_LABEL, INCOMPLETE_SYMBOL, children),
          )
        }),
    );
    debug!(forests = trees.len(), "no complete cyk parse, returning fragments");
    trees
  }

  pub fn create_parsing_tree(&self, token: &CykToken) -> TreeItem {
    let children = [&token.left, &token.right]
      .into_iter()
      .flatten()
      .map(|child| self.create_parsing_tree(child))
      .collect::<Vec<_>>();

    TreeItem::new(token.begin, token.end, token.name.clone(), token.symbol.clone(), children)
  }

  /// Covers the token range `start..end` with fragments. The tallest
  /// populated cell inside the range (leftmost first) is used, and the gaps
  /// on either side are covered recursively; a range with no derivations
  /// comes back as plain leaves.
  fn create_incomplete_parsing_tree(
    &self,
    m: &CykMatrix,
    start: usize,
    end: usize,
  ) -> Vec<Vec<TreeItem>> {
    if start >= end {
      return vec![Vec::new()];
    }

    for height in (1..end - start).rev() {
      for col in start..end - height {
        let cell = m.cell(height, col);
        if cell.is_empty() {
          continue;
        }

        let before = self.create_incomplete_parsing_tree(m, start, col);
        let after = self.create_incomplete_parsing_tree(m, col + height + 1, end);

        let mut out = Vec::new();
        for token in cell.iter() {
          let item = self.create_parsing_tree(token);
          for b in before.iter() {
            for a in after.iter() {
              let mut children = b.clone();
              children.push(item.clone());
              children.extend(a.iter().cloned());
              out.push(children);
            }
          }
        }
        return out;
      }
    }

    vec![(start..end)
      .filter_map(|col| m.terminal(col))
      .map(|t| TreeItem::leaf(t.begin, t.end, &t.symbol))
      .collect()]
  }
}

/// Keeps only the most probable entries (all of them on a tie)
fn best_matches(tokens: Vec<Rc<CykToken>>) -> Vec<Rc<CykToken>> {
  let best = tokens.iter().map(|t| t.probability).fold(f64::MIN, f64::max);
  tokens.into_iter().filter(|t| t.probability == best).collect()
}

impl SentenceParser for CykParser {
  fn parser_type(&self) -> ParserType {
    ParserType::Cyk
  }

  fn options(&self) -> &ParseOptions {
    &self.options
  }

  fn parse(&self, tokens: &[Token]) -> Vec<ParsedTree> {
    self.find_parsing_tree(&self.parse_matrix(tokens))
  }

  fn parse_with_corrections(&self, tokens: &[Token], tagger: &dyn Tagger) -> Vec<ParsedTree> {
    let m = self.parse_matrix(tokens);
    if self.has_sentence(&m) {
      return self.completed_trees(&m);
    }

    let corrected = correction::cyk::correct(self, tokens, tagger);
    if !corrected.is_empty() {
      return corrected;
    }

    self.find_parsing_tree(&m)
  }
}
