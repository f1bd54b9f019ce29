use tracing::debug;

use crate::earley::{EarleyTable, State};
use crate::grammar::Grammar;
use crate::syntree::{extend_unique, ParsedTree, ParserType, TreeItem, TreeType};
use crate::token::Token;

/// Reconstructs every parse tree of a finished table, walking it backwards
/// from the final chart. The table is left as it is; a state being expanded
/// is not expanded again beneath itself at the same position, which cuts
/// unary cycles.
pub fn find_tree_root(g: &Grammar, table: &EarleyTable, tokens: &[Token]) -> Vec<ParsedTree> {
  let n = tokens.len();
  if n == 0 || table.len() != n + 1 {
    return Vec::new();
  }

  let mut expanding = Vec::new();
  let candidates = create_tree_items(g, table, tokens, &g.start, n, &mut expanding);

  let mut trees = Vec::new();
  extend_unique(
    &mut trees,
    candidates
      .into_iter()
      // reject derivations that don't cover the sentence
      .filter(|children| children.iter().map(TreeItem::leaf_count).sum::<usize>() == n)
      .map(|children| {
        let mut tree = ParsedTree::new(
          ParserType::Earley,
          TreeType::Completed,
          TreeItem::new(
            tokens[0].begin,
            tokens[n - 1].end,
            g.display_name(&g.start),
            g.start.clone(),
            children,
          ),
        );
        tree.annotate_all(table.error_log.iter());
        tree
      }),
  );

  debug!(trees = trees.len(), "reconstructed earley trees");
  trees
}

/// The child sequences of every completed `symbol` state in chart `end`.
/// Right-hand sides are matched right to left, each alternative carrying the
/// position its leftmost child starts at. `expanding` holds the states on the
/// current path, each with the chart it ends in.
fn create_tree_items<'t>(
  g: &Grammar,
  table: &'t EarleyTable,
  tokens: &[Token],
  symbol: &str,
  end: usize,
  expanding: &mut Vec<(&'t State, usize)>,
) -> Vec<Vec<TreeItem>> {
  let states = table.charts[end]
    .iter()
    .rev()
    .filter(|s| s.lr0.is_completed() && s.symbol() == symbol)
    .collect::<Vec<_>>();

  let mut children = Vec::new();
  for state in states {
    if expanding.iter().any(|&(s, e)| e == end && s == state) {
      continue;
    }
    expanding.push((state, end));

    let mut partial: Vec<(Vec<TreeItem>, usize)> = vec![(Vec::new(), end)];

    for production in state.lr0.rule.productions.iter().rev() {
      let mut extended = Vec::new();
      for (seq, pos) in partial.into_iter() {
        for item in match_symbol(g, table, tokens, production, pos, expanding) {
          let next = pos.saturating_sub(item.leaf_count());
          let mut seq = seq.clone();
          seq.insert(0, item);
          extended.push((seq, next));
        }
      }

      partial = extended;
      if partial.is_empty() {
        // one symbol can't be matched, so neither can the state
        break;
      }
    }

    expanding.pop();
    children.extend(
      partial
        .into_iter()
        .filter(|(_, start)| *start == state.origin)
        .map(|(seq, _)| seq),
    );
  }

  children
}

/// Every way `symbol` can end at `pos`: a leaf if the preceding token
/// carries it as a tag, otherwise the reconstructed subtrees of the symbol.
fn match_symbol<'t>(
  g: &Grammar,
  table: &'t EarleyTable,
  tokens: &[Token],
  symbol: &str,
  pos: usize,
  expanding: &mut Vec<(&'t State, usize)>,
) -> Vec<TreeItem> {
  if pos == 0 {
    return Vec::new();
  }

  let token = &tokens[pos - 1];
  if token.pos == symbol {
    return vec![TreeItem::leaf(token.begin, token.end, &token.pos)];
  }
  if !g.is_nonterminal(symbol) {
    return Vec::new();
  }

  create_tree_items(g, table, tokens, symbol, pos, expanding)
    .into_iter()
    .filter_map(|children| {
      let begin = children.first()?.begin;
      let end = children.last()?.end;
      Some(TreeItem::new(begin, end, g.display_name(symbol), symbol, children))
    })
    .collect()
}
