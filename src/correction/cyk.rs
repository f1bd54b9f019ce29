//! Brute-force correction for the CYK engine: every deletion, every move of
//! one token to another position, and every insertion of every inventory
//! tag at every position (including the end of the sentence).

use tracing::{debug, info};

use super::{Edit, EditDistance, SearchContext};
use crate::cyk::CykParser;
use crate::stts;
use crate::syntree::{extend_unique, ParsedTree};
use crate::token::{Tagger, Token};

/// Searches edit distance one, then (if allowed) two, and returns the
/// completed trees of the first level that produced any. Empty when no
/// correction was found.
pub fn correct(parser: &CykParser, tokens: &[Token], tagger: &dyn Tagger) -> Vec<ParsedTree> {
  let mut ctx = SearchContext::new();

  for level in 1..=parser.options.max_edit_distance.value() {
    let Some(distance) = EditDistance::from_value(level) else {
      break;
    };
    ctx.clear();

    let trees = search(parser, tokens, tagger, level, distance, &mut ctx);
    debug!(level, attempts = ctx.attempts, found = trees.len(), "cyk correction level done");
    if !trees.is_empty() {
      info!(distance = level, trees = trees.len(), "found cyk correction");
      return trees;
    }
  }

  Vec::new()
}

/// Every single edit of `tokens`, deletions first, then moves, then insertions
pub fn candidate_edits(tokens: &[Token]) -> Vec<Edit> {
  let n = tokens.len();
  let mut edits = (0..n).map(Edit::Delete).collect::<Vec<_>>();

  for from in 0..n {
    for to in (0..n).filter(|&to| to != from) {
      edits.push(Edit::Move { from, to });
    }
  }

  for index in 0..=n {
    for tag in stts::tags() {
      edits.push(Edit::Insert {
        index,
        tag: tag.to_string(),
      });
    }
  }

  edits
}

/// Applies `remaining` more edits to `tokens`. Every edited sentence is
/// retagged first and skipped if its tag sequence was already tried at the
/// same depth.
fn search(
  parser: &CykParser,
  tokens: &[Token],
  tagger: &dyn Tagger,
  remaining: usize,
  distance: EditDistance,
  ctx: &mut SearchContext,
) -> Vec<ParsedTree> {
  let mut found = Vec::new();

  for edit in candidate_edits(tokens) {
    let edited = tagger.retag(&edit.apply(tokens));
    if edited.is_empty() || !ctx.first_try(remaining - 1, &edited) {
      continue;
    }

    let trees = if remaining == 1 {
      parser.completed_trees(&parser.parse_matrix(&edited))
    } else {
      search(parser, &edited, tagger, remaining - 1, distance, ctx)
    };
    if trees.is_empty() {
      continue;
    }

    debug!(%edit, "cyk edit parses");
    let message = edit.message(distance, tokens, &edited);
    extend_unique(
      &mut found,
      trees.into_iter().map(|mut tree| {
        tree.annotate(message.clone());
        tree
      }),
    );
  }

  found
}
