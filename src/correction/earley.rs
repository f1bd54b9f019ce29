//! Chart-guided correction for the Earley engine. The position where the
//! chart died tells which token is at fault and which tags were expected
//! there, so edits at that position are tried first. Moves fall back to
//! moving the offending token anywhere, insertions to every inventory tag at
//! every position up to the dead chart. Where the tokens before the edit
//! keep their tags, parsing resumes from a truncated copy of the table.

use tracing::{debug, info};

use super::{Edit, EditDistance, SearchContext};
use crate::earley::{parse_chart, parse_table, EarleyParser, EarleyTable};
use crate::forest::find_tree_root;
use crate::stts;
use crate::syntree::{extend_unique, ParsedTree};
use crate::token::{tag_sequence, Tagger, Token};

/// Searches edit distance one, then (if allowed) two. `table` is the failed
/// table for `tokens`. Empty when no correction was found.
pub fn correct(
  parser: &EarleyParser,
  table: &EarleyTable,
  tokens: &[Token],
  tagger: &dyn Tagger,
) -> Vec<ParsedTree> {
  let mut ctx = SearchContext::new();

  for level in 1..=parser.options.max_edit_distance.value() {
    let Some(distance) = EditDistance::from_value(level) else {
      break;
    };
    ctx.clear();

    let trees = search(parser, table, tokens, tagger, level, distance, &mut ctx);
    debug!(level, attempts = ctx.attempts, found = trees.len(), "earley correction level done");
    if !trees.is_empty() {
      info!(distance = level, trees = trees.len(), "found earley correction");
      return trees;
    }
  }

  Vec::new()
}

fn search(
  parser: &EarleyParser,
  table: &EarleyTable,
  tokens: &[Token],
  tagger: &dyn Tagger,
  remaining: usize,
  distance: EditDistance,
  ctx: &mut SearchContext,
) -> Vec<ParsedTree> {
  let Some(live) = table.last_live_chart() else {
    return Vec::new();
  };

  let mut found = Vec::new();
  let run = |edits: Vec<(Edit, usize)>, ctx: &mut SearchContext, found: &mut Vec<ParsedTree>| {
    let before = found.len();
    for (edit, resume) in edits {
      let trees = attempt(parser, table, tokens, tagger, &edit, resume, remaining, distance, ctx);
      extend_unique(found, trees);
    }
    found.len() > before
  };

  let culprit = offending_token(tokens, live);
  let expected = expected_tags(table, live);

  if let Some(index) = culprit {
    run(vec![(Edit::Delete(index), index)], ctx, &mut found);

    let targeted = switch_candidates(tokens, index, table);
    if !run(targeted, ctx, &mut found) {
      let everywhere = (0..tokens.len())
        .filter(|&to| to != index)
        .map(|to| (Edit::Move { from: index, to }, index.min(to)))
        .collect();
      run(everywhere, ctx, &mut found);
    }
  }

  let targeted = expected
    .into_iter()
    .map(|tag| (Edit::Insert { index: live, tag }, live))
    .collect();
  if !run(targeted, ctx, &mut found) {
    // an insertion after `live` leaves the dead chart as it is
    let everywhere = (0..=live)
      .flat_map(|index| {
        stts::tags().map(move |tag| {
          let tag = tag.to_string();
          (Edit::Insert { index, tag }, index)
        })
      })
      .collect();
    run(everywhere, ctx, &mut found);
  }

  found
}

/// The token the parse died on. A sentence-final `$.` is passed over in
/// favour of the token before it.
fn offending_token(tokens: &[Token], live: usize) -> Option<usize> {
  let last = tokens.len().checked_sub(1)?;
  let index = live.min(last);
  if index == last && index > 0 && tokens[index].pos == stts::SENTENCE_END {
    Some(index - 1)
  } else {
    Some(index)
  }
}

/// Inventory tags that some state in chart `k` is waiting for, in chart order
fn expected_tags(table: &EarleyTable, k: usize) -> Vec<String> {
  let mut tags: Vec<String> = Vec::new();
  for state in table.charts[k].iter() {
    if let Some(symbol) = state.lr0.next_symbol() {
      if stts::contains_tag(symbol) && !tags.iter().any(|t| t == symbol) {
        tags.push(symbol.to_string());
      }
    }
  }
  tags
}

/// Moves of a later token to `index`, for every tag the chart at `index`
/// expects: the first later token carrying that tag is brought forward.
fn switch_candidates(tokens: &[Token], index: usize, table: &EarleyTable) -> Vec<(Edit, usize)> {
  expected_tags(table, index)
    .into_iter()
    .filter_map(|tag| {
      let from = (index + 1..tokens.len()).find(|&j| tokens[j].pos == tag)?;
      Some((Edit::Move { from, to: index }, index))
    })
    .collect()
}

/// Applies one edit, reparses, and either collects the resulting trees or,
/// with edits to spare, searches on from the edited sentence.
#[allow(clippy::too_many_arguments)]
fn attempt(
  parser: &EarleyParser,
  table: &EarleyTable,
  tokens: &[Token],
  tagger: &dyn Tagger,
  edit: &Edit,
  resume: usize,
  remaining: usize,
  distance: EditDistance,
  ctx: &mut SearchContext,
) -> Vec<ParsedTree> {
  let edited = tagger.retag(&edit.apply(tokens));
  if edited.is_empty() || !ctx.first_try(remaining - 1, &edited) {
    return Vec::new();
  }

  let g = &parser.grammar;
  let prefix_kept = resume <= edited.len()
    && resume <= tokens.len()
    && tag_sequence(&tokens[..resume]) == tag_sequence(&edited[..resume]);

  let mut next = if prefix_kept {
    let mut next = table.truncated(resume, edited.len());
    parse_table(g, &mut next, &edited, resume);
    next
  } else {
    let mut next = parse_chart(g, &edited);
    next.error_log = table.error_log.clone();
    next
  };
  next.edit_distance = table.edit_distance + 1;
  next.annotate(edit.message(distance, tokens, &edited));
  debug!(%edit, resumed = prefix_kept, complete = next.is_complete(&g.start), "earley edit");

  if remaining == 1 {
    if next.is_complete(&g.start) {
      find_tree_root(g, &next, &edited)
    } else {
      Vec::new()
    }
  } else {
    search(parser, &next, &edited, tagger, remaining - 1, distance, ctx)
  }
}
