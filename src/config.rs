use crate::correction::EditDistance;
use crate::grammar::START_SYMBOL;

/// Knobs shared by both parsers and the document driver
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
  /// symbol a complete parse must be rooted in
  pub start_symbol: String,
  /// sentences with fewer tokens are skipped by the document driver
  pub min_tokens: usize,
  /// CYK: keep only the most probable entries of each cell (ties are kept)
  pub best_match: bool,
  /// deepest level the correction search goes to
  pub max_edit_distance: EditDistance,
}

impl Default for ParseOptions {
  fn default() -> Self {
    Self {
      start_symbol: START_SYMBOL.to_string(),
      min_tokens: 3,
      best_match: false,
      max_edit_distance: EditDistance::Two,
    }
  }
}

impl ParseOptions {
  pub fn with_start_symbol(mut self, symbol: impl Into<String>) -> Self {
    self.start_symbol = symbol.into();
    self
  }

  pub fn with_min_tokens(mut self, min_tokens: usize) -> Self {
    self.min_tokens = min_tokens;
    self
  }

  pub fn with_best_match(mut self, best_match: bool) -> Self {
    self.best_match = best_match;
    self
  }

  pub fn with_max_edit_distance(mut self, distance: EditDistance) -> Self {
    self.max_edit_distance = distance;
    self
  }
}

#[test]
fn test_builder() {
  let opts = ParseOptions::default()
    .with_min_tokens(1)
    .with_best_match(true)
    .with_max_edit_distance(EditDistance::One);

  assert_eq!(opts.start_symbol, "S");
  assert_eq!(opts.min_tokens, 1);
  assert!(opts.best_match);
  assert_eq!(opts.max_edit_distance, EditDistance::One);
}
