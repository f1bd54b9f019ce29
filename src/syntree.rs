use std::collections::BTreeSet;
use std::fmt;

use crate::correction::{EditDistance, ErrorMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParserType {
  Cyk,
  Earley,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TreeType {
  /// one root covering the whole sentence
  Completed,
  /// a forest of fragments under a synthetic root
  Incompleted,
  Changed,
}

/// A node of a parse tree. `terminal_text` is the display label, `literal`
/// the grammar symbol (or POS tag, for leaves).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeItem {
  pub begin: usize,
  pub end: usize,
  pub terminal_text: String,
  pub literal: String,
  pub children: Vec<TreeItem>,
}

impl TreeItem {
  pub fn new(
    begin: usize,
    end: usize,
    terminal_text: impl Into<String>,
    literal: impl Into<String>,
    children: Vec<TreeItem>,
  ) -> Self {
    Self {
      begin,
      end,
      terminal_text: terminal_text.into(),
      literal: literal.into(),
      children,
    }
  }

  pub fn leaf(begin: usize, end: usize, tag: &str) -> Self {
    Self::new(begin, end, tag, tag, Vec::new())
  }

  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  /// Number of leaves below (or at) this node
  pub fn leaf_count(&self) -> usize {
    if self.is_leaf() {
      1
    } else {
      self.children.iter().map(TreeItem::leaf_count).sum()
    }
  }

  /// All leaves, left to right
  pub fn leaves(&self) -> Vec<&TreeItem> {
    if self.is_leaf() {
      vec![self]
    } else {
      self.children.iter().flat_map(TreeItem::leaves).collect()
    }
  }

  /// Bracket notation. `$` is dropped from labels, and nodes whose label has
  /// a space (synthetic CNF nodes, the incomplete-sentence root) are inlined
  /// into their parent.
  pub fn to_qtree(&self) -> String {
    let text = self.terminal_text.replace('$', "");
    let inline = text.contains(' ');

    let mut children = self.children.iter().collect::<Vec<_>>();
    children.sort_by_key(|c| c.begin);
    let children = children.into_iter().map(TreeItem::to_qtree).collect::<Vec<_>>();

    if inline {
      children.join(" ")
    } else {
      let mut out = format!("[.{}", text);
      for child in children {
        out.push(' ');
        out.push_str(&child);
      }
      out.push_str(" ]");
      out
    }
  }
}

impl fmt::Display for TreeItem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_leaf() {
      return write!(f, "{}..{}: {}", self.begin, self.end, self.terminal_text);
    }

    write!(f, "({}..{}: {}", self.begin, self.end, self.terminal_text)?;
    for child in self.children.iter() {
      let fmt = format!("{}", child);
      for line in fmt.lines() {
        write!(f, "\n  {}", line)?;
      }
    }
    write!(f, ")")
  }
}

/// A parse result: the tree plus the corrections that were needed to get it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedTree {
  pub parser_type: ParserType,
  pub tree_type: TreeType,
  pub root: TreeItem,
  pub error_log: BTreeSet<ErrorMessage>,
}

impl ParsedTree {
  pub fn new(parser_type: ParserType, tree_type: TreeType, root: TreeItem) -> Self {
    Self {
      parser_type,
      tree_type,
      root,
      error_log: BTreeSet::new(),
    }
  }

  pub fn annotate(&mut self, message: ErrorMessage) {
    self.error_log.insert(message);
  }

  pub fn annotate_all<'a>(&mut self, messages: impl IntoIterator<Item = &'a ErrorMessage>) {
    self.error_log.extend(messages.into_iter().cloned());
  }

  pub fn is_corrected(&self) -> bool {
    !self.error_log.is_empty()
  }

  /// 2 if any correction needed two edits, 1 otherwise
  pub fn edit_distance(&self) -> usize {
    if self.error_log.iter().any(|m| m.distance == EditDistance::Two) {
      2
    } else {
      1
    }
  }

  pub fn log_messages(&self) -> String {
    if self.error_log.is_empty() {
      "There has been no error correction!".to_string()
    } else {
      self
        .error_log
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
    }
  }

  pub fn to_qtree(&self) -> String {
    format!("\\Tree {}", self.root.to_qtree())
  }
}

impl fmt::Display for ParsedTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{:?} {:?}", self.parser_type, self.tree_type)?;
    write!(f, "{}", self.root)
  }
}

/// Collects trees into `into`, skipping ones that are already there
pub(crate) fn extend_unique(
  into: &mut Vec<ParsedTree>,
  trees: impl IntoIterator<Item = ParsedTree>,
) {
  for tree in trees {
    if !into.contains(&tree) {
      into.push(tree);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::correction::EditKind;

  fn sample() -> TreeItem {
    TreeItem::new(
      0,
      15,
      "S",
      "S",
      vec![
        TreeItem::new(
          0,
          9,
          "NP",
          "NP",
          vec![TreeItem::leaf(0, 3, "ART"), TreeItem::leaf(4, 9, "NN")],
        ),
        TreeItem::new(10, 15, "VP", "VP", vec![TreeItem::leaf(10, 15, "VVFIN")]),
      ],
    )
  }

  #[test]
  fn test_leaf_count() {
    let t = sample();
    assert_eq!(t.leaf_count(), 3);
    assert_eq!(
      t.leaves().iter().map(|l| l.literal.as_str()).collect::<Vec<_>>(),
      vec!["ART", "NN", "VVFIN"]
    );
  }

  #[test]
  fn test_qtree() {
    let tree = ParsedTree::new(ParserType::Earley, TreeType::Completed, sample());
    assert_eq!(
      tree.to_qtree(),
      r"\Tree [.S [.NP [.ART ] [.NN ] ] [.VP [.VVFIN ] ] ]"
    );
  }

  #[test]
  fn test_qtree_inlines_synthetic_and_strips_dollar() {
    let t = TreeItem::new(
      0,
      10,
      "S",
      "S",
      vec![
        TreeItem::new(
          4,
          10,
          "NN $.",
          "0",
          vec![TreeItem::leaf(9, 10, "$."), TreeItem::leaf(4, 9, "NN")],
        ),
        TreeItem::leaf(0, 3, "ART"),
      ],
    );
    assert_eq!(t.to_qtree(), "[.S [.ART ] [.NN ] [. ] ]");
  }

  #[test]
  fn test_log_and_edit_distance() {
    let mut tree = ParsedTree::new(ParserType::Cyk, TreeType::Completed, sample());
    assert_eq!(tree.log_messages(), "There has been no error correction!");
    assert_eq!(tree.edit_distance(), 1);

    let msg = ErrorMessage::new(EditKind::Added, EditDistance::Two, "insert something".to_string());
    tree.annotate(msg.clone());
    tree.annotate(msg);
    assert_eq!(tree.error_log.len(), 1);
    assert_eq!(tree.edit_distance(), 2);
    assert_eq!(tree.log_messages(), "insert something");
  }
}
