use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::correction::ErrorMessage;
use crate::error::GrammarError;
use crate::syntree::{ParsedTree, TreeItem, TreeType};
use crate::token::Tagger;
use crate::SentenceParser;

/// A span of the document labelled with a grammar symbol. `parent` indexes
/// the enclosing annotation of the same document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
  pub begin: usize,
  pub end: usize,
  pub label: String,
  pub symbol: String,
  pub parent: Option<usize>,
}

/// A text split into sentence spans, plus the parse annotations added to it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
  pub text: String,
  pub sentences: Vec<(usize, usize)>,
  pub annotations: Vec<Annotation>,
  pub corrections: Vec<ErrorMessage>,
}

impl Document {
  /// Joins the sentences with single spaces, one sentence span each
  pub fn from_sentences<S: AsRef<str>>(sentences: impl IntoIterator<Item = S>) -> Self {
    let mut doc = Self::default();
    for s in sentences {
      if !doc.text.is_empty() {
        doc.text.push(' ');
      }
      let begin = doc.text.len();
      doc.text.push_str(s.as_ref());
      doc.sentences.push((begin, doc.text.len()));
    }
    doc
  }

  /// One sentence per non-empty line, offsets into `text` as given
  pub fn from_lines(text: &str) -> Self {
    let mut sentences = Vec::new();
    let mut offset = 0;
    for line in text.split('\n') {
      let line_len = line.len();
      let line = line.strip_suffix('\r').unwrap_or(line);
      if !line.trim().is_empty() {
        sentences.push((offset, offset + line.len()));
      }
      offset += line_len + 1;
    }

    Self {
      text: text.to_string(),
      sentences,
      ..Self::default()
    }
  }

  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| GrammarError::from_io(path.to_path_buf(), e))?;
    Ok(Self::from_lines(&text))
  }

  pub fn sentence_text(&self, idx: usize) -> &str {
    let (begin, end) = self.sentences[idx];
    &self.text[begin..end]
  }

  /// Adds the nodes of `tree` as annotations. The synthetic root of an
  /// incomplete tree is left out and its fragments become roots themselves.
  pub fn add_parsed_tree(&mut self, tree: &ParsedTree) {
    if tree.tree_type == TreeType::Incompleted {
      for fragment in tree.root.children.iter() {
        self.annotate_item(fragment, None);
      }
    } else {
      self.annotate_item(&tree.root, None);
    }

    for message in tree.error_log.iter() {
      if !self.corrections.contains(message) {
        self.corrections.push(message.clone());
      }
    }
  }

  fn annotate_item(&mut self, item: &TreeItem, parent: Option<usize>) {
    let idx = self.annotations.len();
    self.annotations.push(Annotation {
      begin: item.begin,
      end: item.end,
      label: item.terminal_text.clone(),
      symbol: item.literal.clone(),
      parent,
    });

    for child in item.children.iter() {
      self.annotate_item(child, Some(idx));
    }
  }

  /// Parses every sentence (with correction) and returns one annotated copy
  /// of the document per combination of per-sentence alternatives. Sentences
  /// shorter than `min_tokens`, or without any result, contribute nothing.
  pub fn parse_document(&self, parser: &dyn SentenceParser, tagger: &dyn Tagger) -> Vec<Document> {
    let min_tokens = parser.options().min_tokens;
    let mut alternatives = Vec::new();

    for (idx, &(begin, _)) in self.sentences.iter().enumerate() {
      let tokens = tagger.tag(self.sentence_text(idx), begin);
      if tokens.len() < min_tokens {
        debug!(sentence = idx, tokens = tokens.len(), "skipping short sentence");
        continue;
      }

      let trees = parser.parse_with_corrections(&tokens, tagger);
      debug!(sentence = idx, trees = trees.len(), "parsed sentence");
      if !trees.is_empty() {
        alternatives.push(trees);
      }
    }

    let docs = if alternatives.is_empty() {
      vec![self.clone()]
    } else {
      tree_choices(&alternatives)
        .into_iter()
        .map(|trees| {
          let mut doc = self.clone();
          for tree in trees {
            doc.add_parsed_tree(tree);
          }
          doc
        })
        .collect()
    };

    info!(
      parser = ?parser.parser_type(),
      sentences = self.sentences.len(),
      documents = docs.len(),
      "annotated document"
    );
    docs
  }

  /// Writes each document to `dir/{stem}{i}.tsv`. A file that can't be
  /// written is logged and skipped; returns how many were written.
  pub fn write_to_dir(docs: &[Document], dir: impl AsRef<Path>, stem: &str) -> usize {
    let dir = dir.as_ref();
    if let Err(err) = fs::create_dir_all(dir) {
      warn!(dir = %dir.display(), %err, "failed to create output directory");
      return 0;
    }

    let mut written = 0;
    for (i, doc) in docs.iter().enumerate() {
      let path: PathBuf = dir.join(format!("{}{}.tsv", stem, i));
      match fs::write(&path, doc.to_string()) {
        Ok(()) => written += 1,
        Err(err) => warn!(path = %path.display(), %err, "failed to write document"),
      }
    }
    written
  }

  fn covered_text(&self, begin: usize, end: usize) -> &str {
    self.text.get(begin..end).unwrap_or("")
  }
}

/// Tab-separated: the sentences, then one line per annotation
/// (`id begin end symbol label parent text`), then the corrections
impl fmt::Display for Document {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, &(begin, end)) in self.sentences.iter().enumerate() {
      writeln!(f, "#sentence\t{}\t{}\t{}\t{}", idx, begin, end, self.covered_text(begin, end))?;
    }
    for (idx, a) in self.annotations.iter().enumerate() {
      let parent = a.parent.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
      writeln!(
        f,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        idx,
        a.begin,
        a.end,
        a.symbol,
        a.label,
        parent,
        self.covered_text(a.begin, a.end)
      )?;
    }
    for message in self.corrections.iter() {
      for line in message.text.lines() {
        writeln!(f, "#correction\t{}", line)?;
      }
    }
    Ok(())
  }
}

/// Every way of picking one tree per sentence. The last sentence varies
/// fastest.
fn tree_choices(alternatives: &[Vec<ParsedTree>]) -> Vec<Vec<&ParsedTree>> {
  let mut choices: Vec<Vec<&ParsedTree>> = vec![Vec::new()];
  for trees in alternatives {
    choices = choices
      .into_iter()
      .flat_map(|chosen| {
        trees.iter().map(move |tree| {
          let mut chosen = chosen.clone();
          chosen.push(tree);
          chosen
        })
      })
      .collect();
  }
  choices
}
