#[macro_use]
extern crate lazy_static;

pub mod annotation;
pub mod cnf;
pub mod config;
pub mod correction;
pub mod cyk;
pub mod earley;
pub mod error;
pub mod forest;
pub mod grammar;
pub mod parse_grammar;
pub mod rules;
pub mod stts;
pub mod syntree;
pub mod token;
pub mod utils;

pub use crate::annotation::{Annotation, Document};
pub use crate::config::ParseOptions;
pub use crate::correction::{EditDistance, EditKind, ErrorMessage};
pub use crate::cyk::CykParser;
pub use crate::earley::EarleyParser;
pub use crate::error::GrammarError;
pub use crate::grammar::Grammar;
pub use crate::syntree::{ParsedTree, ParserType, TreeItem, TreeType};
pub use crate::token::{LexiconTagger, Tagger, Token};
pub use crate::utils::Err;

/// The interface both chart parsers share
pub trait SentenceParser {
  fn parser_type(&self) -> ParserType;

  fn options(&self) -> &ParseOptions;

  /// Parses tagged tokens without trying to correct them. What comes back on
  /// failure depends on the engine: CYK returns fragment forests, Earley
  /// nothing.
  fn parse(&self, tokens: &[Token]) -> Vec<ParsedTree>;

  /// Parses tagged tokens and, if that fails, searches for the smallest set
  /// of token edits that makes them parse. `tagger` re-tags edited sentences.
  fn parse_with_corrections(&self, tokens: &[Token], tagger: &dyn Tagger) -> Vec<ParsedTree>;
}

#[test]
fn test_engines_agree() {
  let src = "S = NP VP\nNP = ART ADJA* NN\nVP = VVFIN NP?";
  let mut tagger = LexiconTagger::with_inventory();
  tagger.insert("sieht", "VVFIN");
  tagger.insert("Stuhl", "NN");

  let tokens = tagger.tag("der große Tisch sieht der Stuhl", 0);
  let cyk = CykParser::new(src.parse().unwrap());
  let earley = EarleyParser::new(src.parse().unwrap());

  let mut from_cyk = cyk.parse(&tokens).iter().map(ParsedTree::to_qtree).collect::<Vec<_>>();
  let mut from_earley = earley.parse(&tokens).iter().map(ParsedTree::to_qtree).collect::<Vec<_>>();
  from_cyk.sort();
  from_earley.sort();

  assert_eq!(from_cyk.len(), 1);
  assert_eq!(from_cyk, from_earley);
}

#[test]
fn test_engines_agree_on_ambiguity() {
  let mut tagger = LexiconTagger::with_inventory();
  tagger.insert("Tisch", "NN");
  tagger.insert("Hund", "NN");
  tagger.insert("Katze", "NN");
  tagger.insert("Maus", "NN");
  tagger.insert("steht", "VVFIN");

  let cases = [
    (
      "S = X VVFIN\nS = Y VVFIN\nX = NP\nY = NP\nNP = ART N1\nN1 = NN",
      "der Tisch steht",
    ),
    ("S = NP VVFIN\nNP = NP KON NP | NN", "Hund und Katze und Maus steht"),
  ];

  for (src, sentence) in cases {
    let tokens = tagger.tag(sentence, 0);
    let cyk = CykParser::new(src.parse().unwrap());
    let earley = EarleyParser::new(src.parse().unwrap());

    let from_cyk = cyk.parse(&tokens);
    let from_earley = earley.parse(&tokens);
    assert_eq!(from_cyk.len(), 2, "{}", src);
    assert_eq!(from_earley.len(), 2, "{}", src);
    assert!(from_earley.iter().all(|t| t.tree_type == TreeType::Completed));
  }
}
