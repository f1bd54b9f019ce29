use chartmender::correction::SearchContext;
use chartmender::parse_grammar::parse_line;
use chartmender::{
  CykParser, EarleyParser, EditDistance, EditKind, Grammar, LexiconTagger, ParsedTree,
  SentenceParser, Tagger, TreeType,
};

const GRAMMAR: &str = "S = NP VP\nNP = ART NN\nVP = VVFIN";

fn tagger() -> LexiconTagger {
  // the inventory words are needed to retag inserted tokens
  let mut tagger = LexiconTagger::with_inventory();
  tagger.extend_from_str("der ART\nTisch NN\nsteht VVFIN\nschon ADV").unwrap();
  tagger
}

fn grammar() -> Grammar {
  GRAMMAR.parse().unwrap()
}

fn parsers() -> Vec<Box<dyn SentenceParser>> {
  vec![Box::new(CykParser::new(grammar())), Box::new(EarleyParser::new(grammar()))]
}

fn rules(line: &str) -> Vec<(String, Vec<String>)> {
  parse_line(line)
    .unwrap()
    .into_iter()
    .map(|f| (f.rule.symbol, f.rule.productions))
    .collect()
}

fn leaf_spans(tree: &ParsedTree) -> Vec<(usize, usize)> {
  let mut spans = tree.root.leaves().iter().map(|l| (l.begin, l.end)).collect::<Vec<_>>();
  spans.sort();
  spans
}

#[test]
fn grammar_round_trip() {
  assert_eq!(
    rules("S = NP VP"),
    vec![("S".to_string(), vec!["NP".to_string(), "VP".to_string()])]
  );

  let alternatives = rules("A = b | c");
  assert_eq!(alternatives.len(), 2);
  assert!(alternatives.iter().all(|(lhs, _)| lhs == "A"));
}

#[test]
fn operator_expansion() {
  let plus = rules("A = x+");
  assert_eq!(plus.len(), 2);
  assert!(plus.contains(&("A".to_string(), vec!["x".to_string(), "A".to_string()])));
  assert!(plus.contains(&("A".to_string(), vec!["x".to_string()])));

  // the empty alternative is discarded
  assert_eq!(rules("A = x?"), vec![("A".to_string(), vec!["x".to_string()])]);
}

#[test]
fn cyk_probabilities_multiply() {
  let parser = CykParser::new("S = NP VP 0.5\nNP = ART NN 0.8\nVP = VVFIN 0.5".parse().unwrap());
  let tokens = tagger().tag("der Tisch steht", 0);
  let m = parser.parse_matrix(&tokens);

  for col in 0..tokens.len() {
    for token in m.cell(0, col).iter().filter(|t| t.is_terminal()) {
      assert_eq!(token.probability, 1.0);
    }
  }

  let np = m.cell(1, 0).iter().find(|t| t.symbol == "NP").unwrap();
  assert_eq!(np.probability, 0.8);
  let s = m.top().iter().find(|t| t.symbol == "S").unwrap();
  let (left, right) = (s.left.as_ref().unwrap(), s.right.as_ref().unwrap());
  assert_eq!(s.probability, 0.5 * left.probability * right.probability);
}

#[test]
fn cyk_completeness() {
  let tokens = tagger().tag("der Tisch steht", 0);
  let parser = CykParser::new(grammar());

  let trees = parser.find_parsing_tree(&parser.parse_matrix(&tokens));
  assert!(!trees.is_empty());
  assert!(trees.iter().all(|t| t.tree_type == TreeType::Completed));
  assert!(trees.iter().all(|t| t.root.leaf_count() == tokens.len()));
}

#[test]
fn earley_soundness() {
  let tokens = tagger().tag("der Tisch steht", 0);
  let parser = EarleyParser::new(grammar());

  let table = parser.parse_chart(&tokens);
  let last = table.charts.last().unwrap();
  assert!(last.iter().any(|s| s.lr0.is_completed() && s.origin == 0 && s.symbol() == "S"));

  let trees = parser.find_tree_root(&table, &tokens);
  assert!(!trees.is_empty());
  assert!(trees.iter().all(|t| t.root.leaf_count() == tokens.len()));
}

#[test]
fn partial_parse_fallback() {
  let tokens = tagger().tag("der Tisch schon steht", 0);
  let parser = CykParser::new(grammar());

  let trees = parser.parse(&tokens);
  assert!(!trees.is_empty());

  let expected = tokens.iter().map(|t| (t.begin, t.end)).collect::<Vec<_>>();
  for tree in trees.iter() {
    assert_eq!(tree.tree_type, TreeType::Incompleted);
    assert_eq!(leaf_spans(tree), expected);
  }
}

#[test]
fn one_edit_is_preferred() {
  let tagger = tagger();
  // "der Tisch" would also parse after two edits, e.g. deleting "Tisch" and
  // inserting a noun, but one insertion is enough
  let tokens = tagger.tag("der Tisch", 0);

  for parser in parsers() {
    let trees = parser.parse_with_corrections(&tokens, &tagger);
    assert!(!trees.is_empty(), "{:?}", parser.parser_type());
    for tree in trees.iter() {
      assert!(tree.is_corrected());
      assert_eq!(tree.edit_distance(), 1);
      assert!(tree.error_log.iter().all(|m| m.distance == EditDistance::One));
    }
  }
}

#[test]
fn retagging_dedup() {
  let tokens = tagger().tag("der Tisch steht", 0);
  let mut ctx = SearchContext::new();

  assert!(ctx.first_try(0, &tokens));
  assert!(!ctx.first_try(0, &tokens));
  assert_eq!(ctx.attempts, 1);

  // the same sentence with edits still to make is a different attempt
  assert!(ctx.first_try(1, &tokens));
  assert_eq!(ctx.attempts, 2);
}

#[test]
fn example_scenario() {
  let tokens = tagger().tag("der Tisch steht", 0);

  for parser in parsers() {
    let trees = parser.parse(&tokens);
    assert_eq!(trees.len(), 1, "{:?}", parser.parser_type());

    let tree = &trees[0];
    assert_eq!(tree.tree_type, TreeType::Completed);
    assert_eq!((tree.root.begin, tree.root.end), (0, 15));
    assert_eq!(tree.to_qtree(), r"\Tree [.S [.NP [.ART ] [.NN ] ] [.VP [.VVFIN ] ] ]");
    assert_eq!(tree.log_messages(), "There has been no error correction!");
  }
}

#[test]
fn example_correction_scenario() {
  let tagger = tagger();
  let tokens = tagger.tag("Tisch steht", 0);

  for parser in parsers() {
    let trees = parser.parse_with_corrections(&tokens, &tagger);
    assert_eq!(trees.len(), 1, "{:?}", parser.parser_type());

    let tree = &trees[0];
    assert_eq!(tree.tree_type, TreeType::Completed);
    assert_eq!(tree.root.leaf_count(), 3);
    assert_eq!(tree.root.children[0].children[0].literal, "ART");

    let messages = tree.error_log.iter().collect::<Vec<_>>();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, EditKind::Added);
    assert_eq!(messages[0].distance, EditDistance::One);
    assert_eq!(
      tree.log_messages(),
      "[ERROR]: Tisch steht\nPlease insert a word of the type 'ART' before 'Tisch'!"
    );
  }
}
