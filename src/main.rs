use chartmender::{CykParser, EarleyParser, Err, Grammar, LexiconTagger, SentenceParser, Tagger};

const GRAMMAR: &str = r#"
    // sentence rules
    [Sentence] S = NP VP ($.)? 1.0
    [Noun-Phrase] NP = ART ADJA* NN 0.7
    [Noun-Phrase] NP = (NE | PPER) 0.3
    // intransitive or transitive verb
    [Verb-Phrase] VP = VVFIN (NP | ADV)? 1.0
"#;

const LEXICON: &str = r#"
    // articles
    der ART
    die ART
    das ART
    den ART
    // nouns and names
    Hund NN
    Katze NN
    Ball NN
    Maria NE
    // adjectives
    kleine ADJA
    schwarze ADJA
    // verbs
    sieht VVFIN
    jagt VVFIN
    schläft VVFIN
    // adverbs
    heute ADV
"#;

fn main() -> Result<(), Err> {
  let mut tagger = LexiconTagger::with_inventory();
  tagger.extend_from_str(LEXICON)?;

  let g: Grammar = GRAMMAR.parse()?;
  let parsers: [Box<dyn SentenceParser>; 2] = [
    Box::new(CykParser::new(g.clone())),
    Box::new(EarleyParser::new(g)),
  ];

  for sentence in ["Der kleine Hund jagt die schwarze Katze.", "Hund jagt die Katze."] {
    let tokens = tagger.tag(sentence, 0);

    for parser in parsers.iter() {
      let trees = parser.parse_with_corrections(&tokens, &tagger);

      println!(
        "{:?}: parsed {} tree{} for {:?}",
        parser.parser_type(),
        trees.len(),
        if trees.len() == 1 { "" } else { "s" },
        sentence
      );
      for t in trees {
        println!("{}", t.to_qtree());
        println!("{}\n", t.log_messages());
      }
    }
  }

  Ok(())
}
