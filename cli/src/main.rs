use std::env;
use std::io;
use std::io::Write;
use std::process;

use chartmender::{
  CykParser, Document, EarleyParser, EditDistance, Err, Grammar, LexiconTagger, ParseOptions,
  SentenceParser, Tagger, Token,
};
use tracing_subscriber::EnvFilter;

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} GRAMMAR [options]

GRAMMAR is a grammar file, or a single inline rule line.

Options:
  -h, --help            Print this message
  -e, --earley          Parse with the Earley engine (defaults to CYK)
  -c, --chart           Print the parse chart (defaults to not printing)
  -b, --best-match      CYK: keep only the most probable entries per cell
  -1, --one-edit        Search corrections of at most one edit
  -l, --lexicon FILE    Tag words with the `word TAG` lines of FILE
  -i, --input FILE      Parse every line of FILE instead of reading stdin
  -o, --output DIR      With --input, write the annotated documents to DIR

Set RUST_LOG (e.g. RUST_LOG=chartmender=debug) for log output.",
    prog_name
  )
}

enum Engine {
  Cyk(CykParser),
  Earley(EarleyParser),
}

impl Engine {
  fn parser(&self) -> &dyn SentenceParser {
    match self {
      Self::Cyk(p) => p,
      Self::Earley(p) => p,
    }
  }

  fn chart(&self, tokens: &[Token]) -> String {
    match self {
      Self::Cyk(p) => p.parse_matrix(tokens).to_string(),
      Self::Earley(p) => p.parse_chart(tokens).to_string(),
    }
  }
}

fn parse(engine: &Engine, tagger: &dyn Tagger, sentence: &str, print_chart: bool) {
  let tokens = tagger.tag(sentence, 0);

  if print_chart {
    println!("tokens:");
    for t in tokens.iter() {
      println!("  {}", t);
    }
    println!("chart:\n{}\n", engine.chart(&tokens));
  }

  let trees = engine.parser().parse_with_corrections(&tokens, tagger);

  println!(
    "Parsed {} tree{}",
    trees.len(),
    if trees.len() == 1 { "" } else { "s" }
  );

  for t in trees {
    let distance = if t.is_corrected() { t.edit_distance() } else { 0 };
    println!("{:?} tree, edit distance {}", t.tree_type, distance);
    println!("{}", t.to_qtree());
    println!("{}", t.log_messages());
    println!();
  }
}

struct Args {
  grammar: String,
  earley: bool,
  print_chart: bool,
  best_match: bool,
  one_edit: bool,
  lexicon: Option<String>,
  input: Option<String>,
  output: Option<String>,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    let mut iter = v.into_iter();
    let Some(prog_name) = iter.next() else {
      return Err(Self::make_error_message("bad argument vector", "chartmender-cli"));
    };

    let mut grammar: Option<String> = None;
    let mut earley = false;
    let mut print_chart = false;
    let mut best_match = false;
    let mut one_edit = false;
    let mut lexicon = None;
    let mut input = None;
    let mut output = None;

    while let Some(o) = iter.next() {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-e" || o == "--earley" {
        earley = true;
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if o == "-b" || o == "--best-match" {
        best_match = true;
      } else if o == "-1" || o == "--one-edit" {
        one_edit = true;
      } else if matches!(
        o.as_str(),
        "-l" | "--lexicon" | "-i" | "--input" | "-o" | "--output"
      ) {
        let Some(value) = iter.next() else {
          return Err(Self::make_error_message(&format!("{} needs a value", o), prog_name));
        };
        match o.trim_start_matches('-') {
          "l" | "lexicon" => lexicon = Some(value),
          "i" | "input" => input = Some(value),
          _ => output = Some(value),
        }
      } else if grammar.is_none() {
        grammar = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    if output.is_some() && input.is_none() {
      return Err(Self::make_error_message("--output needs --input", prog_name));
    }

    if let Some(grammar) = grammar {
      Ok(Self {
        grammar,
        earley,
        print_chart,
        best_match,
        one_edit,
        lexicon,
        input,
        output,
      })
    } else {
      Err(Self::make_error_message("missing grammar", prog_name))
    }
  }

  fn parse_options(&self) -> ParseOptions {
    let distance = if self.one_edit { EditDistance::One } else { EditDistance::Two };
    ParseOptions::default()
      .with_best_match(self.best_match)
      .with_max_edit_distance(distance)
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let g = Grammar::from_source(&opts.grammar)?;
  let tagger = match &opts.lexicon {
    Some(path) => {
      let mut tagger = LexiconTagger::with_inventory();
      tagger.extend_from_str(&std::fs::read_to_string(path)?)?;
      tagger
    }
    None => LexiconTagger::with_inventory(),
  };

  let engine = if opts.earley {
    Engine::Earley(EarleyParser::with_options(g, opts.parse_options()))
  } else {
    Engine::Cyk(CykParser::with_options(g, opts.parse_options()))
  };
  let parser = engine.parser();

  if let Some(input) = &opts.input {
    let doc = Document::read_from_file(input)?;
    let docs = doc.parse_document(parser, &tagger);
    match &opts.output {
      Some(dir) => {
        let stem = format!("{:?}", parser.parser_type()).to_lowercase();
        let written = Document::write_to_dir(&docs, dir, &stem);
        println!(
          "Wrote {} of {} document{}",
          written,
          docs.len(),
          if docs.len() == 1 { "" } else { "s" }
        );
      }
      None => {
        for d in docs {
          println!("{}", d);
        }
      }
    }
    return Ok(());
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        parse(&engine, &tagger, input.trim(), opts.print_chart);
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
