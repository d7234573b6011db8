use clap::Parser;
use cyklone::{CykParser, Grammar, Parse, ParseRef};
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Parse sentences against a grammar in Chomsky Normal Form.
///
/// Without a sentence an interactive prompt is started. Lines starting with
/// ':' are commands: `:grammar`, `:keys`, `:spans KEY`, `:chart`.
#[derive(Parser, Debug)]
#[command(name = "cyk", version)]
struct Args {
    /// Grammar file made of `Key := "literal" | Left Right ;` rules
    grammar: PathBuf,
    /// Only keep parses rooted at these symbols
    #[arg(short, long)]
    target: Vec<String>,
    /// Print the token spans of these symbols for every parse
    #[arg(short, long)]
    spans: Vec<String>,
    /// Print production keys top-down, left to right
    #[arg(short, long)]
    keys: bool,
    /// Draw every parse tree
    #[arg(long)]
    tree: bool,
    /// Sentence to parse once
    sentence: Vec<String>,
}

fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn select<'g>(parser: &CykParser<'g>, args: &Args, tokens: &[String]) -> Vec<ParseRef<'g>> {
    if args.target.is_empty() {
        parser.parse(tokens)
    } else {
        parser.parse_matching(tokens, &args.target)
    }
}

fn print_spans(parse: &Parse<'_>, key: &str) {
    let spans = parse.production_terminals(key)
        .iter()
        .map(|span| format!("[{}]", span.join(" ")))
        .collect::<Vec<_>>();
    println!("   {}: {}", key, spans.join(" "));
}

fn report(parser: &CykParser<'_>, args: &Args, tokens: &[String]) {
    let found = select(parser, args, tokens);
    if found.is_empty() {
        println!("no parse");
        return;
    }
    for (idx, parse) in found.iter().enumerate() {
        println!("#{} {}", idx, parse);
        if args.keys {
            println!("   keys: {}", parse.production_keys().join(" "));
        }
        for key in &args.spans {
            print_spans(parse, key);
        }
        if args.tree {
            print!("{}", parse.pretty());
        }
    }
}

fn run_command(parser: &CykParser<'_>, args: &Args, command: &str, tokens: &[String]) {
    let mut words = command.split_whitespace();
    match (words.next(), words.next()) {
        (Some("grammar"), None) => print!("{}", parser.grammar()),
        (Some("keys"), None) => {
            for (idx, parse) in select(parser, args, tokens).iter().enumerate() {
                println!("#{} {}", idx, parse.production_keys().join(" "));
            }
        }
        (Some("spans"), Some(key)) => {
            for (idx, parse) in select(parser, args, tokens).iter().enumerate() {
                println!("#{}", idx);
                print_spans(parse, key);
            }
        }
        (Some("chart"), None) => {
            for (start, end, cell) in parser.chart(tokens).spans() {
                let keys = cell.iter().map(|p| p.key()).collect::<Vec<_>>();
                println!("[{}, {}) {:?}: {}", start, end, tokens[start..end].join(" "), keys.join(" "));
            }
        }
        _ => println!("Unknown command ':{}', try :grammar :keys :spans KEY :chart", command),
    }
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = std::fs::read_to_string(&args.grammar)
        .map_err(|e| format!("{}: {}", args.grammar.display(), e))?;
    let grammar: Grammar = source.parse()
        .map_err(|e| format!("{}: {}", args.grammar.display(), e))?;
    let parser = CykParser::new(&grammar);

    if !args.sentence.is_empty() {
        report(&parser, &args, &tokenize(&args.sentence.join(" ")));
        return Ok(());
    }

    let mut rl = rustyline::DefaultEditor::new().map_err(|e| e.to_string())?;
    let mut last = Vec::new();
    loop {
        match rl.readline("~> ") {
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(format!("Readline err: {:?}", e)),
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if let Some(command) = line.strip_prefix(':') {
                    run_command(&parser, &args, command, &last);
                } else {
                    last = tokenize(line);
                    report(&parser, &args, &last);
                }
            }
        }
    }
}
