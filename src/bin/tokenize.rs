//! Print the tokens of a file (or stdin), one per line.
//!
//! ```ignore
//! tokenize data/input.txt
//! <input.txt tokenize --positions --symbols "== != -> =>"
//! ```
//!
//! Set `RUST_LOG=streamlex=trace` to see each token and pushback as it happens.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use streamlex::reader::DEFAULT_PUSHBACK;
use streamlex::{CountingSource, PushbackReader, SymbolSet, Tokenizer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tokenize")]
#[command(about = "Split input into words, numbers, and symbols", version)]
struct Cli {
    /// Input file; reads stdin if absent
    path: Option<PathBuf>,

    /// Two-character symbols to recognize, separated by spaces or commas
    #[arg(long, conflicts_with = "no_symbols")]
    symbols: Option<SymbolSet>,

    /// Only emit single-character symbols
    #[arg(long)]
    no_symbols: bool,

    /// Number of bytes the reader can push back
    #[arg(long, default_value_t = DEFAULT_PUSHBACK, value_parser = parse_capacity)]
    pushback: usize,

    /// Prefix each token with its line and column
    #[arg(long)]
    positions: bool,
}

fn parse_capacity(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("pushback capacity must be at least 1".to_owned()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid capacity {:?}: {}", s, e)),
    }
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let input: Box<dyn Read> = match &cli.path {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(std::io::stdin().lock()),
    };

    let symbols = match (cli.symbols, cli.no_symbols) {
        (_, true) => SymbolSet::empty(),
        (Some(symbols), false) => symbols,
        (None, false) => SymbolSet::standard().clone(),
    };

    // The byte count is logged when the source is dropped.
    let source = CountingSource::new(PushbackReader::with_capacity(
        BufReader::new(input),
        cli.pushback,
    ));
    let mut stdout = BufWriter::new(std::io::stdout().lock());

    for token in Tokenizer::with_symbols(source, &symbols).offsets() {
        let token = token?;
        if cli.positions {
            writeln!(stdout, "{}", token)?;
        } else {
            writeln!(stdout, "{}", token.token)?;
        }
    }
    stdout.flush()
}
