use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tagger::{TaggedWord, Tagger, TaggerConfig};
use tracing_subscriber::EnvFilter;

/// Part-of-speech tag text with an unpacked model directory.
///
/// Examples:
///   tag --model-dir ./pos-model "The quick brown fox jumps."
///   cat sentences.txt | tag --model-dir ./pos-model --json
#[derive(Parser)]
#[command(name = "tag", version, about, long_about = None)]
struct Cli {
    /// Directory holding vocab.txt, outTokens.txt and the model weights
    #[arg(short, long, value_name = "DIR")]
    model_dir: PathBuf,

    /// Override the fixed input length from tagger.json
    #[arg(long)]
    max_length: Option<usize>,

    /// Print one JSON array per input instead of word<TAB>tag lines
    #[arg(long)]
    json: bool,

    /// Text to tag; lines are read from stdin when omitted
    #[arg(value_name = "TEXT")]
    text: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = TaggerConfig::for_directory(&cli.model_dir)?;
    if let Some(max_length) = cli.max_length {
        config.max_length = max_length;
    }
    let tagger = Tagger::from_directory_with_config(&cli.model_dir, config)
        .with_context(|| format!("loading model from {}", cli.model_dir.display()))?;

    // single-shot: tag the command line and exit
    if !cli.text.is_empty() {
        let text = cli.text.join(" ");
        let tags = tagger.predict(&text)?;
        print_tags(&tags, cli.json)?;
        return Ok(());
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return repl(&tagger, cli.json);
    }

    // piped input: tag every line in parallel, print in input order
    let lines = stdin.lock().lines().collect::<io::Result<Vec<_>>>()?;
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    for (line, result) in refs.iter().zip(tagger.predict_all(&refs)) {
        match result {
            Ok(tags) => print_tags(&tags, cli.json)?,
            Err(e) => eprintln!("skipping {line:?}: {e}"),
        }
    }
    Ok(())
}

fn repl(tagger: &Tagger, json: bool) -> anyhow::Result<()> {
    println!("Enter text to tag, 'quit' or Ctrl-D to exit");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let s = line.trim();
        if s.is_empty() {
            continue;
        }
        if s.eq_ignore_ascii_case("quit") || s.eq_ignore_ascii_case("exit") {
            break;
        }
        match tagger.predict(s) {
            Ok(tags) => print_tags(&tags, json)?,
            Err(e) => eprintln!("error: {e}"),
        }
        io::stdout().flush()?;
    }
    Ok(())
}

fn print_tags(tags: &[TaggedWord], json: bool) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string(tags)?)?;
    } else {
        for t in tags {
            writeln!(out, "{}\t{}", t.word, t.tag)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
