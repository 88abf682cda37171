use anyhow::{Context, Result};
use clap::Parser;
use corpus_index::{QueryMode, SearchOutcome, Searcher};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "searcher", version)]
#[command(about = "Query an index built by `indexer`", long_about = None)]
struct Args {
    /// Index directory
    #[arg(long, env = "CORPUS_INDEX_DIR", default_value = "ssot_index")]
    index: PathBuf,

    /// keyword (boolean AND) or full (BM25 ranked)
    #[arg(long, default_value = "keyword")]
    mode: QueryMode,

    /// Maximum number of results
    #[arg(long, default_value_t = 10, value_parser = parse_limit)]
    limit: usize,

    /// Query text
    #[arg(long, value_parser = parse_query)]
    query: String,
}

fn parse_limit(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_query(s: &str) -> std::result::Result<String, String> {
    if s.trim().is_empty() {
        Err("query must not be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Search failed: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut searcher = Searcher::open(&args.index)
        .with_context(|| format!("cannot load index from {}", args.index.display()))?;

    let outcome = searcher.search(&args.query, args.mode, args.limit)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match outcome {
        SearchOutcome::Matches(hits) => {
            for hit in hits {
                match hit.score {
                    Some(score) => {
                        writeln!(out, "{:.6}\t{}\t{}", score, hit.external_id, hit.path)?
                    }
                    None => writeln!(out, "{}\t{}", hit.external_id, hit.path)?,
                }
            }
        }
        SearchOutcome::NoResults => writeln!(out, "No results.")?,
        SearchOutcome::InvalidQuery => writeln!(out, "Invalid query: no searchable terms.")?,
    }
    out.flush()?;
    Ok(())
}
