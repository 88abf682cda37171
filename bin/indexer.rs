use anyhow::{Context, Result};
use clap::Parser;
use corpus_index::{IndexBuilder, IndexerConfig, SqliteCorpus, DEFAULT_CHUNK_LIMIT};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "indexer", version)]
#[command(about = "Build an inverted index from a sqlite document corpus", long_about = None)]
struct Args {
    /// Corpus database
    #[arg(long, env = "CORPUS_INDEX_DB", default_value = "ssot_parallel.db")]
    db: PathBuf,

    /// Output directory for the index artifacts
    #[arg(long, env = "CORPUS_INDEX_OUT", default_value = "ssot_index")]
    out: PathBuf,

    /// Entries buffered in memory before a sorted run is flushed
    #[arg(long, default_value_t = DEFAULT_CHUNK_LIMIT, value_parser = parse_chunk)]
    chunk: usize,

    /// Keep the sorted run files in <out>/tmp after the merge
    #[arg(long)]
    keep_runs: bool,
}

fn parse_chunk(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("chunk must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
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

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Index build failed: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Starting corpus indexer v{}", corpus_index::VERSION);

    let config = IndexerConfig::new(&args.out, args.db.display().to_string())
        .with_chunk_limit(args.chunk)
        .with_keep_runs(args.keep_runs);

    let corpus = SqliteCorpus::open(&args.db)
        .await
        .with_context(|| format!("cannot open corpus database {}", args.db.display()))?;

    let mut builder = IndexBuilder::create(config)
        .with_context(|| format!("cannot prepare output directory {}", args.out.display()))?;

    let read = corpus
        .for_each_record(|record| builder.add_record(&record).map(|_| ()))
        .await
        .context("reading corpus")?;
    corpus.close().await;
    info!(docs = read, "Corpus exhausted, merging runs");

    let summary = builder.finish().context("merging index")?;
    info!(
        docs = summary.document_count,
        terms = summary.term_count,
        avg_doc_len = summary.avg_doc_len,
        out = %args.out.display(),
        "Index written"
    );
    Ok(())
}
