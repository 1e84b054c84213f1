use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docsearch_core::config::Config;
use docsearch_core::corpus::CorpusLoader;
use docsearch_rank::IndexBuilder;

/// Build the JSON search index from a directory of markdown articles.
#[derive(Parser)]
#[command(name = "docsearch-indexer", version, about)]
struct Args {
    /// Corpus directory (default: data.corpus_dir)
    dir: Option<PathBuf>,

    /// Output file (default: data.index_path)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Only index the first N files
    #[arg(long)]
    limit: Option<usize>,

    /// File extension to pick up
    #[arg(long, default_value = "md")]
    ext: String,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default = if args.verbose { "docsearch=debug" } else { "docsearch=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let settings = Config::load().and_then(|c| c.settings()).context("loading configuration")?;
    let data_dir = args.dir.unwrap_or_else(|| settings.corpus_dir());
    let out = args.out.unwrap_or_else(|| settings.index_path());

    println!("Search Indexer\n==============");
    println!("Corpus directory: {}", data_dir.display());

    let loader = CorpusLoader::with_extension(args.ext);
    let docs = loader.load_dir_limited(&data_dir, args.limit.unwrap_or(usize::MAX))?;

    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len}")?);
    pb.set_message("Indexing");
    let mut builder = IndexBuilder::new();
    let mut skipped = 0;
    for doc in &docs {
        if !builder.add_document(doc) {
            skipped += 1;
        }
        pb.inc(1);
    }
    pb.finish();

    let index = builder.build();
    for anomaly in index.validate() {
        tracing::warn!("{}", anomaly);
    }
    index.save(&out).with_context(|| format!("writing {}", out.display()))?;

    println!("\nIndexed {} articles ({} skipped), {} terms", index.article_count(), skipped, index.terms.len());
    println!("Index written to {}", out.display());
    println!("\nTo search, use: docsearch query '<query>'");
    Ok(())
}
