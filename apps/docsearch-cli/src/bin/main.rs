//! docsearch - query the offline documentation index.
//!
//! ```bash
//! docsearch query '"buffer overflow" -windows title:exploit'
//! docsearch query kernel --page 2 --json
//! docsearch lite kernal --dir ./docs
//! docsearch history clear
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docsearch_core::config::{Config, Settings};
use docsearch_core::corpus::CorpusLoader;
use docsearch_core::history::HistoryStore;
use docsearch_core::store::JsonFileStore;
use docsearch_core::types::{HighlightSegment, SearchIndex};
use docsearch_lite::LiteSearchEngine;
use docsearch_rank::SearchSession;

#[derive(Parser)]
#[command(name = "docsearch", version, about = "Offline full-text search over technical articles")]
struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ranked search over the prebuilt index
    Query {
        query: String,
        /// Results per page (default: search.default_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Index file (default: data.index_path)
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Typo-tolerant prefix search built from the corpus
    Lite {
        query: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Corpus directory (default: data.corpus_dir)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Keep the lite index on disk here instead of in memory
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },
    /// Show or clear recent queries
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum HistoryAction {
    List,
    Clear,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docsearch=debug" } else { "docsearch=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Config::load().and_then(|c| c.settings()).context("loading configuration")?;

    match cli.command {
        Command::Query { query, limit, page, index } => run_query(&settings, &query, limit, page, index, cli.json),
        Command::Lite { query, limit, dir, index_dir } => run_lite(&settings, &query, limit, dir, index_dir, cli.json),
        Command::History { action } => run_history(&settings, action.unwrap_or(HistoryAction::List)),
    }
}

fn run_query(
    settings: &Settings,
    query: &str,
    limit: Option<usize>,
    page: usize,
    index: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let index_path = index.unwrap_or_else(|| settings.index_path());
    let search_index = SearchIndex::load(&index_path)
        .with_context(|| format!("loading index from {} (run docsearch-indexer first)", index_path.display()))?;

    let mut session_settings = settings.clone();
    session_settings.search.default_limit = settings.effective_limit(limit);
    let mut session = SearchSession::with_settings(JsonFileStore::new(settings.history_path()), session_settings);
    session.attach_index(search_index);
    let page_size = session.page_size();

    let state = session.perform_search(query, page)?;
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }
    if state.results.is_empty() {
        println!("No results for '{}'", query);
        return Ok(());
    }
    let offset = page_size * (state.page - 1);
    for (i, result) in state.results.iter().enumerate() {
        println!("{:>3}. {}  ({:.4})", offset + i + 1, render(&result.highlights.title), result.score);
        println!("     {}", result.path);
        if !result.sections.is_empty() {
            println!("     sections: {}", result.sections.join(" | "));
        }
    }
    if state.has_more {
        println!("\nMore results: docsearch query '{}' --page {}", query, state.page + 1);
    }
    Ok(())
}

fn run_lite(
    settings: &Settings,
    query: &str,
    limit: Option<usize>,
    dir: Option<PathBuf>,
    index_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut engine = match index_dir {
        Some(path) if path.exists() => LiteSearchEngine::open_in_dir(&path, settings.lite.clone())?,
        Some(path) => LiteSearchEngine::create_in_dir(&path, settings.lite.clone())?,
        None => LiteSearchEngine::new(settings.lite.clone())?,
    };
    if !engine.is_indexed() {
        let corpus_dir = dir.unwrap_or_else(|| settings.corpus_dir());
        let docs = CorpusLoader::new().load_dir(&corpus_dir)?;
        engine.index_documents(&docs)?;
    }

    let hits = engine.search(query, settings.effective_limit(limit))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No results for '{}'", query);
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("{:>3}. {}  ({:.4})", i + 1, hit.title, hit.score);
        println!("     {}", hit.path);
        if !hit.matches.is_empty() {
            let matched: Vec<String> = hit.matches.iter().map(|(word, fields)| format!("{} ({})", word, fields.join(", "))).collect();
            println!("     matched: {}", matched.join("; "));
        }
    }
    Ok(())
}

fn run_history(settings: &Settings, action: HistoryAction) -> Result<()> {
    let mut history = HistoryStore::open(JsonFileStore::new(settings.history_path()));
    match action {
        HistoryAction::List => {
            for (i, query) in history.get_history().iter().enumerate() {
                println!("{:>3}. {}", i + 1, query);
            }
        }
        HistoryAction::Clear => {
            history.clear_history();
            println!("Search history cleared");
        }
    }
    Ok(())
}

/// Wraps highlighted segments in `[` `]`.
fn render(segments: &[HighlightSegment]) -> String {
    segments
        .iter()
        .map(|s| if s.highlighted { format!("[{}]", s.text) } else { s.text.clone() })
        .collect()
}
