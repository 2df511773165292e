use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forum_search_core::persist::{load_snapshot, save_snapshot, IndexPaths};
use forum_search_core::{Clock, DocId, DocType, Document, FixedClock, ScoreConfig, SearchEngine, SystemClock};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One line of a change feed produced by the forum data layer.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum FeedEntry {
    Upsert { doc: Document },
    Delete { doc_type: DocType, id: u64 },
}

#[derive(Parser)]
#[command(name = "forum-search")]
#[command(about = "Build, update and query the forum search index", long_about = None)]
struct Cli {
    /// Ranking configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true, env = "FORUM_SEARCH_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a snapshot from JSON/JSONL documents (file or directory)
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
    },
    /// Apply a JSONL change feed of upserts and deletes to a snapshot
    Apply {
        /// Index directory
        #[arg(long)]
        index: String,
        /// Feed file (JSONL)
        #[arg(long)]
        feed: String,
    },
    /// Run a query and print the ranked page as JSON
    Query {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        /// Query text; wrap phrases in double quotes
        #[arg(long)]
        q: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Evaluate recency against this RFC 3339 instant instead of the system clock
        #[arg(long)]
        now: Option<String>,
        /// Attach score breakdowns to each result
        #[arg(long, default_value_t = false)]
        explain: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    // config errors are fatal at startup
    let config = Arc::new(match &cli.config {
        Some(path) => ScoreConfig::load(path)?,
        None => ScoreConfig::default(),
    });

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output, config),
        Commands::Apply { index, feed } => apply_feed(&index, &feed, config),
        Commands::Query { index, q, limit, offset, now, explain } => {
            let clock: Arc<dyn Clock> = match now {
                Some(ts) => Arc::new(FixedClock(OffsetDateTime::parse(&ts, &Rfc3339).with_context(|| format!("invalid --now {ts}"))?)),
                None => Arc::new(SystemClock),
            };
            let engine = load_snapshot(&IndexPaths::new(&index), config, clock)?;
            let page = if explain { engine.explain_page(&q, limit, offset) } else { engine.search_page(&q, limit, offset) };
            println!("{}", serde_json::to_string_pretty(&page)?);
            Ok(())
        }
    }
}

fn build_index(input: &str, output: &str, config: Arc<ScoreConfig>) -> Result<()> {
    let input_path = Path::new(input);
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input {input} does not exist");
    }

    let mut docs: Vec<Document> = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }

    let engine = SearchEngine::with_system_clock(config);
    let ingested = engine.index_all(docs);
    let (num_terms, num_postings) = engine.with_index(|idx| (idx.num_terms(), idx.num_postings()));
    tracing::info!(ingested, num_docs = engine.len(), num_terms, num_postings, "ingested documents");

    save_snapshot(&IndexPaths::new(output), &engine)?;
    tracing::info!(output, "index build complete");
    Ok(())
}

fn read_jsonl(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: Document = serde_json::from_str(&line).with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping file without documents"),
    }
    Ok(())
}

fn apply_feed(index: &str, feed: &str, config: Arc<ScoreConfig>) -> Result<()> {
    let paths = IndexPaths::new(index);
    let engine = load_snapshot(&paths, config, Arc::new(SystemClock))?;
    let f = File::open(feed).with_context(|| format!("opening {feed}"))?;
    let (mut upserts, mut deletes, mut ignored) = (0usize, 0usize, 0usize);
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let entry: FeedEntry = serde_json::from_str(&line).with_context(|| format!("{feed}:{}", lineno + 1))?;
        match entry {
            FeedEntry::Upsert { doc } => {
                engine.index_document(doc);
                upserts += 1;
            }
            FeedEntry::Delete { doc_type, id } => {
                if engine.remove_document(DocId::new(doc_type, id)) { deletes += 1 } else { ignored += 1 }
            }
        }
    }
    tracing::info!(upserts, deletes, ignored, num_docs = engine.len(), "applied feed");
    save_snapshot(&paths, &engine)?;
    Ok(())
}
