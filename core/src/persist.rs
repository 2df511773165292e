use crate::{Clock, Document, ScoreConfig, SearchEngine};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

/// On-disk form of a document. bincode cannot read internally tagged enums.
#[derive(Debug, Serialize, Deserialize)]
enum Record {
    Thread { id: u64, name: String, description: String },
    Post { id: u64, thread_id: u64, title: String, content: String, upvote_count: u32, created_at: i128 },
    Reply { id: u64, post_id: u64, content: String, upvote_count: u32, created_at: i128 },
}

impl From<&Document> for Record {
    fn from(doc: &Document) -> Self {
        match doc.clone() {
            Document::Thread { id, name, description } => Record::Thread { id, name, description },
            Document::Post { id, thread_id, title, content, upvote_count, created_at } => {
                Record::Post { id, thread_id, title, content, upvote_count, created_at: created_at.unix_timestamp_nanos() }
            }
            Document::Reply { id, post_id, content, upvote_count, created_at } => {
                Record::Reply { id, post_id, content, upvote_count, created_at: created_at.unix_timestamp_nanos() }
            }
        }
    }
}

impl TryFrom<Record> for Document {
    type Error = anyhow::Error;

    fn try_from(record: Record) -> Result<Self> {
        Ok(match record {
            Record::Thread { id, name, description } => Document::Thread { id, name, description },
            Record::Post { id, thread_id, title, content, upvote_count, created_at } => Document::Post {
                id,
                thread_id,
                title,
                content,
                upvote_count,
                created_at: OffsetDateTime::from_unix_timestamp_nanos(created_at)?,
            },
            Record::Reply { id, post_id, content, upvote_count, created_at } => Document::Reply {
                id,
                post_id,
                content,
                upvote_count,
                created_at: OffsetDateTime::from_unix_timestamp_nanos(created_at)?,
            },
        })
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_docs(paths: &IndexPaths, docs: &[Document]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.docs())?;
    let records: Vec<Record> = docs.iter().map(Record::from).collect();
    let bytes = bincode::serialize(&records)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<Document>> {
    let mut f = File::open(paths.docs()).with_context(|| format!("opening {}", paths.docs().display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let records: Vec<Record> = bincode::deserialize(&buf)?;
    records.into_iter().map(Document::try_from).collect()
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write the engine's documents. Postings are rebuilt on load.
pub fn save_snapshot(paths: &IndexPaths, engine: &SearchEngine) -> Result<MetaFile> {
    let docs = engine.documents();
    save_docs(paths, &docs)?;
    let meta = MetaFile {
        num_docs: u32::try_from(docs.len()).context("too many documents for a snapshot")?,
        created_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        version: SNAPSHOT_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "snapshot saved");
    Ok(meta)
}

/// Rebuild an engine from a snapshot directory.
pub fn load_snapshot(paths: &IndexPaths, config: Arc<ScoreConfig>, clock: Arc<dyn Clock>) -> Result<SearchEngine> {
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {} (expected {SNAPSHOT_VERSION})", meta.version);
    }
    let docs = load_docs(paths)?;
    if docs.len() != meta.num_docs as usize {
        bail!("snapshot is inconsistent: meta.json lists {} documents, docs.bin holds {}", meta.num_docs, docs.len());
    }
    let engine = SearchEngine::new(config, clock);
    engine.index_all(docs);
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "snapshot loaded");
    Ok(engine)
}
