use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::config::ScoreConfig;
use crate::document::{DocId, DocType, Document};
use crate::index::{IndexedDoc, InvertedIndex};
use crate::query::{parse, QueryPlan};
use crate::scoring::{rank_order, ScoreBreakdown, Scorer};
use crate::snippet::generate_snippet;
use crate::tokenizer::Tokenizer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub doc_id: DocId,
    pub doc_type: DocType,
    pub score: f64,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ScoreBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<ScoredResult>,
}

/// Shared search engine: many concurrent queries, serialized index updates.
pub struct SearchEngine {
    config: Arc<ScoreConfig>,
    tokenizer: Tokenizer,
    clock: Arc<dyn Clock>,
    index: RwLock<InvertedIndex>,
}

impl SearchEngine {
    pub fn new(config: Arc<ScoreConfig>, clock: Arc<dyn Clock>) -> Self {
        let tokenizer = Tokenizer::new(&config);
        Self { config, tokenizer, clock, index: RwLock::new(InvertedIndex::new()) }
    }

    pub fn with_system_clock(config: Arc<ScoreConfig>) -> Self { Self::new(config, Arc::new(SystemClock)) }

    pub fn config(&self) -> &ScoreConfig { &self.config }

    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

    /// Index or overwrite a document. Readers see either the old or the new
    /// version, never a mix.
    pub fn index_document(&self, doc: Document) {
        let indexed = IndexedDoc::analyze(doc, &self.tokenizer);
        let doc_id = indexed.doc_id();
        let tokens = indexed.num_tokens();
        let replaced = self.index.write().insert(indexed).is_some();
        tracing::debug!(%doc_id, tokens, replaced, "indexed document");
    }

    pub fn reindex_document(&self, doc: Document) { self.index_document(doc) }

    /// Remove a document. Unknown ids are ignored. Returns whether anything was removed.
    pub fn remove_document(&self, doc_id: DocId) -> bool {
        match self.index.write().remove(&doc_id) {
            Ok(_) => {
                tracing::debug!(%doc_id, "removed document");
                true
            }
            Err(err) => {
                tracing::debug!(%err, "remove ignored");
                false
            }
        }
    }

    pub fn index_all<I: IntoIterator<Item = Document>>(&self, docs: I) -> usize {
        let analyzed: Vec<IndexedDoc> = docs.into_iter().map(|d| IndexedDoc::analyze(d, &self.tokenizer)).collect();
        let count = analyzed.len();
        let mut index = self.index.write();
        for indexed in analyzed {
            index.insert(indexed);
        }
        tracing::info!(count, total = index.len(), terms = index.num_terms(), "bulk indexed documents");
        count
    }

    /// Current documents ordered by id.
    pub fn documents(&self) -> Vec<Document> {
        let index = self.index.read();
        let mut docs: Vec<Document> = index.documents().cloned().collect();
        docs.sort_by_key(Document::doc_id);
        docs
    }

    pub fn contains(&self, doc_id: DocId) -> bool { self.index.read().contains(&doc_id) }

    pub fn len(&self) -> usize { self.index.read().len() }

    pub fn is_empty(&self) -> bool { self.index.read().is_empty() }

    /// Run `f` against a consistent view of the index.
    ///
    /// `f` runs under the read lock, which is not re-entrant: it must not call
    /// back into this engine (`len`, `search`, `index_document`, ...) or it can
    /// deadlock behind a queued writer.
    pub fn with_index<R>(&self, f: impl FnOnce(&InvertedIndex) -> R) -> R { f(&self.index.read()) }

    pub fn parse(&self, raw_query: &str) -> QueryPlan { parse(raw_query, &self.tokenizer) }

    pub fn search(&self, raw_query: &str, limit: Option<usize>, offset: usize) -> Vec<ScoredResult> {
        self.search_page(raw_query, limit, offset).results
    }

    pub fn search_page(&self, raw_query: &str, limit: Option<usize>, offset: usize) -> SearchPage {
        self.run(raw_query, limit, offset, false)
    }

    /// Like `search_page`, with a score breakdown attached to every result.
    pub fn explain_page(&self, raw_query: &str, limit: Option<usize>, offset: usize) -> SearchPage {
        self.run(raw_query, limit, offset, true)
    }

    fn run(&self, raw_query: &str, limit: Option<usize>, offset: usize, explain: bool) -> SearchPage {
        let start = Instant::now();
        let plan = self.parse(raw_query);
        if plan.is_empty() {
            tracing::debug!(query = raw_query, "empty query plan");
            return SearchPage { query: raw_query.to_string(), took_s: start.elapsed().as_secs_f64(), total_hits: 0, results: Vec::new() };
        }

        let now = self.clock.now();
        let scorer = Scorer::new(&self.config);
        let index = self.index.read();
        let candidates = index.candidates(plan.lookup_terms());
        let mut hits: Vec<(ScoreBreakdown, &IndexedDoc)> = candidates
            .iter()
            .filter_map(|id| index.get(id))
            .map(|doc| (scorer.explain(doc, &plan, now), doc))
            .filter(|(b, _)| b.is_match() && b.total > 0.0)
            .collect();
        hits.sort_by(|(a_score, a), (b_score, b)| rank_order(a_score.total, a, b_score.total, b));

        let total_hits = hits.len();
        let limit = limit.filter(|&l| l > 0).unwrap_or(self.config.default_limit);
        let results: Vec<ScoredResult> = hits
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(breakdown, doc)| ScoredResult {
                doc_id: doc.doc_id(),
                doc_type: doc.doc.doc_type(),
                score: breakdown.total,
                snippet: generate_snippet(doc, &plan, &self.config),
                explain: explain.then_some(breakdown),
            })
            .collect();

        let took_s = start.elapsed().as_secs_f64();
        tracing::debug!(query = raw_query, candidates = candidates.len(), total_hits, returned = results.len(), took_s, "search");
        SearchPage { query: raw_query.to_string(), took_s, total_hits, results }
    }
}
