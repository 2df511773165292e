use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::document::{DocId, Document, Field};
use crate::error::{Result, SearchError};
use crate::tokenizer::{Token, Tokenizer};

/// One term occurrence at a field position of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub field: Field,
    pub position: u32,
    /// Occurrences of the same term in the same field of the same document.
    pub term_frequency: u32,
}

/// Forward-index entry for one field of one document.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub field: Field,
    pub tokens: Vec<Token>,
    positions: HashMap<String, Vec<u32>>, // ascending
}

impl FieldEntry {
    pub fn new(field: Field, tokens: Vec<Token>) -> Self {
        let mut positions: HashMap<String, Vec<u32>> = HashMap::new();
        for t in &tokens {
            positions.entry(t.term.clone()).or_default().push(t.position);
        }
        Self { field, tokens, positions }
    }

    pub fn positions(&self, term: &str) -> &[u32] {
        self.positions.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn term_frequency(&self, term: &str) -> u32 { self.positions(term).len() as u32 }

    pub fn contains(&self, term: &str) -> bool { self.positions.contains_key(term) }

    pub fn terms(&self) -> impl Iterator<Item = &str> { self.positions.keys().map(String::as_str) }
}

/// A document together with its analyzed fields.
#[derive(Debug, Clone)]
pub struct IndexedDoc {
    pub doc: Document,
    pub fields: Vec<FieldEntry>,
}

impl IndexedDoc {
    pub fn analyze(doc: Document, tokenizer: &Tokenizer) -> Self {
        let fields = doc
            .fields()
            .into_iter()
            .map(|(field, text)| FieldEntry::new(field, tokenizer.tokenize(text, field)))
            .collect();
        Self { doc, fields }
    }

    pub fn doc_id(&self) -> DocId { self.doc.doc_id() }

    /// Field entries paired with their source text.
    pub fn field_texts(&self) -> Vec<(&FieldEntry, &str)> {
        self.fields.iter().zip(self.doc.fields().into_iter().map(|(_, text)| text)).collect()
    }

    pub fn num_tokens(&self) -> usize { self.fields.iter().map(|f| f.tokens.len()).sum() }
}

#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<Posting>>, // insertion order
    docs: HashMap<DocId, IndexedDoc>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Adds a document, replacing any previous version with the same id.
    /// Returns the replaced version.
    pub fn insert(&mut self, indexed: IndexedDoc) -> Option<IndexedDoc> {
        let doc_id = indexed.doc_id();
        let previous = self.remove(&doc_id).ok();
        for entry in &indexed.fields {
            for token in &entry.tokens {
                self.postings.entry(token.term.clone()).or_default().push(Posting {
                    doc_id,
                    field: entry.field,
                    position: token.position,
                    term_frequency: entry.term_frequency(&token.term),
                });
            }
        }
        self.docs.insert(doc_id, indexed);
        previous
    }

    /// Drops a document and every posting that points at it.
    pub fn remove(&mut self, doc_id: &DocId) -> Result<IndexedDoc> {
        let indexed = self.docs.remove(doc_id).ok_or(SearchError::UnknownDocument(*doc_id))?;
        let terms: BTreeSet<&str> = indexed.fields.iter().flat_map(|f| f.terms()).collect();
        for term in terms {
            if let Some(list) = self.postings.get_mut(term) {
                list.retain(|p| p.doc_id != *doc_id);
                if list.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        Ok(indexed)
    }

    pub fn get(&self, doc_id: &DocId) -> Option<&IndexedDoc> { self.docs.get(doc_id) }

    pub fn contains(&self, doc_id: &DocId) -> bool { self.docs.contains_key(doc_id) }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Union of documents with a posting for any of `terms`, in doc-id order.
    pub fn candidates<'a, I>(&self, terms: I) -> BTreeSet<DocId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        terms.into_iter().flat_map(|t| self.postings(t).iter().map(|p| p.doc_id)).collect()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> { self.docs.values().map(|d| &d.doc) }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn num_postings(&self) -> usize { self.postings.values().map(Vec::len).sum() }
}
