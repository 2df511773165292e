//! Lexical search and relevance ranking for forum threads, posts and replies.

pub mod clock;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod scoring;
pub mod snippet;
pub mod tokenizer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ScoreConfig;
pub use document::{DocId, DocType, Document, Field, FieldKind, Projection};
pub use engine::{ScoredResult, SearchEngine, SearchPage};
pub use error::SearchError;
pub use index::{IndexedDoc, InvertedIndex, Posting};
pub use query::QueryPlan;
pub use scoring::{ScoreBreakdown, Scorer};
pub use tokenizer::{Token, Tokenizer};
