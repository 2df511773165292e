use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{Result, SearchError};
use crate::tokenizer::Tokenizer;

const PHRASE_DELIMITER: char = '"';

/// Parsed query: every term in query order plus the quoted phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    /// Query terms in order, duplicates kept. Phrase terms are included.
    pub terms: Vec<String>,
    /// Distinct phrases of two or more terms, first occurrence first.
    pub phrases: Vec<Vec<String>>,
    /// Set when a dangling quote was read as a literal.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recovered_quote: bool,
}

impl QueryPlan {
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    /// Distinct terms in first-seen order.
    pub fn distinct_terms(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.terms.iter().map(String::as_str).filter(|t| seen.insert(*t)).collect()
    }

    /// Every term the candidate lookup must cover: query terms and phrase terms.
    pub fn lookup_terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().chain(self.phrases.iter().flatten()).map(String::as_str)
    }
}

/// Parse a raw query, rejecting a dangling phrase delimiter.
pub fn parse_strict(raw: &str, tokenizer: &Tokenizer) -> Result<QueryPlan> {
    let quotes: Vec<usize> = raw.match_indices(PHRASE_DELIMITER).map(|(i, _)| i).collect();
    if quotes.len() % 2 == 1 {
        return Err(SearchError::InvalidQuery { position: quotes[quotes.len() - 1] });
    }
    Ok(build_plan(raw, &quotes, tokenizer))
}

/// Parse a raw query. A dangling delimiter is read as a literal character,
/// which the tokenizer then treats as a separator.
pub fn parse(raw: &str, tokenizer: &Tokenizer) -> QueryPlan {
    match parse_strict(raw, tokenizer) {
        Ok(plan) => plan,
        Err(err) => {
            tracing::warn!(%err, "recovering from malformed query");
            let mut quotes: Vec<usize> = raw.match_indices(PHRASE_DELIMITER).map(|(i, _)| i).collect();
            quotes.pop();
            let mut plan = build_plan(raw, &quotes, tokenizer);
            plan.recovered_quote = true;
            plan
        }
    }
}

/// `quotes` holds the byte offsets of paired delimiters, open/close alternating.
fn build_plan(raw: &str, quotes: &[usize], tokenizer: &Tokenizer) -> QueryPlan {
    let mut plan = QueryPlan::default();
    let mut cursor = 0;
    for pair in quotes.chunks_exact(2) {
        let (open, close) = (pair[0], pair[1]);
        plan.terms.extend(tokenizer.terms(&raw[cursor..open]));
        let quoted = tokenizer.terms(&raw[open + 1..close]);
        if quoted.len() >= 2 && !plan.phrases.contains(&quoted) {
            plan.phrases.push(quoted.clone());
        }
        plan.terms.extend(quoted);
        cursor = close + 1;
    }
    plan.terms.extend(tokenizer.terms(&raw[cursor..]));
    plan
}
