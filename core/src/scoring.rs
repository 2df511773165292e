//! Composite relevance scoring.
//!
//! ```text
//! score = (term + phrase + proximity) * exp(-recency_decay * age_days)
//!       + upvote_count * upvote_boost
//! ```
//!
//! A document with neither a term match nor a phrase match scores exactly zero,
//! whatever its upvotes. Upvotes are added after decay so old but popular
//! content keeps a floor.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use time::OffsetDateTime;

use crate::config::ScoreConfig;
use crate::index::{FieldEntry, IndexedDoc};
use crate::query::QueryPlan;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Per-component view of a score, for `--explain` style output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Some query term or phrase occurs in the text, whatever the weights.
    pub matched: bool,
    pub term: f64,
    pub phrase: f64,
    pub proximity: f64,
    /// Multiplier applied to the textual part, in `(0, 1]`.
    pub decay: f64,
    pub upvote: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn is_match(&self) -> bool { self.matched }
}

pub struct Scorer<'a> {
    config: &'a ScoreConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a ScoreConfig) -> Self { Self { config } }

    pub fn score(&self, doc: &IndexedDoc, plan: &QueryPlan, now: OffsetDateTime) -> f64 {
        self.explain(doc, plan, now).total
    }

    pub fn explain(&self, doc: &IndexedDoc, plan: &QueryPlan, now: OffsetDateTime) -> ScoreBreakdown {
        let term = self.term_score(doc, plan);
        let (phrase, satisfied) = self.phrase_score(doc, plan);
        let term_hit = plan.terms.iter().any(|t| doc.fields.iter().any(|entry| entry.contains(t)));
        if !term_hit && satisfied.is_empty() {
            return ScoreBreakdown::default();
        }
        let proximity = self.proximity_score(doc, plan, &satisfied);
        let decay = self.decay(doc.doc.created_at(), now);
        let upvote = f64::from(doc.doc.upvote_count()) * self.config.upvote_boost;
        let total = (term + phrase + proximity) * decay + upvote;
        ScoreBreakdown { matched: true, term, phrase, proximity, decay, upvote, total }
    }

    fn term_score(&self, doc: &IndexedDoc, plan: &QueryPlan) -> f64 {
        let mut score = 0.0;
        for term in &plan.terms {
            for entry in &doc.fields {
                score += f64::from(entry.term_frequency(term)) * entry.field.weight(self.config);
            }
        }
        score
    }

    /// Returns the phrase score and the terms of phrases found at least once.
    fn phrase_score<'p>(&self, doc: &IndexedDoc, plan: &'p QueryPlan) -> (f64, BTreeSet<&'p str>) {
        let mut score = 0.0;
        let mut satisfied = BTreeSet::new();
        for phrase in &plan.phrases {
            let hits: usize = doc.fields.iter().map(|entry| phrase_starts(entry, phrase).len()).sum();
            if hits > 0 {
                score += hits as f64 * self.config.phrase_boost;
                satisfied.extend(phrase.iter().map(String::as_str));
            }
        }
        (score, satisfied)
    }

    fn proximity_score(&self, doc: &IndexedDoc, plan: &QueryPlan, satisfied: &BTreeSet<&str>) -> f64 {
        let loose: Vec<&str> = plan.distinct_terms().into_iter().filter(|t| !satisfied.contains(t)).collect();
        if loose.len() < 2 {
            return 0.0;
        }
        let window = self.config.proximity_window;
        let mut score = 0.0;
        for entry in &doc.fields {
            for (i, a) in loose.iter().enumerate() {
                for b in &loose[i + 1..] {
                    if let Some(d) = min_distance(entry.positions(a), entry.positions(b)) {
                        if (1..=window).contains(&d) {
                            score += self.config.proximity_boost / f64::from(d);
                        }
                    }
                }
            }
        }
        score
    }

    fn decay(&self, created_at: Option<OffsetDateTime>, now: OffsetDateTime) -> f64 {
        let Some(created_at) = created_at else { return 1.0 };
        let age_days = ((now - created_at).as_seconds_f64() / SECONDS_PER_DAY).max(0.0);
        (-self.config.recency_decay * age_days).exp()
    }
}

/// Positions in `entry` where `phrase` starts as a contiguous run.
pub fn phrase_starts(entry: &FieldEntry, phrase: &[String]) -> Vec<u32> {
    let Some((first, rest)) = phrase.split_first() else { return Vec::new() };
    entry
        .positions(first)
        .iter()
        .copied()
        .filter(|&start| {
            rest.iter()
                .enumerate()
                .all(|(i, term)| entry.positions(term).binary_search(&(start + i as u32 + 1)).is_ok())
        })
        .collect()
}

/// Smallest gap between two ascending position lists.
fn min_distance(a: &[u32], b: &[u32]) -> Option<u32> {
    let (mut i, mut j) = (0, 0);
    let mut best: Option<u32> = None;
    while i < a.len() && j < b.len() {
        let d = a[i].abs_diff(b[j]);
        best = Some(best.map_or(d, |cur| cur.min(d)));
        if a[i] < b[j] { i += 1 } else { j += 1 }
    }
    best
}

/// Ranking order: score desc, upvotes desc, newer first, then lower doc id.
pub fn rank_order(a_score: f64, a: &IndexedDoc, b_score: f64, b: &IndexedDoc) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| b.doc.upvote_count().cmp(&a.doc.upvote_count()))
        .then_with(|| b.doc.created_at().cmp(&a.doc.created_at()))
        .then_with(|| a.doc_id().cmp(&b.doc_id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::query::parse;
    use crate::tokenizer::Tokenizer;
    use time::macros::datetime;
    use time::Duration;

    const NOW: OffsetDateTime = datetime!(2024-06-01 0:00 UTC);

    fn post(id: u64, title: &str, content: &str, upvotes: u32, age_days: i64) -> IndexedDoc {
        let doc = Document::Post {
            id,
            thread_id: 1,
            title: title.into(),
            content: content.into(),
            upvote_count: upvotes,
            created_at: NOW - Duration::days(age_days),
        };
        IndexedDoc::analyze(doc, &Tokenizer::default())
    }

    fn config() -> ScoreConfig {
        ScoreConfig { recency_decay: 0.0, upvote_boost: 0.0, ..ScoreConfig::default() }
    }

    #[test]
    fn term_score_weights_fields() {
        let config = config();
        let scorer = Scorer::new(&config);
        let plan = parse("rust", &Tokenizer::default());
        let b = scorer.explain(&post(1, "rust", "rust rust", 0, 0), &plan, NOW);
        assert_eq!(b.term, config.title_weight + 2.0 * config.content_weight);
        assert_eq!(b.phrase, 0.0);
        assert_eq!(b.total, b.term);
    }

    #[test]
    fn duplicate_query_terms_count_twice() {
        let config = config();
        let scorer = Scorer::new(&config);
        let doc = post(1, "", "rust", 0, 0);
        let once = scorer.score(&doc, &parse("rust", &Tokenizer::default()), NOW);
        let twice = scorer.score(&doc, &parse("rust rust", &Tokenizer::default()), NOW);
        assert_eq!(twice, 2.0 * once);
    }

    #[test]
    fn phrase_occurrences_each_add_boost() {
        let config = config();
        let scorer = Scorer::new(&config);
        let plan = parse(r#""react router""#, &Tokenizer::default());
        let b = scorer.explain(&post(1, "react router", "react router and react router", 0, 0), &plan, NOW);
        assert_eq!(b.phrase, 3.0 * config.phrase_boost);
        assert_eq!(b.proximity, 0.0);
    }

    #[test]
    fn proximity_scales_with_distance() {
        let config = config();
        let scorer = Scorer::new(&config);
        let plan = parse("react router", &Tokenizer::default());
        let near = scorer.explain(&post(1, "", "react router", 0, 0), &plan, NOW);
        let gap = scorer.explain(&post(2, "", "react fast small router", 0, 0), &plan, NOW);
        let far = scorer.explain(&post(3, "", "react one two three four five six router", 0, 0), &plan, NOW);
        assert_eq!(near.proximity, config.proximity_boost);
        assert_eq!(gap.proximity, config.proximity_boost / 3.0);
        assert_eq!(far.proximity, 0.0);
    }

    #[test]
    fn zero_match_scores_zero_despite_upvotes() {
        let config = ScoreConfig::default();
        let scorer = Scorer::new(&config);
        let plan = parse("kotlin", &Tokenizer::default());
        let b = scorer.explain(&post(1, "rust", "rust", 1_000, 0), &plan, NOW);
        assert_eq!(b.total, 0.0);
        assert!(!b.is_match());
    }

    #[test]
    fn zero_weight_match_still_earns_upvotes() {
        let config = ScoreConfig { title_weight: 0.0, upvote_boost: 1.0, ..ScoreConfig::default() };
        config.validate().unwrap();
        let scorer = Scorer::new(&config);
        let plan = parse("kotlin", &Tokenizer::default());
        let b = scorer.explain(&post(1, "kotlin coroutines", "", 100, 0), &plan, NOW);
        assert!(b.is_match());
        assert_eq!(b.term, 0.0);
        assert_eq!(b.total, 100.0);
    }

    #[test]
    fn decay_applies_before_upvotes() {
        let config = ScoreConfig { recency_decay: 0.1, upvote_boost: 1.0, ..ScoreConfig::default() };
        let scorer = Scorer::new(&config);
        let plan = parse("rust", &Tokenizer::default());
        let b = scorer.explain(&post(1, "", "rust", 3, 10), &plan, NOW);
        assert!((b.decay - (-1.0f64).exp()).abs() < 1e-12);
        assert!((b.total - (config.content_weight * b.decay + 3.0)).abs() < 1e-12);
    }

    #[test]
    fn future_documents_do_not_gain() {
        let config = ScoreConfig::default();
        let scorer = Scorer::new(&config);
        let plan = parse("rust", &Tokenizer::default());
        let b = scorer.explain(&post(1, "", "rust", 0, -5), &plan, NOW);
        assert_eq!(b.decay, 1.0);
    }

    #[test]
    fn phrase_starts_requires_contiguity() {
        let doc = post(1, "", "router react router", 0, 0);
        let phrase = vec!["react".to_string(), "router".to_string()];
        assert_eq!(phrase_starts(&doc.fields[1], &phrase), vec![1]);
        assert!(phrase_starts(&doc.fields[0], &phrase).is_empty());
    }

    #[test]
    fn min_distance_walks_both_lists() {
        assert_eq!(min_distance(&[0, 10], &[4, 12]), Some(2));
        assert_eq!(min_distance(&[], &[1]), None);
    }
}
