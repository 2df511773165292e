use std::collections::BTreeSet;
use std::iter::once;

use crate::config::ScoreConfig;
use crate::document::FieldKind;
use crate::index::{FieldEntry, IndexedDoc};
use crate::query::QueryPlan;
use crate::scoring::phrase_starts;

pub const HIGHLIGHT_START: &str = "<em>";
pub const HIGHLIGHT_END: &str = "</em>";
pub const ELLIPSIS: &str = "…";

/// Char-indexed view of a field's text.
struct CharText<'a> {
    text: &'a str,
    chars: Vec<char>,
    bounds: Vec<usize>, // byte offset of each char, plus text.len()
}

impl<'a> CharText<'a> {
    fn new(text: &'a str) -> Self {
        let chars = text.chars().collect();
        let bounds = text.char_indices().map(|(i, _)| i).chain(once(text.len())).collect();
        Self { text, chars, bounds }
    }

    fn len(&self) -> usize { self.chars.len() }

    fn char_at_byte(&self, byte: usize) -> usize {
        match self.bounds.binary_search(&byte) {
            Ok(i) | Err(i) => i,
        }
    }

    fn slice(&self, start: usize, end: usize) -> &'a str { &self.text[self.bounds[start]..self.bounds[end]] }

    fn is_space(&self, i: usize) -> bool { self.chars[i].is_whitespace() }
}

/// Match layout of one field.
struct FieldMatches<'a> {
    order: usize,
    kind: FieldKind,
    text: CharText<'a>,
    covers_query: bool,
    /// Every quoted phrase occurs in this field.
    phrases_found: bool,
    /// Term and phrase matches as char ranges, unsorted.
    highlights: Vec<(usize, usize)>,
    /// Matches in the densest window and the char range they cover.
    density: usize,
    cluster: (usize, usize),
}

impl<'a> FieldMatches<'a> {
    fn new(order: usize, entry: &FieldEntry, text: &'a str, plan: &QueryPlan, wanted: &BTreeSet<&str>, window: usize) -> Self {
        let text = CharText::new(text);
        let terms: Vec<(usize, usize)> = entry
            .tokens
            .iter()
            .filter(|t| wanted.contains(t.term.as_str()))
            .map(|t| (text.char_at_byte(t.offset), text.char_at_byte(t.end())))
            .collect();
        let mut highlights = terms.clone();
        let mut phrases_found = true;
        for phrase in &plan.phrases {
            let starts = phrase_starts(entry, phrase);
            phrases_found &= !starts.is_empty();
            for start in starts {
                let first = &entry.tokens[start as usize];
                let last = &entry.tokens[start as usize + phrase.len() - 1];
                highlights.push((text.char_at_byte(first.offset), text.char_at_byte(last.end())));
            }
        }
        let (density, cluster) = densest_window(&terms, window);
        Self {
            order,
            kind: entry.field.kind(),
            covers_query: phrases_found && wanted.iter().all(|t| entry.contains(t)),
            phrases_found,
            text,
            highlights,
            density,
            cluster,
        }
    }
}

/// Slides a `window`-char frame over ascending match ranges. Returns the
/// best match count and the char range spanned by those matches.
fn densest_window(spans: &[(usize, usize)], window: usize) -> (usize, (usize, usize)) {
    let mut best = (0, (0, 0));
    for (i, &(start, end)) in spans.iter().enumerate() {
        let limit = start + window;
        let inside: Vec<usize> = spans[i..].iter().take_while(|s| s.0 < limit).filter(|s| s.1 <= limit).map(|s| s.1).collect();
        let count = inside.len().max(1);
        let cluster_end = inside.into_iter().max().unwrap_or(end).min(limit);
        if count > best.0 {
            best = (count, (start, cluster_end));
        }
    }
    best
}

/// Builds a highlighted excerpt of at most `snippet_length` visible characters.
pub fn generate_snippet(doc: &IndexedDoc, plan: &QueryPlan, config: &ScoreConfig) -> String {
    let window = config.snippet_length;
    let wanted: BTreeSet<&str> = plan.terms.iter().map(String::as_str).collect();
    let fields: Vec<FieldMatches> = doc
        .field_texts()
        .into_iter()
        .enumerate()
        .map(|(order, (entry, text))| FieldMatches::new(order, entry, text, plan, &wanted, window))
        .collect();

    let title_hit = fields.iter().find(|f| f.kind == FieldKind::Title && f.covers_query && f.density > 0);
    let best = title_hit.or_else(|| {
        fields
            .iter()
            .filter(|f| f.density > 0)
            .max_by(|a, b| {
                a.density
                    .cmp(&b.density)
                    .then_with(|| a.phrases_found.cmp(&b.phrases_found))
                    .then_with(|| (a.kind == FieldKind::Title).cmp(&(b.kind == FieldKind::Title)))
                    .then_with(|| b.order.cmp(&a.order))
            })
    });

    match best {
        Some(field) => render(&field.text, field.cluster, &field.highlights, window),
        None => match fields.iter().find(|f| !f.text.text.trim().is_empty()) {
            Some(field) => render(&field.text, (0, 0), &[], window),
            None => String::new(),
        },
    }
}

fn render(text: &CharText, cluster: (usize, usize), highlights: &[(usize, usize)], window: usize) -> String {
    let n = text.len();
    let (cs, ce) = cluster;
    let (mut ws, mut we) = (0, n);
    if n > window {
        let slack = window.saturating_sub(ce - cs);
        we = (cs.saturating_sub(slack / 2) + window).min(n);
        ws = we - window;
        // move cuts off mid-word positions without dropping a match
        if ws > 0 && !text.is_space(ws - 1) && !text.is_space(ws) {
            if let Some(k) = (ws..cs).find(|&k| text.is_space(k)) {
                ws = k + 1;
            }
        }
        if we < n && !text.is_space(we - 1) && !text.is_space(we) {
            if let Some(k) = (ce.max(ws)..we).rev().find(|&k| text.is_space(k)) {
                we = k;
            }
        }
    }
    while ws < we && text.is_space(ws) {
        ws += 1;
    }
    while we > ws && text.is_space(we - 1) {
        we -= 1;
    }

    let mut spans: Vec<(usize, usize)> = highlights
        .iter()
        .map(|&(s, e)| (s.max(ws), e.min(we)))
        .filter(|(s, e)| s < e)
        .collect();
    spans.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (s, e) in spans {
        match merged.last_mut() {
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }

    let mut out = String::new();
    if (0..ws).any(|i| !text.is_space(i)) {
        out.push_str(ELLIPSIS);
    }
    let mut cursor = ws;
    for (s, e) in merged {
        out.push_str(text.slice(cursor, s));
        out.push_str(HIGHLIGHT_START);
        out.push_str(text.slice(s, e));
        out.push_str(HIGHLIGHT_END);
        cursor = e;
    }
    out.push_str(text.slice(cursor, we));
    if (we..n).any(|i| !text.is_space(i)) {
        out.push_str(ELLIPSIS);
    }
    out
}
