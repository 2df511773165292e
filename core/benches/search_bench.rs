use criterion::{black_box, criterion_group, criterion_main, Criterion};
use forum_search_core::{Document, FixedClock, ScoreConfig, SearchEngine};
use std::sync::Arc;
use time::macros::datetime;
use time::Duration;

const WORDS: &[&str] = &[
    "rust", "async", "tokio", "borrow", "checker", "lifetime", "trait", "generic", "macro", "serde",
    "router", "react", "hooks", "state", "render", "compile", "error", "cargo", "crate", "module",
];

fn corpus(n: u64) -> Vec<Document> {
    let now = datetime!(2024-06-01 0:00 UTC);
    (0..n)
        .map(|i| {
            let word = |k: u64| WORDS[((i * 7 + k * 13) % WORDS.len() as u64) as usize];
            Document::Post {
                id: i,
                thread_id: i / 10,
                title: format!("{} {} {}", word(0), word(1), word(2)),
                content: (0..40).map(word).collect::<Vec<_>>().join(" "),
                upvote_count: (i % 50) as u32,
                created_at: now - Duration::days((i % 365) as i64),
            }
        })
        .collect()
}

fn bench_search(c: &mut Criterion) {
    let engine = SearchEngine::new(Arc::new(ScoreConfig::default()), Arc::new(FixedClock(datetime!(2024-06-01 0:00 UTC))));
    engine.index_all(corpus(5_000));
    c.bench_function("search_terms", |b| b.iter(|| engine.search(black_box("borrow checker lifetime"), None, 0)));
    c.bench_function("search_phrase", |b| b.iter(|| engine.search(black_box(r#""react router" hooks"#), None, 0)));
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
