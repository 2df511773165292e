use criterion::{criterion_group, criterion_main, Criterion};
use forum_search_core::{Field, Tokenizer};

fn bench_tokenize(c: &mut Criterion) {
    let text = "Has anyone migrated a large Axum service to the new router API? \
                We keep hitting lifetime errors around State extractors, and the \
                borrow checker complains whenever a handler holds a MutexGuard across an await. "
        .repeat(50);
    let tokenizer = Tokenizer::default();
    c.bench_function("tokenize_post_body", |b| b.iter(|| tokenizer.tokenize(&text, Field::Content)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
