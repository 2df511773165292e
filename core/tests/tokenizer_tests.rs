use forum_search_core::tokenizer::Tokenizer;
use forum_search_core::{Field, ScoreConfig};

#[test]
fn it_normalizes_and_splits_on_punctuation() {
    let toks = Tokenizer::default().tokenize("Café-Menu: ＲＵＳＴ's (borrow_checker)!", Field::Content);
    let words: Vec<String> = toks.into_iter().map(|t| t.term).collect();
    // NFKC folds full-width letters, apostrophes and underscores separate words
    assert_eq!(words, vec!["café", "menu", "rust", "borrow", "checker"]);
}

#[test]
fn it_filters_stopwords() {
    let toks = Tokenizer::default().terms("The quick brown fox and the lazy dog");
    assert!(!toks.contains(&"the".to_string()));
    assert!(!toks.contains(&"and".to_string()));
    assert_eq!(toks.len(), 5);
}

#[test]
fn it_uses_configured_stopwords() {
    let config = ScoreConfig { stopwords: ["rust".to_string()].into_iter().collect(), ..ScoreConfig::default() };
    let toks = Tokenizer::new(&config).terms("the rust book");
    assert_eq!(toks, vec!["the", "book"]);
}

#[test]
fn empty_input_yields_no_tokens() {
    let tokenizer = Tokenizer::default();
    assert!(tokenizer.tokenize("", Field::Title).is_empty());
    assert!(tokenizer.tokenize(" \t\n ", Field::Title).is_empty());
    assert!(tokenizer.tokenize("?!... --", Field::Title).is_empty());
}

#[test]
fn offsets_point_into_the_source_text() {
    let text = "  Ünïcode   naïve façade ";
    for tok in Tokenizer::default().tokenize(text, Field::Content) {
        let source = &text[tok.offset..tok.end()];
        assert_eq!(source.to_lowercase(), tok.term);
    }
}

#[test]
fn keeps_digits_and_non_latin_scripts() {
    let toks = Tokenizer::default().terms("Rust 2024 edition привет 東京");
    assert_eq!(toks, vec!["rust", "2024", "edition", "привет", "東京"]);
}

#[test]
fn is_deterministic() {
    let tokenizer = Tokenizer::default();
    let text = "Posts about async Rust, tokio and hyper.";
    assert_eq!(tokenizer.tokenize(text, Field::Content), tokenizer.tokenize(text, Field::Content));
}
