use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

use crate::config::ScoreConfig;
use crate::document::Field;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}\p{M}]*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","cannot","could",
    "did","do","does","doing","down","during",
    "each","few","for","from","further",
    "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
    "i","if","in","into","is","it","its","itself",
    "me","more","most","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "s","same","she","should","so","some","such",
    "t","than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
    "under","until","up","very",
    "was","we","were","what","when","where","which","while","who","whom","why","with","would",
    "you","your","yours","yourself","yourselves",
];

/// One normalized word occurrence inside a document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub field: Field,
    /// Byte offset of the source word in the field text.
    pub offset: usize,
    /// Byte length of the source word in the field text.
    pub len: usize,
    /// Field-local ordinal among the tokens kept after stopword removal.
    pub position: u32,
}

impl Token {
    pub fn end(&self) -> usize { self.offset + self.len }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
    stemming: bool,
}

impl Tokenizer {
    pub fn new(config: &ScoreConfig) -> Self {
        Self { stopwords: config.stopwords.iter().cloned().collect(), stemming: config.stemming }
    }

    fn is_stopword(&self, word: &str) -> bool { self.stopwords.contains(word) }

    /// Yields (term, byte offset, byte len) for every kept word, in text order.
    fn words<'t>(&'t self, text: &'t str) -> impl Iterator<Item = (String, usize, usize)> + 't {
        RE.find_iter(text).filter_map(move |mat| {
            let word = mat.as_str().nfkc().collect::<String>().to_lowercase();
            if self.is_stopword(&word) { return None; }
            let term = if self.stemming { STEMMER.stem(&word).into_owned() } else { word };
            Some((term, mat.start(), mat.len()))
        })
    }

    /// Tokenize a field: NFKC, lowercase, stopword removal, optional stemming.
    pub fn tokenize(&self, text: &str, field: Field) -> Vec<Token> {
        self.words(text)
            .enumerate()
            .map(|(pos, (term, offset, len))| Token { term, field, offset, len, position: pos as u32 })
            .collect()
    }

    /// Same normalization as `tokenize`, without positional data.
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.words(text).map(|(term, _, _)| term).collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self { Self::new(&ScoreConfig::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = Tokenizer::default().tokenize("Hello, World! (again)", Field::Content);
        let words: Vec<&str> = t.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(words, vec!["hello", "world"]);
        assert_eq!(t[1].offset, 7);
        assert_eq!(t[1].len, 5);
        assert_eq!(t[1].position, 1);
    }

    #[test]
    fn positions_skip_stopwords() {
        let t = Tokenizer::default().tokenize("guide to the routing", Field::Title);
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].position, 0);
        assert_eq!(t[1].position, 1);
        assert_eq!(t[1].term, "routing");
    }

    #[test]
    fn stemming_is_opt_in() {
        let plain = Tokenizer::default().terms("running");
        assert_eq!(plain, vec!["running"]);
        let config = ScoreConfig { stemming: true, ..ScoreConfig::default() };
        assert_eq!(Tokenizer::new(&config).terms("running"), vec!["run"]);
    }
}
