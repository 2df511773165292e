use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::{Result, SearchError};
use crate::tokenizer::DEFAULT_STOPWORDS;

/// Ranking knobs. Built once at startup, then shared read-only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreConfig {
    pub title_weight: f64,
    pub content_weight: f64,
    pub upvote_boost: f64,
    /// Per-day exponent of the recency decay.
    pub recency_decay: f64,
    pub phrase_boost: f64,
    pub proximity_boost: f64,
    /// Largest position distance that still earns a proximity bonus.
    pub proximity_window: u32,
    /// Maximum visible characters in a snippet.
    pub snippet_length: usize,
    pub stopwords: BTreeSet<String>,
    pub stemming: bool,
    pub default_limit: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            title_weight: 3.0,
            content_weight: 1.0,
            upvote_boost: 0.05,
            recency_decay: 0.01,
            phrase_boost: 2.0,
            proximity_boost: 1.0,
            proximity_window: 5,
            snippet_length: 160,
            stopwords: DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            stemming: false,
            default_limit: 20,
        }
    }
}

const MIN_SNIPPET_LENGTH: usize = 16;

impl ScoreConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ScoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SearchError::ConfigRead { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("title_weight", self.title_weight),
            ("content_weight", self.content_weight),
            ("upvote_boost", self.upvote_boost),
            ("recency_decay", self.recency_decay),
            ("phrase_boost", self.phrase_boost),
            ("proximity_boost", self.proximity_boost),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(SearchError::Configuration { field, reason: format!("must be a finite non-negative number, got {value}") });
            }
        }
        if self.proximity_window == 0 {
            return Err(SearchError::Configuration { field: "proximity_window", reason: "must be at least 1".into() });
        }
        if self.snippet_length < MIN_SNIPPET_LENGTH {
            return Err(SearchError::Configuration {
                field: "snippet_length",
                reason: format!("must be at least {MIN_SNIPPET_LENGTH}, got {}", self.snippet_length),
            });
        }
        if self.default_limit == 0 {
            return Err(SearchError::Configuration { field: "default_limit", reason: "must be at least 1".into() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ScoreConfig::default().validate().unwrap();
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = ScoreConfig::from_json(r#"{"title_weight": 5.0, "stopwords": ["foo"]}"#).unwrap();
        assert_eq!(config.title_weight, 5.0);
        assert_eq!(config.content_weight, 1.0);
        assert!(config.stopwords.contains("foo"));
        assert!(!config.stopwords.contains("the"));
    }

    #[test]
    fn rejects_negative_weight() {
        let err = ScoreConfig::from_json(r#"{"phrase_boost": -1}"#).unwrap_err();
        assert!(matches!(err, SearchError::Configuration { field: "phrase_boost", .. }));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_json() {
        assert!(matches!(ScoreConfig::from_json(r#"{"title_wieght": 2}"#), Err(SearchError::ConfigParse(_))));
        assert!(matches!(ScoreConfig::from_json("{"), Err(SearchError::ConfigParse(_))));
    }

    #[test]
    fn rejects_tiny_snippets() {
        let err = ScoreConfig::from_json(r#"{"snippet_length": 3}"#).unwrap_err();
        assert!(matches!(err, SearchError::Configuration { field: "snippet_length", .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ScoreConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SearchError::ConfigRead { .. }));
    }
}
