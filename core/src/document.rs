use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use crate::config::ScoreConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Thread,
    Post,
    Reply,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Thread => "thread",
            DocType::Post => "post",
            DocType::Reply => "reply",
        }
    }
}

/// Engine-wide document identity. Ordered by type first, then by source id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId {
    pub doc_type: DocType,
    pub id: u64,
}

impl DocId {
    pub fn new(doc_type: DocType, id: u64) -> Self { Self { doc_type, id } }
    pub fn thread(id: u64) -> Self { Self::new(DocType::Thread, id) }
    pub fn post(id: u64) -> Self { Self::new(DocType::Post, id) }
    pub fn reply(id: u64) -> Self { Self::new(DocType::Reply, id) }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.doc_type.as_str(), self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Description,
    Title,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Title,
    Body,
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Name | Field::Title => FieldKind::Title,
            Field::Description | Field::Content => FieldKind::Body,
        }
    }

    pub fn weight(&self, config: &ScoreConfig) -> f64 {
        match self.kind() {
            FieldKind::Title => config.title_weight,
            FieldKind::Body => config.content_weight,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::Title => "title",
            Field::Content => "content",
        }
    }
}

/// A searchable snapshot handed over by the forum data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Document {
    Thread {
        id: u64,
        name: String,
        #[serde(default)]
        description: String,
    },
    Post {
        id: u64,
        thread_id: u64,
        title: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        upvote_count: u32,
        #[serde(with = "time::serde::rfc3339")]
        created_at: OffsetDateTime,
    },
    Reply {
        id: u64,
        post_id: u64,
        content: String,
        #[serde(default)]
        upvote_count: u32,
        #[serde(with = "time::serde::rfc3339")]
        created_at: OffsetDateTime,
    },
}

/// A field of a projected document, with its weight already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedField<'a> {
    pub field: Field,
    pub text: &'a str,
    pub weight: f64,
}

/// Uniform view over the three document variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection<'a> {
    pub doc_id: DocId,
    pub doc_type: DocType,
    pub fields: Vec<ProjectedField<'a>>,
    pub upvote_count: u32,
    pub created_at: Option<OffsetDateTime>,
}

impl Document {
    pub fn doc_id(&self) -> DocId {
        match self {
            Document::Thread { id, .. } => DocId::thread(*id),
            Document::Post { id, .. } => DocId::post(*id),
            Document::Reply { id, .. } => DocId::reply(*id),
        }
    }

    pub fn doc_type(&self) -> DocType { self.doc_id().doc_type }

    /// Searchable fields in display order: title-like field first.
    pub fn fields(&self) -> Vec<(Field, &str)> {
        match self {
            Document::Thread { name, description, .. } => vec![(Field::Name, name.as_str()), (Field::Description, description.as_str())],
            Document::Post { title, content, .. } => vec![(Field::Title, title.as_str()), (Field::Content, content.as_str())],
            Document::Reply { content, .. } => vec![(Field::Content, content.as_str())],
        }
    }

    pub fn upvote_count(&self) -> u32 {
        match self {
            Document::Thread { .. } => 0,
            Document::Post { upvote_count, .. } | Document::Reply { upvote_count, .. } => *upvote_count,
        }
    }

    pub fn created_at(&self) -> Option<OffsetDateTime> {
        match self {
            Document::Thread { .. } => None,
            Document::Post { created_at, .. } | Document::Reply { created_at, .. } => Some(*created_at),
        }
    }

    pub fn project(&self, config: &ScoreConfig) -> Projection<'_> {
        let doc_id = self.doc_id();
        Projection {
            doc_id,
            doc_type: doc_id.doc_type,
            fields: self
                .fields()
                .into_iter()
                .map(|(field, text)| ProjectedField { field, text, weight: field.weight(config) })
                .collect(),
            upvote_count: self.upvote_count(),
            created_at: self.created_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn ids_do_not_collide_across_types() {
        assert_ne!(DocId::thread(1), DocId::post(1));
        assert!(DocId::thread(9) < DocId::post(1));
        assert!(DocId::post(1) < DocId::post(2));
        assert_eq!(DocId::reply(7).to_string(), "reply:7");
    }

    #[test]
    fn projection_resolves_weights() {
        let config = ScoreConfig::default();
        let doc = Document::Post {
            id: 3,
            thread_id: 1,
            title: "hello".into(),
            content: "world".into(),
            upvote_count: 4,
            created_at: datetime!(2024-01-01 0:00 UTC),
        };
        let p = doc.project(&config);
        assert_eq!(p.doc_type, DocType::Post);
        assert_eq!(p.fields[0].weight, config.title_weight);
        assert_eq!(p.fields[1].weight, config.content_weight);
        assert_eq!(p.upvote_count, 4);
    }

    #[test]
    fn deserializes_tagged_json() {
        let json = r#"{"type":"reply","id":5,"post_id":2,"content":"nice","upvote_count":1,"created_at":"2024-03-01T12:00:00Z"}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.doc_id(), DocId::reply(5));
        assert_eq!(doc.created_at(), Some(datetime!(2024-03-01 12:00 UTC)));

        let thread: Document = serde_json::from_str(r#"{"type":"thread","id":1,"name":"General"}"#).unwrap();
        assert_eq!(thread.upvote_count(), 0);
        assert_eq!(thread.created_at(), None);
    }
}
