use serde::{Deserialize, Serialize};

/// A comment on a question's discussion thread. Comments are the one
/// resource guests can create and own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// The question (discussion thread) this comment belongs to.
    pub question_id: String,

    pub comment_text: String,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// An answer choice with its durable vote counter. The counter is the
/// authoritative vote state; client-held vote records are advisory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,

    pub question_id: String,

    pub answer_text: String,

    pub votes: i64,

    pub created_at: String,
}
