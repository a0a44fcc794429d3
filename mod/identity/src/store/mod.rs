//! Storage collaborator contracts.
//!
//! The identity protocol treats the entity store and account table as
//! external collaborators. Semantic outcomes (conflict, missing row,
//! already-voted) are encoded in return types; [`StoreError`] only carries
//! backend failures.

mod sqlite;

pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::model::{Account, Answer, Comment, NewAccount};

/// Storage backend failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage: {0}")]
    Storage(String),
}

/// Durable account records. Email is unique; the insert must be atomic
/// "insert if email absent" so concurrent first logins for the same new
/// identity resolve to exactly one row.
pub trait AccountStore: Send + Sync {
    /// Insert the account unless the email is taken.
    /// Returns `None` when another row already holds the email.
    fn insert_if_absent(&self, new: NewAccount) -> Result<Option<Account>, StoreError>;

    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError>;

    fn set_active(&self, id: &str, active: bool) -> Result<(), StoreError>;
}

/// The external CRUD entity store, reduced to the operations this
/// protocol layer needs: comment lifecycle for guest ownership and the
/// durable vote counter.
pub trait EntityStore: Send + Sync {
    fn create_comment(&self, question_id: &str, text: &str) -> Result<Comment, StoreError>;

    fn get_comment(&self, id: &str) -> Result<Option<Comment>, StoreError>;

    /// Returns the updated comment, or `None` when the row is gone.
    fn update_comment_text(&self, id: &str, text: &str) -> Result<Option<Comment>, StoreError>;

    /// Returns false when the row was already gone.
    fn delete_comment(&self, id: &str) -> Result<bool, StoreError>;

    fn create_answer(&self, question_id: &str, text: &str) -> Result<Answer, StoreError>;

    /// Atomic counter bump (`votes = votes + 1` at the storage layer,
    /// never read-then-write in application code). Returns the new count,
    /// or `None` when the answer does not exist.
    fn increment_vote(&self, answer_id: &str) -> Result<Option<i64>, StoreError>;

    /// Durable per-account vote record: insert if absent.
    /// Returns false when the account already voted on this answer.
    fn record_account_vote(&self, account_id: &str, answer_id: &str) -> Result<bool, StoreError>;
}
