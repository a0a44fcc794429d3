use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use polls_core::{new_id, now_rfc3339};

use crate::model::{Account, Answer, AuthProvider, Comment, NewAccount};
use crate::store::{AccountStore, EntityStore, StoreError};

/// SQLite-backed implementation of both storage collaborators.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(storage_err)?;

        // WAL for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(storage_err)?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS accounts (
                id            TEXT PRIMARY KEY,
                email         TEXT NOT NULL UNIQUE,
                username      TEXT NOT NULL,
                secret        TEXT NOT NULL,
                auth_provider TEXT NOT NULL,
                is_active     INTEGER NOT NULL DEFAULT 0,
                is_staff      INTEGER NOT NULL DEFAULT 0,
                created_at    TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS comments (
                id           TEXT PRIMARY KEY,
                question_id  TEXT NOT NULL,
                comment_text TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_comments_question ON comments (question_id);
            CREATE TABLE IF NOT EXISTS answers (
                id          TEXT PRIMARY KEY,
                question_id TEXT NOT NULL,
                answer_text TEXT NOT NULL,
                votes       INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS account_votes (
                account_id TEXT NOT NULL,
                answer_id  TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (account_id, answer_id)
            );",
        )
        .map_err(storage_err)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}

fn storage_err(e: rusqlite::Error) -> StoreError {
    StoreError::Storage(e.to_string())
}

fn row_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let provider: String = row.get("auth_provider")?;
    Ok(Account {
        id: row.get("id")?,
        email: row.get("email")?,
        username: row.get("username")?,
        secret: row.get("secret")?,
        // Unknown strings can only come from out-of-band edits; treat them
        // as local accounts rather than failing the whole lookup.
        auth_provider: AuthProvider::parse(&provider).unwrap_or(AuthProvider::AppAuth),
        is_active: row.get::<_, i64>("is_active")? != 0,
        is_staff: row.get::<_, i64>("is_staff")? != 0,
        created_at: row.get("created_at")?,
    })
}

fn row_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        question_id: row.get("question_id")?,
        comment_text: row.get("comment_text")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl AccountStore for SqliteStore {
    fn insert_if_absent(&self, new: NewAccount) -> Result<Option<Account>, StoreError> {
        let account = Account {
            id: new_id(),
            email: new.email,
            username: new.username,
            secret: new.secret,
            auth_provider: new.auth_provider,
            is_active: new.is_active,
            is_staff: false,
            created_at: now_rfc3339(),
        };

        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO accounts (id, email, username, secret, auth_provider, is_active, is_staff, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                account.id,
                account.email,
                account.username,
                account.secret,
                account.auth_provider.as_str(),
                account.is_active as i64,
                account.is_staff as i64,
                account.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(Some(account)),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(None)
            }
            Err(e) => Err(storage_err(e)),
        }
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT * FROM accounts WHERE email = ?1",
            params![email],
            row_account,
        )
        .optional()
        .map_err(storage_err)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT * FROM accounts WHERE id = ?1",
            params![id],
            row_account,
        )
        .optional()
        .map_err(storage_err)
    }

    fn set_active(&self, id: &str, active: bool) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE accounts SET is_active = ?1 WHERE id = ?2",
            params![active as i64, id],
        )
        .map_err(storage_err)?;
        Ok(())
    }
}

impl EntityStore for SqliteStore {
    fn create_comment(&self, question_id: &str, text: &str) -> Result<Comment, StoreError> {
        let now = now_rfc3339();
        let comment = Comment {
            id: new_id(),
            question_id: question_id.to_string(),
            comment_text: text.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO comments (id, question_id, comment_text, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id,
                comment.question_id,
                comment.comment_text,
                comment.created_at,
                comment.updated_at,
            ],
        )
        .map_err(storage_err)?;

        Ok(comment)
    }

    fn get_comment(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT * FROM comments WHERE id = ?1",
            params![id],
            row_comment,
        )
        .optional()
        .map_err(storage_err)
    }

    fn update_comment_text(&self, id: &str, text: &str) -> Result<Option<Comment>, StoreError> {
        {
            let conn = self.lock()?;
            let affected = conn
                .execute(
                    "UPDATE comments SET comment_text = ?1, updated_at = ?2 WHERE id = ?3",
                    params![text, now_rfc3339(), id],
                )
                .map_err(storage_err)?;
            if affected == 0 {
                return Ok(None);
            }
        }
        self.get_comment(id)
    }

    fn delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])
            .map_err(storage_err)?;
        Ok(affected > 0)
    }

    fn create_answer(&self, question_id: &str, text: &str) -> Result<Answer, StoreError> {
        let answer = Answer {
            id: new_id(),
            question_id: question_id.to_string(),
            answer_text: text.to_string(),
            votes: 0,
            created_at: now_rfc3339(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO answers (id, question_id, answer_text, votes, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![answer.id, answer.question_id, answer.answer_text, answer.created_at],
        )
        .map_err(storage_err)?;

        Ok(answer)
    }

    fn increment_vote(&self, answer_id: &str) -> Result<Option<i64>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "UPDATE answers SET votes = votes + 1 WHERE id = ?1 RETURNING votes",
            params![answer_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(storage_err)
    }

    fn record_account_vote(&self, account_id: &str, answer_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "INSERT OR IGNORE INTO account_votes (account_id, answer_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![account_id, answer_id, now_rfc3339()],
            )
            .map_err(storage_err)?;
        Ok(affected > 0)
    }
}
