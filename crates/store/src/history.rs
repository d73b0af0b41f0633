//! Conversation history on SQLite.
//!
//! Threads and messages, keyed by the transport's opaque thread id. The run
//! loop treats appends as write-behind; ordering within a thread is carried
//! by the autoincrement rowid, not timestamps.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::Row as _;
use thiserror::Error;

use crate::HistoryStore;

pub type HistoryPool = sqlx::SqlitePool;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
    pub created_at: String,
}

pub async fn connect_history(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<HistoryPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

pub struct SqlHistoryStore {
    pool: HistoryPool,
}

impl SqlHistoryStore {
    pub fn new(pool: HistoryPool) -> Self {
        Self { pool }
    }

    /// Create the two history tables if absent. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), HistoryError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS threads (
                 id TEXT PRIMARY KEY,
                 created_at TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 thread_id TEXT NOT NULL REFERENCES threads(id),
                 role TEXT NOT NULL,
                 content TEXT NOT NULL,
                 created_at TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_thread_id ON messages(thread_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqlHistoryStore {
    async fn create_thread(&self, thread_id: &str) -> Result<(), HistoryError> {
        sqlx::query("INSERT OR IGNORE INTO threads (id, created_at) VALUES (?, ?)")
            .bind(thread_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn thread_exists(&self, thread_id: &str) -> Result<bool, HistoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn append(&self, thread_id: &str, role: &str, content: &str) -> Result<(), HistoryError> {
        sqlx::query(
            "INSERT INTO messages (thread_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(thread_id)
        .bind(role)
        .bind(content)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn messages(&self, thread_id: &str) -> Result<Vec<HistoryMessage>, HistoryError> {
        let rows = sqlx::query(
            "SELECT role, content, created_at FROM messages WHERE thread_id = ? ORDER BY id",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| HistoryMessage {
                role: row.get("role"),
                content: row.get("content"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{connect_history, SqlHistoryStore};
    use crate::HistoryStore;

    async fn store() -> SqlHistoryStore {
        let pool = connect_history("sqlite::memory:", 1, 5).await.expect("connect");
        let store = SqlHistoryStore::new(pool);
        store.ensure_schema().await.expect("schema");
        store
    }

    #[tokio::test]
    async fn thread_creation_is_idempotent() {
        let store = store().await;
        store.create_thread("t-1").await.expect("create");
        store.create_thread("t-1").await.expect("create again");
        assert!(store.thread_exists("t-1").await.expect("exists"));
        assert!(!store.thread_exists("t-2").await.expect("exists"));
    }

    #[tokio::test]
    async fn appends_preserve_turn_order() {
        let store = store().await;
        store.create_thread("t-1").await.expect("create");
        store.append("t-1", "user", "who won?").await.expect("append");
        store.append("t-1", "assistant", "Jakob did.").await.expect("append");
        store.append("t-1", "user", "by how much?").await.expect("append");

        let messages = store.messages("t-1").await.expect("messages");
        let roles: Vec<&str> = messages.iter().map(|message| message.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(messages[1].content, "Jakob did.");
    }

    #[tokio::test]
    async fn threads_are_isolated() {
        let store = store().await;
        store.create_thread("t-1").await.expect("create");
        store.create_thread("t-2").await.expect("create");
        store.append("t-1", "user", "a").await.expect("append");
        store.append("t-2", "user", "b").await.expect("append");

        assert_eq!(store.messages("t-1").await.expect("messages").len(), 1);
        assert_eq!(store.messages("t-2").await.expect("messages").len(), 1);
    }
}
