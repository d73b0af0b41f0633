//! Store and history collaborators.
//!
//! Two seams live here, both behind traits so the orchestration core never
//! assumes a concrete backend:
//! - [`StoreClient`] - executes a compiled, parameterized query against the
//!   columnar meet-results store (`clickhouse` module for the real HTTP
//!   client, `memory` for the test double)
//! - [`HistoryStore`] - thread-keyed conversation history on SQLite
//!   (`history` module), write-behind from the run loop's perspective

pub mod clickhouse;
pub mod history;
pub mod memory;

use async_trait::async_trait;
use liftline_core::compiler::CompiledQuery;
use liftline_core::state::Row;
use thiserror::Error;

pub use clickhouse::ClickHouseClient;
pub use history::{connect_history, HistoryError, HistoryMessage, HistoryPool, SqlHistoryStore};
pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("store rejected query: {0}")]
    Rejected(String),
    #[error("store response decode failed: {0}")]
    Decode(String),
}

/// Executes compiled queries. Implementations must bind every entry of the
/// parameter map by name and reject the query on any mismatch; they never
/// see raw user text outside that map.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn execute(&self, query: &CompiledQuery) -> Result<Vec<Row>, StoreError>;
}

/// Conversation history keyed by thread id. Appends must preserve turn
/// order within a thread.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn create_thread(&self, thread_id: &str) -> Result<(), HistoryError>;
    async fn thread_exists(&self, thread_id: &str) -> Result<bool, HistoryError>;
    async fn append(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), HistoryError>;
    async fn messages(&self, thread_id: &str) -> Result<Vec<HistoryMessage>, HistoryError>;
}
