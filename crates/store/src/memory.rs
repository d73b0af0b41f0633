//! In-memory store double for tests and offline development.

use async_trait::async_trait;
use liftline_core::compiler::CompiledQuery;
use liftline_core::state::Row;
use tokio::sync::Mutex;

use crate::{StoreClient, StoreError};

/// Returns canned rows (or a canned failure) and records every executed
/// query for assertions.
#[derive(Default)]
pub struct InMemoryStore {
    rows: Vec<Row>,
    failure: Option<String>,
    executed: Mutex<Vec<CompiledQuery>>,
}

impl InMemoryStore {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self { rows, failure: None, executed: Mutex::new(Vec::new()) }
    }

    pub fn failing_with(message: impl Into<String>) -> Self {
        Self { rows: Vec::new(), failure: Some(message.into()), executed: Mutex::new(Vec::new()) }
    }

    /// Queries executed so far, oldest first.
    pub async fn executed(&self) -> Vec<CompiledQuery> {
        self.executed.lock().await.clone()
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn execute(&self, query: &CompiledQuery) -> Result<Vec<Row>, StoreError> {
        if let Some(message) = &self.failure {
            return Err(StoreError::Transport(message.clone()));
        }
        self.executed.lock().await.push(query.clone());
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use liftline_core::{QueryCompiler, QuerySpec};
    use serde_json::json;

    use super::InMemoryStore;
    use crate::{StoreClient, StoreError};

    #[tokio::test]
    async fn returns_canned_rows_and_records_queries() {
        let store = InMemoryStore::with_rows(vec![json!({"Name": "A"})]);
        let query = QueryCompiler::new("t").compile(&QuerySpec::default()).expect("compile");

        let rows = store.execute(&query).await.expect("execute");
        assert_eq!(rows.len(), 1);
        assert_eq!(store.executed().await.len(), 1);
    }

    #[tokio::test]
    async fn canned_failure_surfaces_as_transport_error() {
        let store = InMemoryStore::failing_with("connection refused");
        let query = QueryCompiler::new("t").compile(&QuerySpec::default()).expect("compile");

        let error = store.execute(&query).await.expect_err("should fail");
        assert!(matches!(error, StoreError::Transport(message) if message == "connection refused"));
        assert!(store.executed().await.is_empty());
    }
}
