//! ClickHouse HTTP client.
//!
//! Speaks the plain HTTP interface: the query text travels as the request
//! body, every bound value as a `param_<name>` query parameter, and the
//! response comes back as `FORMAT JSON` (`{"data": [...]}`). The server
//! performs the actual substitution of `{name:Type}` placeholders, so the
//! values never touch the SQL text on our side either.

use std::time::Duration;

use async_trait::async_trait;
use liftline_core::compiler::CompiledQuery;
use liftline_core::config::StoreConfig;
use liftline_core::state::Row;
use serde::Deserialize;

use crate::{StoreClient, StoreError};

pub struct ClickHouseClient {
    client: reqwest::Client,
    base_url: String,
    database: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: Vec<Row>,
}

impl ClickHouseClient {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| StoreError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
        })
    }

    /// Query-string pairs for one request: format selector, optional
    /// database, and one `param_<name>` entry per bound value.
    fn request_params(&self, query: &CompiledQuery) -> Vec<(String, String)> {
        let mut pairs = vec![("default_format".to_string(), "JSON".to_string())];
        if let Some(database) = &self.database {
            pairs.push(("database".to_string(), database.clone()));
        }
        for (name, param) in &query.params {
            pairs.push((format!("param_{name}"), param.value.clone()));
        }
        pairs
    }

    /// Liveness probe against the store's `/ping` endpoint.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let url = format!("{}/ping", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| StoreError::Transport(error.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Rejected(format!("ping returned status {}", response.status())))
        }
    }
}

#[async_trait]
impl StoreClient for ClickHouseClient {
    async fn execute(&self, query: &CompiledQuery) -> Result<Vec<Row>, StoreError> {
        let response = self
            .client
            .post(&self.base_url)
            .query(&self.request_params(query))
            .body(query.sql.clone())
            .send()
            .await
            .map_err(|error| StoreError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(StoreError::Rejected(detail));
        }

        let payload: QueryResponse =
            response.json().await.map_err(|error| StoreError::Decode(error.to_string()))?;
        Ok(payload.data)
    }
}
