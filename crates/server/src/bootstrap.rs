use std::sync::Arc;

use liftline_agent::{AgentSet, AnthropicClient, LlmError, Network, NetworkDeps};
use liftline_core::config::{AppConfig, ConfigError, LoadOptions};
use liftline_store::{
    connect_history, ClickHouseClient, HistoryError, HistoryPool, HistoryStore, SqlHistoryStore,
    StoreError,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub history_pool: HistoryPool,
    pub network: Arc<Network>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("history database connection failed: {0}")]
    HistoryConnect(#[source] sqlx::Error),
    #[error("history schema setup failed: {0}")]
    HistorySchema(#[source] HistoryError),
    #[error("store client setup failed: {0}")]
    Store(#[source] StoreError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let history_pool = connect_history(
        &config.history.url,
        config.history.max_connections,
        config.history.timeout_secs,
    )
    .await
    .map_err(BootstrapError::HistoryConnect)?;

    let history_store = SqlHistoryStore::new(history_pool.clone());
    history_store.ensure_schema().await.map_err(BootstrapError::HistorySchema)?;
    info!(
        event_name = "system.bootstrap.history_ready",
        correlation_id = "bootstrap",
        "history database connected and schema ensured"
    );

    let llm = AnthropicClient::new(&config.llm)?;
    let store = ClickHouseClient::new(&config.store).map_err(BootstrapError::Store)?;
    let agents = AgentSet::standard(&config.llm, &config.store);
    let history: Arc<dyn HistoryStore> = Arc::new(history_store);

    let network = Network::new(
        NetworkDeps { llm: Arc::new(llm), store: Arc::new(store), history: Some(history) },
        agents,
        config.network.max_turns,
        config.llm.max_tokens,
    );

    info!(
        event_name = "system.bootstrap.complete",
        correlation_id = "bootstrap",
        store_url = config.store.url.as_str(),
        table = config.store.table.as_str(),
        max_turns = config.network.max_turns,
        "application bootstrap complete"
    );

    Ok(Application { config, history_pool, network: Arc::new(network) })
}
