use std::sync::Arc;

use liftline_agent::{AgentSet, AnthropicClient, Network, NetworkDeps};
use liftline_core::config::{AppConfig, LoadOptions};
use liftline_core::state::TriggerInput;
use liftline_store::{connect_history, ClickHouseClient, HistoryStore, SqlHistoryStore};
use uuid::Uuid;

use super::CommandResult;

/// One-shot question against the agent network, wired from the effective
/// configuration. History is best-effort: if the conversation database is
/// unavailable the run still proceeds, just without a transcript.
pub fn run(question: &str, thread: Option<String>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("ask", "config_validation", error.to_string(), 2)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        }
    };

    let thread_id = thread.unwrap_or_else(|| format!("cli-{}", Uuid::new_v4()));
    let question = question.to_string();

    let outcome = runtime.block_on(async {
        let llm = AnthropicClient::new(&config.llm)
            .map_err(|error| ("llm_not_configured", error.to_string()))?;
        let store = ClickHouseClient::new(&config.store)
            .map_err(|error| ("store_setup", error.to_string()))?;

        let history: Option<Arc<dyn HistoryStore>> = match connect_history(
            &config.history.url,
            config.history.max_connections,
            config.history.timeout_secs,
        )
        .await
        {
            Ok(pool) => {
                let history_store = SqlHistoryStore::new(pool);
                match history_store.ensure_schema().await {
                    Ok(()) => Some(Arc::new(history_store)),
                    Err(_) => None,
                }
            }
            Err(_) => None,
        };

        let agents = AgentSet::standard(&config.llm, &config.store);
        let network = Network::new(
            NetworkDeps { llm: Arc::new(llm), store: Arc::new(store), history },
            agents,
            config.network.max_turns,
            config.llm.max_tokens,
        );

        network
            .run(TriggerInput {
                input: question,
                thread_id: thread_id.clone(),
                user_id: None,
                message_id: None,
            })
            .await
            .map_err(|error| ("run_failure", error.to_string()))
    });

    match outcome {
        Ok(outcome) => CommandResult::success("ask", outcome.answer),
        Err((error_class, message)) => {
            let exit_code = if error_class == "llm_not_configured" { 3 } else { 4 };
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}
