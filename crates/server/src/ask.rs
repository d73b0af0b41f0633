//! The question-answering endpoint.
//!
//! `POST /v1/ask` takes a trigger payload, drives one full network run, and
//! returns the conversational answer with run metadata. Run failures are
//! logged with their detail and surfaced to the caller as an opaque 500.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use tracing::error;

use liftline_agent::Network;
use liftline_core::state::TriggerInput;

#[derive(Clone)]
pub struct AskState {
    network: Arc<Network>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub thread_id: String,
    pub is_lifting_query: Option<bool>,
    pub result_count: usize,
}

pub fn router(network: Arc<Network>) -> Router {
    Router::new().route("/v1/ask", post(ask)).with_state(AskState { network })
}

pub async fn ask(
    State(state): State<AskState>,
    Json(trigger): Json<TriggerInput>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    if trigger.input.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "input must not be empty".to_string()));
    }
    if trigger.thread_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "threadId must not be empty".to_string()));
    }

    match state.network.run(trigger).await {
        Ok(outcome) => Ok(Json(AskResponse {
            answer: outcome.answer,
            thread_id: outcome.state.thread_id().to_string(),
            is_lifting_query: outcome.state.is_lifting_query(),
            result_count: outcome.state.results().len(),
        })),
        Err(run_error) => {
            error!(
                event_name = "system.ask.run_failed",
                error = %run_error,
                "meet query run failed"
            );
            Err((StatusCode::INTERNAL_SERVER_ERROR, "run failed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use serde_json::json;
    use tokio::sync::Mutex;

    use liftline_agent::{
        AgentSet, ChatRequest, LlmClient, LlmError, LlmReply, Network, NetworkDeps,
    };
    use liftline_core::config::AppConfig;
    use liftline_core::state::TriggerInput;
    use liftline_store::InMemoryStore;

    use super::{ask, AskState};

    struct ScriptedLlm(Mutex<VecDeque<LlmReply>>);

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _request: ChatRequest) -> Result<LlmReply, LlmError> {
            self.0
                .lock()
                .await
                .pop_front()
                .ok_or_else(|| LlmError::Malformed("script exhausted".to_string()))
        }
    }

    fn state(replies: Vec<LlmReply>) -> AskState {
        let config = AppConfig::default();
        let agents = AgentSet::standard(&config.llm, &config.store);
        let network = Network::new(
            NetworkDeps {
                llm: Arc::new(ScriptedLlm(Mutex::new(replies.into()))),
                store: Arc::new(InMemoryStore::with_rows(vec![])),
                history: None,
            },
            agents,
            config.network.max_turns,
            config.llm.max_tokens,
        );
        AskState { network: Arc::new(network) }
    }

    fn trigger(input: &str, thread_id: &str) -> TriggerInput {
        TriggerInput {
            input: input.to_string(),
            thread_id: thread_id.to_string(),
            user_id: None,
            message_id: None,
        }
    }

    #[tokio::test]
    async fn ask_returns_the_answer_and_run_metadata() {
        let replies = vec![
            LlmReply::ToolCall {
                name: "route_to_agent".to_string(),
                arguments: json!({ "agent": "Meet summary agent", "is_lifting_query": false }),
            },
            LlmReply::Text("I only know powerlifting, sorry.".to_string()),
        ];

        let Json(payload) = ask(State(state(replies)), Json(trigger("hi there", "t-9")))
            .await
            .expect("ask should succeed");

        assert_eq!(payload.answer, "I only know powerlifting, sorry.");
        assert_eq!(payload.thread_id, "t-9");
        assert_eq!(payload.is_lifting_query, Some(false));
        assert_eq!(payload.result_count, 0);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_before_any_model_call() {
        let (status, _) = ask(State(state(vec![])), Json(trigger("   ", "t-9")))
            .await
            .expect_err("should reject");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_thread_id_is_rejected() {
        let (status, _) = ask(State(state(vec![])), Json(trigger("who won?", "")))
            .await
            .expect_err("should reject");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn run_failures_surface_as_internal_errors() {
        // Supervisor replies with prose, which violates the routing contract.
        let replies = vec![LlmReply::Text("hmm".to_string())];

        let (status, _) = ask(State(state(replies)), Json(trigger("who won?", "t-9")))
            .await
            .expect_err("should fail");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
