//! The orchestration run loop.
//!
//! One [`Network`] value serves many runs; each `run` call owns a fresh
//! [`RunState`] for its whole duration. Turns are strictly sequential
//! within a run - the router decision for turn N+1 depends on the state
//! turn N left behind - while distinct runs may proceed concurrently as
//! independent loop instances.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use liftline_core::state::{AgentId, RunState, TriggerInput};
use liftline_store::{HistoryStore, StoreClient};

use crate::agents::AgentSet;
use crate::errors::RunError;
use crate::llm::{ChatRequest, LlmClient, LlmError, LlmReply};
use crate::prompts;
use crate::router::{Decision, Router};
use crate::tools::ToolContext;

/// Collaborators the network needs, injected as trait objects.
pub struct NetworkDeps {
    pub llm: Arc<dyn LlmClient>,
    pub store: Arc<dyn StoreClient>,
    pub history: Option<Arc<dyn HistoryStore>>,
}

/// Final product of one run.
#[derive(Debug)]
pub struct RunOutcome {
    pub answer: String,
    pub state: RunState,
}

pub struct Network {
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn StoreClient>,
    history: Option<Arc<dyn HistoryStore>>,
    agents: AgentSet,
    max_turns: u32,
    max_tokens: u32,
}

impl Network {
    pub fn new(deps: NetworkDeps, agents: AgentSet, max_turns: u32, max_tokens: u32) -> Self {
        Self {
            llm: deps.llm,
            store: deps.store,
            history: deps.history,
            agents,
            max_turns,
            max_tokens,
        }
    }

    /// Drive one request to completion.
    ///
    /// Loop shape: the router either halts or hands the turn to the
    /// supervisor; the supervisor's mandatory routing call is then applied
    /// within the same iteration by executing the routed participant. A
    /// supervisor turn that records no route is a fatal
    /// [`RunError::RoutingContractViolation`], and the whole loop sits
    /// under a turn budget the router cannot override.
    pub async fn run(&self, trigger: TriggerInput) -> Result<RunOutcome, RunError> {
        let execution_id = Uuid::new_v4();
        info!(
            event_name = "network.run.start",
            correlation_id = %execution_id,
            thread_id = trigger.thread_id.as_str(),
            "meet query run starting"
        );

        if let Some(history) = &self.history {
            if let Err(error) = history.create_thread(&trigger.thread_id).await {
                warn!(
                    event_name = "network.history.create_failed",
                    correlation_id = %execution_id,
                    thread_id = trigger.thread_id.as_str(),
                    error = %error,
                    "could not ensure history thread"
                );
            } else if let Err(error) =
                history.append(&trigger.thread_id, "user", &trigger.input).await
            {
                warn!(
                    event_name = "network.history.append_failed",
                    correlation_id = %execution_id,
                    thread_id = trigger.thread_id.as_str(),
                    error = %error,
                    "could not append user message"
                );
            }
        }

        let mut state = RunState::new(trigger);
        let mut turns: u32 = 0;

        loop {
            match Router::next(&state) {
                Decision::Done => break,
                Decision::Run(AgentId::Supervisor) => {
                    self.spend_turn(&mut turns)?;
                    self.supervisor_turn(&mut state, execution_id).await?;

                    let target =
                        state.take_route().ok_or(RunError::RoutingContractViolation)?;
                    self.spend_turn(&mut turns)?;
                    match target {
                        AgentId::Analyst => self.analyst_turn(&mut state, execution_id).await?,
                        AgentId::Summary => self.summary_turn(&mut state, execution_id).await?,
                        AgentId::Supervisor => return Err(RunError::RoutingContractViolation),
                    }
                }
                Decision::Run(other) => {
                    // The router only ever yields the supervisor; anything
                    // else means its contract changed under us.
                    warn!(
                        event_name = "network.router.unexpected_target",
                        correlation_id = %execution_id,
                        target = other.display_name(),
                        "router selected a non-supervisor participant"
                    );
                    return Err(RunError::RoutingContractViolation);
                }
            }
        }

        let answer = state
            .final_answer()
            .unwrap_or("I wasn't able to put together an answer this time.")
            .to_string();

        if let Some(history) = &self.history {
            // Write-behind: the answer append must not hold the caller up,
            // and it runs after every turn mutation, so order is kept.
            let history = Arc::clone(history);
            let thread_id = state.thread_id().to_string();
            let answer = answer.clone();
            tokio::spawn(async move {
                if let Err(error) = history.append(&thread_id, "assistant", &answer).await {
                    warn!(
                        event_name = "network.history.append_failed",
                        thread_id = thread_id.as_str(),
                        error = %error,
                        "could not append assistant answer"
                    );
                }
            });
        }

        info!(
            event_name = "network.run.complete",
            correlation_id = %execution_id,
            thread_id = state.thread_id(),
            turns,
            result_count = state.results().len(),
            "meet query run complete"
        );
        Ok(RunOutcome { answer, state })
    }

    fn spend_turn(&self, turns: &mut u32) -> Result<(), RunError> {
        if *turns >= self.max_turns {
            return Err(RunError::TurnBudgetExceeded { limit: self.max_turns });
        }
        *turns += 1;
        Ok(())
    }

    async fn supervisor_turn(
        &self,
        state: &mut RunState,
        execution_id: Uuid,
    ) -> Result<(), RunError> {
        let agent = self.agents.get(AgentId::Supervisor);
        let request = ChatRequest {
            model: agent.model.clone(),
            system: prompts::supervisor_system(&state.snapshot())?,
            prompt: state.input().to_string(),
            tools: agent.tool_schemas(),
            max_tokens: self.max_tokens,
        };

        match self.llm.complete(request).await? {
            LlmReply::ToolCall { name, arguments } => match agent.tool(&name) {
                Some(tool) => {
                    let mut ctx = ToolContext { state, store: self.store.as_ref() };
                    tool.call(arguments, &mut ctx).await;
                }
                None => {
                    warn!(
                        event_name = "network.supervisor.undeclared_tool",
                        correlation_id = %execution_id,
                        tool = name.as_str(),
                        "supervisor called a tool it does not declare"
                    );
                }
            },
            LlmReply::Text(_) => {
                warn!(
                    event_name = "network.supervisor.no_tool_call",
                    correlation_id = %execution_id,
                    "supervisor returned prose instead of a routing call"
                );
            }
        }
        Ok(())
    }

    async fn analyst_turn(
        &self,
        state: &mut RunState,
        execution_id: Uuid,
    ) -> Result<(), RunError> {
        let agent = self.agents.get(AgentId::Analyst);
        let request = ChatRequest {
            model: agent.model.clone(),
            system: prompts::analyst_system(),
            prompt: state.input().to_string(),
            tools: agent.tool_schemas(),
            max_tokens: self.max_tokens,
        };

        match self.llm.complete(request).await? {
            LlmReply::ToolCall { name, arguments } => match agent.tool(&name) {
                Some(tool) => {
                    let mut ctx = ToolContext { state, store: self.store.as_ref() };
                    tool.call(arguments, &mut ctx).await;
                }
                None => {
                    warn!(
                        event_name = "network.analyst.undeclared_tool",
                        correlation_id = %execution_id,
                        tool = name.as_str(),
                        "analyst called a tool it does not declare"
                    );
                }
            },
            LlmReply::Text(_) => {
                // No retrieval happened; the next supervisor turn decides
                // whether to retry or answer with what exists.
                warn!(
                    event_name = "network.analyst.no_tool_call",
                    correlation_id = %execution_id,
                    "analyst returned prose instead of a query call"
                );
            }
        }
        Ok(())
    }

    async fn summary_turn(
        &self,
        state: &mut RunState,
        execution_id: Uuid,
    ) -> Result<(), RunError> {
        let agent = self.agents.get(AgentId::Summary);
        let request = ChatRequest {
            model: agent.model.clone(),
            system: "You are a helpful powerlifting meet assistant.".to_string(),
            prompt: prompts::summary_prompt(&state.snapshot())?,
            tools: Vec::new(),
            max_tokens: self.max_tokens,
        };

        match self.llm.complete(request).await? {
            LlmReply::Text(text) => {
                state.set_final_answer(text);
                Ok(())
            }
            LlmReply::ToolCall { name, .. } => {
                warn!(
                    event_name = "network.summary.unexpected_tool_call",
                    correlation_id = %execution_id,
                    tool = name.as_str(),
                    "summary participant attempted a tool call"
                );
                Err(RunError::Llm(LlmError::Malformed(
                    "summary participant attempted a tool call".to_string(),
                )))
            }
        }
    }
}
