//! Shared run state and the participants that may mutate it.
//!
//! One [`RunState`] exists per orchestration run. The network owns it
//! exclusively; agents and tools see it only through the `&mut` handle the
//! network lends them for the duration of a single turn, so no two
//! mutations can interleave. Prompt rendering never touches the live state:
//! it works from an explicit read-only [`StateSnapshot`].

use serde::{Deserialize, Serialize};

/// One result row as returned by the store (a JSON object).
pub type Row = serde_json::Value;

/// Closed set of routing participants. Routing decisions resolve to this
/// enum through a lookup table, never by free-form string comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Supervisor,
    Analyst,
    Summary,
}

impl AgentId {
    /// Stable wire/display name, unique within one network.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Supervisor => "Supervisor",
            Self::Analyst => "Meet performance analyst",
            Self::Summary => "Meet summary agent",
        }
    }

    /// Resolve a supervisor routing decision to a participant. Accepts the
    /// display name and a couple of shorthand spellings models reach for.
    pub fn parse_route_target(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Meet performance analyst" | "analyst" | "Analyst" => Some(Self::Analyst),
            "Meet summary agent" | "Meet Summary Agent" | "summary" | "Summary" => {
                Some(Self::Summary)
            }
            _ => None,
        }
    }
}

/// Inbound request that seeds a run. Identifier fields are opaque
/// pass-through values owned by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerInput {
    pub input: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Read-only view of run state for prompt construction.
#[derive(Clone, Debug, Serialize)]
pub struct StateSnapshot {
    pub input: String,
    pub is_lifting_query: Option<bool>,
    pub routing_reasoning: Option<String>,
    pub result_count: usize,
    pub results_json: String,
}

/// Mutable record shared across one run's turns.
#[derive(Debug)]
pub struct RunState {
    input: String,
    thread_id: String,
    user_id: Option<String>,
    message_id: Option<String>,
    results: Vec<Row>,
    is_lifting_query: Option<bool>,
    routing_reasoning: Option<String>,
    pending_route: Option<AgentId>,
    final_answer: Option<String>,
    done: bool,
}

impl RunState {
    pub fn new(trigger: TriggerInput) -> Self {
        Self {
            input: trigger.input,
            thread_id: trigger.thread_id,
            user_id: trigger.user_id,
            message_id: trigger.message_id,
            results: Vec::new(),
            is_lifting_query: None,
            routing_reasoning: None,
            pending_route: None,
            final_answer: None,
            done: false,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn results(&self) -> &[Row] {
        &self.results
    }

    /// Replace accumulated results. Replacement, not append: each retrieval
    /// supersedes the last.
    pub fn set_results(&mut self, rows: Vec<Row>) {
        self.results = rows;
    }

    pub fn is_lifting_query(&self) -> Option<bool> {
        self.is_lifting_query
    }

    /// Record the supervisor's classification of the request.
    pub fn classify(&mut self, is_lifting_query: Option<bool>, reasoning: Option<String>) {
        self.is_lifting_query = is_lifting_query;
        self.routing_reasoning = reasoning;
    }

    /// Record the supervisor's routing decision. Routing to the summary
    /// participant also arms termination: once the summary turn completes,
    /// the router observes the flag and halts the run.
    pub fn request_route(&mut self, target: AgentId) {
        if target == AgentId::Summary {
            self.done = true;
        }
        self.pending_route = Some(target);
    }

    /// Consume the pending routing decision, if any.
    pub fn take_route(&mut self) -> Option<AgentId> {
        self.pending_route.take()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn set_final_answer(&mut self, answer: String) {
        self.final_answer = Some(answer);
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    /// Detached read-only view for prompt rendering.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            input: self.input.clone(),
            is_lifting_query: self.is_lifting_query,
            routing_reasoning: self.routing_reasoning.clone(),
            result_count: self.results.len(),
            results_json: serde_json::to_string(&self.results)
                .unwrap_or_else(|_| "[]".to_string()),
        }
    }
}
