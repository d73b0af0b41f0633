use thiserror::Error;

use crate::llm::LlmError;

/// Fatal run-level failures. Everything recoverable - compile errors, store
/// failures, malformed tool arguments - is folded into conversational
/// payloads before it gets here; these variants mean the state machine's
/// own contract broke and the run must surface an operational error.
#[derive(Debug, Error)]
pub enum RunError {
    /// The supervisor turn ended without a usable routing decision. Not
    /// retried: a silent retry loop would stall the run instead.
    #[error("supervisor turn produced no usable routing decision")]
    RoutingContractViolation,
    /// The defensive turn ceiling was hit. Distinct from normal completion.
    #[error("run exceeded its turn budget of {limit}")]
    TurnBudgetExceeded { limit: u32 },
    #[error("llm call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("prompt rendering failed: {0}")]
    Prompt(String),
}
