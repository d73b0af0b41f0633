//! Next-agent selection.
//!
//! The router is a pure function of run state, re-derived after every turn
//! rather than stored, which makes the machine idempotent and replay-safe:
//! feeding it the same state always yields the same decision.

use liftline_core::state::{AgentId, RunState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Run(AgentId),
    Done,
}

pub struct Router;

impl Router {
    /// Termination wins over everything else; otherwise the supervisor
    /// owns the next decision. The supervisor's routed target is applied
    /// by the network within the same iteration, so every router call
    /// either halts or makes progress.
    pub fn next(state: &RunState) -> Decision {
        if state.is_done() {
            return Decision::Done;
        }
        Decision::Run(AgentId::Supervisor)
    }
}

#[cfg(test)]
mod tests {
    use liftline_core::state::{AgentId, RunState, TriggerInput};
    use serde_json::json;

    use super::{Decision, Router};

    fn state() -> RunState {
        RunState::new(TriggerInput {
            input: "q".to_string(),
            thread_id: "t".to_string(),
            user_id: None,
            message_id: None,
        })
    }

    #[test]
    fn fresh_state_routes_to_supervisor() {
        assert_eq!(Router::next(&state()), Decision::Run(AgentId::Supervisor));
    }

    #[test]
    fn terminated_state_is_done_regardless_of_other_fields() {
        let mut state = state();
        state.set_results(vec![json!({"Name": "A"})]);
        state.classify(Some(true), Some("reasoning".to_string()));
        state.request_route(AgentId::Summary);

        assert_eq!(Router::next(&state), Decision::Done);
        // Still done on re-evaluation: the decision is derived, not stored.
        assert_eq!(Router::next(&state), Decision::Done);
    }
}
