//! Agent network for liftline - routing, tools, and the run loop.
//!
//! The orchestration follows a supervisor pattern:
//! 1. The **router** (`router`) reads run state and either halts or hands
//!    the turn to the supervisor participant
//! 2. The **supervisor** classifies the request and routes it - retrieval
//!    (`Meet performance analyst`) or answering (`Meet summary agent`) -
//!    through a mandatory `route_to_agent` tool call
//! 3. The **analyst** translates the question into `get_meet_results` tool
//!    calls; the query tool compiles and executes them and writes rows into
//!    run state
//! 4. The **summary** participant renders the final conversational answer
//!    from a state snapshot and the run terminates
//!
//! All collaborators (LLM, store, history) are injected as trait objects;
//! nothing in this crate reaches for ambient globals.

pub mod agents;
pub mod errors;
pub mod llm;
pub mod network;
pub mod prompts;
pub mod router;
pub mod tools;

pub use agents::{Agent, AgentSet};
pub use errors::RunError;
pub use llm::{AnthropicClient, ChatRequest, LlmClient, LlmError, LlmReply, ToolSchema};
pub use network::{Network, NetworkDeps, RunOutcome};
pub use router::{Decision, Router};
pub use tools::{QueryTool, RouteTool, Tool, ToolContext};
