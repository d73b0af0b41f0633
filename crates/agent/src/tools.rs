//! Tools agents may invoke mid-turn.
//!
//! A tool receives its dependencies through [`ToolContext`] - the run-state
//! mutation handle and the store client - at invocation time. Tools never
//! capture network internals, and they never abort the run: anything that
//! goes wrong inside a tool comes back as a structured `{"error": ...}`
//! payload the calling agent can narrate.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use liftline_core::compiler::QueryCompiler;
use liftline_core::filter::QuerySpec;
use liftline_core::schema;
use liftline_core::state::{AgentId, RunState};
use liftline_store::StoreClient;

use crate::llm::ToolSchema;

/// Per-invocation dependencies, injected by the network for one turn.
pub struct ToolContext<'a> {
    pub state: &'a mut RunState,
    pub store: &'a dyn StoreClient,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn schema(&self) -> ToolSchema;
    async fn call(&self, arguments: Value, ctx: &mut ToolContext<'_>) -> Value;
}

/// `get_meet_results` - compiles a filter specification, runs it against
/// the store, and writes the rows into run state.
///
/// Exactly one state mutation per successful invocation; none on failure,
/// so a broken retrieval leaves earlier results intact.
pub struct QueryTool {
    compiler: QueryCompiler,
}

impl QueryTool {
    pub fn new(compiler: QueryCompiler) -> Self {
        Self { compiler }
    }
}

#[async_trait]
impl Tool for QueryTool {
    fn name(&self) -> &'static str {
        "get_meet_results"
    }

    fn schema(&self) -> ToolSchema {
        let columns: Vec<&str> = schema::names().collect();
        ToolSchema {
            name: self.name().to_string(),
            description: "Returns available meet data based on a set of filters, sorting, and \
                          limits. Use this to find how lifters performed, compare them, or find \
                          lifters that meet certain criteria."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "filters": {
                        "type": "array",
                        "description": "An array of filters to apply to the query.",
                        "items": {
                            "type": "object",
                            "properties": {
                                "column": { "type": "string", "enum": columns },
                                "operator": {
                                    "type": "string",
                                    "enum": ["=", "!=", ">", "<", ">=", "<=",
                                             "ILIKE", "NOT ILIKE", "IS NULL", "IS NOT NULL"],
                                    "description": "The operator to use for the filter."
                                },
                                "value": {
                                    "description": "The value to filter by. Not required for IS NULL or IS NOT NULL."
                                }
                            },
                            "required": ["column", "operator"]
                        }
                    },
                    "orderBy": {
                        "type": "string",
                        "enum": columns,
                        "description": "The column to sort the results by."
                    },
                    "sortDirection": {
                        "type": "string",
                        "enum": ["ASC", "DESC"],
                        "description": "The direction to sort the results."
                    },
                    "limit": {
                        "type": "number",
                        "maximum": 100,
                        "description": "The maximum number of results to return."
                    }
                }
            }),
        }
    }

    async fn call(&self, arguments: Value, ctx: &mut ToolContext<'_>) -> Value {
        let spec: QuerySpec = match serde_json::from_value(arguments) {
            Ok(spec) => spec,
            Err(error) => {
                warn!(
                    event_name = "query_tool.bad_arguments",
                    thread_id = ctx.state.thread_id(),
                    error = %error,
                    "tool arguments did not match the filter grammar"
                );
                return json!({ "error": format!("Query failed: {error}") });
            }
        };

        let compiled = match self.compiler.compile(&spec) {
            Ok(compiled) => compiled,
            Err(error) => {
                warn!(
                    event_name = "query_tool.compile_failed",
                    thread_id = ctx.state.thread_id(),
                    error = %error,
                    "filter specification rejected"
                );
                return json!({ "error": format!("Query failed: {error}") });
            }
        };

        match ctx.store.execute(&compiled).await {
            Ok(rows) => {
                info!(
                    event_name = "query_tool.executed",
                    thread_id = ctx.state.thread_id(),
                    row_count = rows.len(),
                    "meet-results query executed"
                );
                ctx.state.set_results(rows.clone());
                json!(rows)
            }
            Err(error) => {
                warn!(
                    event_name = "query_tool.store_failed",
                    thread_id = ctx.state.thread_id(),
                    error = %error,
                    "store execution failed; returning error payload"
                );
                json!({ "error": format!("Query failed: {error}") })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RouteArguments {
    agent: String,
    #[serde(default)]
    is_lifting_query: Option<bool>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// `route_to_agent` - the supervisor's mandatory selection tool. Records
/// the classification and the routed participant into run state.
pub struct RouteTool;

#[async_trait]
impl Tool for RouteTool {
    fn name(&self) -> &'static str {
        "route_to_agent"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Route to the specified agent.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "agent": {
                        "type": "string",
                        "description": "The name of the agent to route to."
                    },
                    "is_lifting_query": {
                        "type": "boolean",
                        "description": "Whether this is a powerlifting-related query."
                    },
                    "reasoning": {
                        "type": "string",
                        "description": "Brief reasoning for the routing decision."
                    }
                },
                "required": ["agent"]
            }),
        }
    }

    async fn call(&self, arguments: Value, ctx: &mut ToolContext<'_>) -> Value {
        let args: RouteArguments = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => {
                warn!(
                    event_name = "route_tool.bad_arguments",
                    thread_id = ctx.state.thread_id(),
                    error = %error,
                    "routing arguments were malformed"
                );
                return json!({ "error": format!("routing failed: {error}") });
            }
        };

        ctx.state.classify(args.is_lifting_query, args.reasoning);

        match AgentId::parse_route_target(&args.agent) {
            Some(target) => {
                ctx.state.request_route(target);
                info!(
                    event_name = "route_tool.routed",
                    thread_id = ctx.state.thread_id(),
                    target = target.display_name(),
                    "supervisor routed the request"
                );
                json!({ "agent": target.display_name() })
            }
            None => {
                warn!(
                    event_name = "route_tool.unknown_target",
                    thread_id = ctx.state.thread_id(),
                    requested = args.agent.as_str(),
                    "routing decision named no known participant"
                );
                json!({ "error": format!("unknown agent `{}`", args.agent) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use liftline_core::compiler::QueryCompiler;
    use liftline_core::state::{AgentId, RunState, TriggerInput};
    use liftline_store::InMemoryStore;

    use super::{QueryTool, RouteTool, Tool, ToolContext};

    fn state() -> RunState {
        RunState::new(TriggerInput {
            input: "how did Jakob do at his last meet?".to_string(),
            thread_id: "t-1".to_string(),
            user_id: None,
            message_id: None,
        })
    }

    fn query_tool() -> QueryTool {
        QueryTool::new(QueryCompiler::new("powerlifting-records"))
    }

    #[tokio::test]
    async fn successful_query_writes_results_once() {
        let store = InMemoryStore::with_rows(vec![json!({"Name": "Jakob", "TotalKg": 700.0})]);
        let mut state = state();
        let mut ctx = ToolContext { state: &mut state, store: &store };

        let payload = query_tool()
            .call(
                json!({
                    "filters": [{ "column": "Name", "operator": "ILIKE", "value": "Jakob" }],
                    "orderBy": "Date",
                    "sortDirection": "DESC",
                    "limit": 1
                }),
                &mut ctx,
            )
            .await;

        assert!(payload.is_array());
        assert_eq!(state.results().len(), 1);
        assert_eq!(store.executed().await.len(), 1);
    }

    #[tokio::test]
    async fn store_failure_returns_error_payload_and_leaves_state_untouched() {
        let store = InMemoryStore::failing_with("store unreachable");
        let mut state = state();
        state.set_results(vec![json!({"Name": "Earlier"})]);
        let mut ctx = ToolContext { state: &mut state, store: &store };

        let payload = query_tool().call(json!({ "filters": [] }), &mut ctx).await;

        let message = payload.get("error").and_then(|value| value.as_str()).expect("error field");
        assert!(message.starts_with("Query failed:"));
        assert_eq!(state.results(), &[json!({"Name": "Earlier"})]);
    }

    #[tokio::test]
    async fn unknown_column_is_caught_before_the_store() {
        let store = InMemoryStore::with_rows(vec![]);
        let mut state = state();
        let mut ctx = ToolContext { state: &mut state, store: &store };

        let payload = query_tool()
            .call(
                json!({ "filters": [{ "column": "Password", "operator": "=", "value": "x" }] }),
                &mut ctx,
            )
            .await;

        assert!(payload.get("error").is_some());
        assert!(store.executed().await.is_empty());
    }

    #[tokio::test]
    async fn route_tool_records_classification_and_route() {
        let store = InMemoryStore::with_rows(vec![]);
        let mut state = state();
        let mut ctx = ToolContext { state: &mut state, store: &store };

        let payload = RouteTool
            .call(
                json!({
                    "agent": "Meet performance analyst",
                    "is_lifting_query": true,
                    "reasoning": "asks about a lifter's meet"
                }),
                &mut ctx,
            )
            .await;

        assert_eq!(payload.get("agent").and_then(|v| v.as_str()), Some("Meet performance analyst"));
        assert_eq!(state.is_lifting_query(), Some(true));
        assert_eq!(state.take_route(), Some(AgentId::Analyst));
        assert!(!state.is_done());
    }

    #[tokio::test]
    async fn routing_to_summary_sets_termination() {
        let store = InMemoryStore::with_rows(vec![]);
        let mut state = state();
        let mut ctx = ToolContext { state: &mut state, store: &store };

        RouteTool
            .call(json!({ "agent": "Meet summary agent", "is_lifting_query": false }), &mut ctx)
            .await;

        assert!(state.is_done());
        assert_eq!(state.take_route(), Some(AgentId::Summary));
    }

    #[tokio::test]
    async fn unknown_route_target_sets_no_route() {
        let store = InMemoryStore::with_rows(vec![]);
        let mut state = state();
        let mut ctx = ToolContext { state: &mut state, store: &store };

        let payload = RouteTool.call(json!({ "agent": "Mystery agent" }), &mut ctx).await;

        assert!(payload.get("error").is_some());
        assert_eq!(state.take_route(), None);
    }
}
