//! Participant definitions.
//!
//! Each agent binds one participant id to one model and the tools it is
//! allowed to call. The set is closed: routing resolves to [`AgentId`]
//! variants, never to free-form names.

use liftline_core::compiler::QueryCompiler;
use liftline_core::config::{LlmConfig, StoreConfig};
use liftline_core::state::AgentId;

use crate::llm::ToolSchema;
use crate::tools::{QueryTool, RouteTool, Tool};

pub struct Agent {
    pub id: AgentId,
    pub model: String,
    tools: Vec<Box<dyn Tool>>,
}

impl Agent {
    pub fn new(id: AgentId, model: String, tools: Vec<Box<dyn Tool>>) -> Self {
        Self { id, model, tools }
    }

    /// Look a declared tool up by name. Tools not declared here are not
    /// callable from this agent's turns.
    pub fn tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|tool| tool.name() == name).map(Box::as_ref)
    }

    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|tool| tool.schema()).collect()
    }
}

/// The three participants of the meet-query network.
pub struct AgentSet {
    pub supervisor: Agent,
    pub analyst: Agent,
    pub summary: Agent,
}

impl AgentSet {
    /// Standard wiring: supervisor on the routing model with the route
    /// tool, analyst on the main model with the query tool, summary on the
    /// main model with no tools.
    pub fn standard(llm: &LlmConfig, store: &StoreConfig) -> Self {
        let compiler = QueryCompiler::new(store.table.clone());
        Self {
            supervisor: Agent::new(
                AgentId::Supervisor,
                llm.supervisor_model.clone(),
                vec![Box::new(RouteTool)],
            ),
            analyst: Agent::new(
                AgentId::Analyst,
                llm.model.clone(),
                vec![Box::new(QueryTool::new(compiler))],
            ),
            summary: Agent::new(AgentId::Summary, llm.model.clone(), Vec::new()),
        }
    }

    pub fn get(&self, id: AgentId) -> &Agent {
        match id {
            AgentId::Supervisor => &self.supervisor,
            AgentId::Analyst => &self.analyst,
            AgentId::Summary => &self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use liftline_core::config::AppConfig;
    use liftline_core::state::AgentId;

    use super::AgentSet;

    #[test]
    fn standard_set_declares_the_expected_tools() {
        let config = AppConfig::default();
        let agents = AgentSet::standard(&config.llm, &config.store);

        assert!(agents.supervisor.tool("route_to_agent").is_some());
        assert!(agents.supervisor.tool("get_meet_results").is_none());
        assert!(agents.analyst.tool("get_meet_results").is_some());
        assert!(agents.summary.tool_schemas().is_empty());
    }

    #[test]
    fn lookup_by_id_returns_the_matching_agent() {
        let config = AppConfig::default();
        let agents = AgentSet::standard(&config.llm, &config.store);
        assert_eq!(agents.get(AgentId::Analyst).id, AgentId::Analyst);
        assert_eq!(agents.get(AgentId::Supervisor).model, config.llm.supervisor_model);
    }
}
