//! In-memory tool server adapter.

use crate::bridge::{
    domain::{AgentId, ToolDefinition, ToolName},
    ports::{ToolServer, ToolServerError, ToolServerResult},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory tool table.
///
/// Stands in for the protocol server's own registry in tests and local
/// deterministic flows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolServer {
    tools: Arc<RwLock<BTreeMap<ToolName, ToolDefinition>>>,
}

impl InMemoryToolServer {
    /// Creates an empty tool server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registered tool names in order.
    ///
    /// # Errors
    ///
    /// Returns tool server runtime errors when lock acquisition fails.
    pub fn tool_names(&self) -> ToolServerResult<Vec<ToolName>> {
        let tools = self
            .tools
            .read()
            .map_err(|err| ToolServerError::runtime(std::io::Error::other(err.to_string())))?;
        Ok(tools.keys().cloned().collect())
    }

    /// Returns the names of tools forwarding to `agent_id`.
    ///
    /// # Errors
    ///
    /// Returns tool server runtime errors when lock acquisition fails.
    pub fn tools_for_agent(&self, agent_id: AgentId) -> ToolServerResult<Vec<ToolName>> {
        let tools = self
            .tools
            .read()
            .map_err(|err| ToolServerError::runtime(std::io::Error::other(err.to_string())))?;
        Ok(tools
            .values()
            .filter(|tool| {
                tool.action_target()
                    .is_some_and(|target| target.agent_id() == agent_id)
            })
            .map(|tool| tool.name().clone())
            .collect())
    }
}

#[async_trait]
impl ToolServer for InMemoryToolServer {
    async fn add_tool(&self, tool: ToolDefinition) -> ToolServerResult<()> {
        let mut tools = self
            .tools
            .write()
            .map_err(|err| ToolServerError::runtime(std::io::Error::other(err.to_string())))?;
        tools.insert(tool.name().clone(), tool);
        Ok(())
    }

    async fn remove_tool(&self, name: &ToolName) -> ToolServerResult<Option<ToolDefinition>> {
        let mut tools = self
            .tools
            .write()
            .map_err(|err| ToolServerError::runtime(std::io::Error::other(err.to_string())))?;
        Ok(tools.remove(name))
    }

    async fn get_tool(&self, name: &ToolName) -> ToolServerResult<Option<ToolDefinition>> {
        let tools = self
            .tools
            .read()
            .map_err(|err| ToolServerError::runtime(std::io::Error::other(err.to_string())))?;
        Ok(tools.get(name).cloned())
    }

    async fn list_tools(&self) -> ToolServerResult<Vec<ToolDefinition>> {
        let tools = self
            .tools
            .read()
            .map_err(|err| ToolServerError::runtime(std::io::Error::other(err.to_string())))?;
        Ok(tools.values().cloned().collect())
    }
}
