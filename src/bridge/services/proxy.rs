//! Turns agent action catalogs into proxy tools and forwards tool calls.

use crate::bridge::{
    domain::{AgentId, BridgeDomainError, ToolDefinition, ToolInvocation, ToolName},
    ports::{AgentExchange, AgentHandle, ExchangeError, ToolServer, ToolServerError},
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Registered tool names mapped to their descriptions.
pub type ToolDescriptions = BTreeMap<ToolName, String>;

/// Errors raised while adapting one agent.
#[derive(Debug, Error)]
pub enum AdaptError {
    /// The agent's action catalog could not be fetched.
    #[error("failed to fetch action catalog of agent {agent_id}: {source}")]
    CatalogFetch {
        /// Agent being adapted.
        agent_id: AgentId,
        /// Exchange failure.
        #[source]
        source: ExchangeError,
    },
    /// A tool definition could not be built from the catalog.
    #[error(transparent)]
    Domain(#[from] BridgeDomainError),
    /// The tool server rejected a registration.
    #[error(transparent)]
    ToolServer(#[from] ToolServerError),
}

/// Errors raised while invoking a proxy tool.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// No tool is registered under the name.
    #[error("tool '{0}' not found")]
    ToolNotFound(String),
    /// The tool is handled by the bridge rather than an agent.
    #[error("tool '{0}' does not forward to an agent action")]
    NotAnAgentTool(ToolName),
    /// The agent behind the tool can no longer receive messages.
    ///
    /// The tool has been removed from the tool server.
    #[error("agent behind tool '{tool_name}' is unreachable: {source}")]
    TargetUnreachable {
        /// Removed tool.
        tool_name: ToolName,
        /// Exchange failure naming the agent.
        #[source]
        source: ExchangeError,
    },
    /// The remote call failed for another reason.
    #[error(transparent)]
    Exchange(ExchangeError),
    /// The tool lookup failed.
    #[error(transparent)]
    ToolServer(#[from] ToolServerError),
}

/// Builds proxy tools for agents and forwards calls made through them.
pub struct ActionProxyFactory<E, S>
where
    E: AgentExchange,
    S: ToolServer,
{
    exchange: Arc<E>,
    server: Arc<S>,
}

impl<E, S> Clone for ActionProxyFactory<E, S>
where
    E: AgentExchange,
    S: ToolServer,
{
    fn clone(&self) -> Self {
        Self {
            exchange: Arc::clone(&self.exchange),
            server: Arc::clone(&self.server),
        }
    }
}

impl<E, S> ActionProxyFactory<E, S>
where
    E: AgentExchange,
    S: ToolServer,
{
    /// Creates a factory over a shared exchange connection and tool server.
    #[must_use]
    pub const fn new(exchange: Arc<E>, server: Arc<S>) -> Self {
        Self { exchange, server }
    }

    /// Returns a handle for `agent_id` on the factory's connection.
    #[must_use]
    pub fn handle(&self, agent_id: AgentId) -> AgentHandle<E> {
        AgentHandle::new(agent_id, Arc::clone(&self.exchange))
    }

    /// Returns the shared exchange connection.
    #[must_use]
    pub const fn exchange(&self) -> &Arc<E> {
        &self.exchange
    }

    /// Returns the shared tool server.
    #[must_use]
    pub const fn tool_server(&self) -> &Arc<S> {
        &self.server
    }

    /// Registers one proxy tool per action of `agent`.
    ///
    /// Every definition is built before the first registration, so a failed
    /// catalog fetch registers nothing. Registration overwrites tools with
    /// the same name, which makes repeated adaptation idempotent. Does not
    /// record the agent as known.
    ///
    /// # Errors
    ///
    /// Returns [`AdaptError::CatalogFetch`] when the agent is unreachable,
    /// or domain and tool server errors. When the tool server rejects a
    /// tool, the tools registered by this call are removed again.
    pub async fn adapt(&self, agent: &AgentHandle<E>) -> Result<ToolDescriptions, AdaptError> {
        let agent_id = agent.agent_id();
        let catalog = agent
            .describe()
            .await
            .map_err(|source| AdaptError::CatalogFetch { agent_id, source })?;
        let definitions = catalog
            .iter()
            .map(|action| ToolDefinition::for_action(agent_id, action))
            .collect::<Result<Vec<_>, _>>()?;

        let mut registered = ToolDescriptions::new();
        for definition in definitions {
            let name = definition.name().clone();
            let description = definition.description().to_owned();
            if let Err(err) = self.server.add_tool(definition).await {
                self.withdraw(&registered).await;
                return Err(err.into());
            }
            registered.insert(name, description);
        }

        info!(%agent_id, tools = registered.len(), "registered agent tools");
        Ok(registered)
    }

    /// Forwards a call of the proxy tool `tool_name` to its agent.
    ///
    /// The remote result is returned unchanged. When the agent is gone, the
    /// tool is removed first and the failure is then returned; the call is
    /// never retried.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::ToolNotFound`] for unregistered names,
    /// [`InvocationError::TargetUnreachable`] when the agent has terminated,
    /// and [`InvocationError::Exchange`] for other remote failures.
    pub async fn invoke(
        &self,
        tool_name: &str,
        invocation: ToolInvocation,
    ) -> Result<Value, InvocationError> {
        let name = ToolName::new(tool_name)
            .map_err(|_| InvocationError::ToolNotFound(tool_name.to_owned()))?;
        let definition = self
            .server
            .get_tool(&name)
            .await?
            .ok_or_else(|| InvocationError::ToolNotFound(tool_name.to_owned()))?;
        let target = definition
            .action_target()
            .ok_or_else(|| InvocationError::NotAnAgentTool(name.clone()))?;

        let agent_id = target.agent_id();
        match self.handle(agent_id).action(target.action(), invocation).await {
            Ok(result) => Ok(result),
            Err(source) if source.is_unreachable() => {
                self.deregister(&name, agent_id).await;
                Err(InvocationError::TargetUnreachable {
                    tool_name: name,
                    source,
                })
            }
            Err(source) => Err(InvocationError::Exchange(source)),
        }
    }

    async fn deregister(&self, name: &ToolName, agent_id: AgentId) {
        match self.server.remove_tool(name).await {
            Ok(_) => warn!(tool_name = %name, %agent_id, "removed tool of unreachable agent"),
            Err(err) => error!(
                tool_name = %name,
                %agent_id,
                error = %err,
                "failed to remove tool of unreachable agent"
            ),
        }
    }

    async fn withdraw(&self, registered: &ToolDescriptions) {
        for name in registered.keys() {
            if let Err(err) = self.server.remove_tool(name).await {
                warn!(tool_name = %name, error = %err, "failed to withdraw partially registered tool");
            }
        }
    }
}
