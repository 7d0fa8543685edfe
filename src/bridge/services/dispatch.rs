//! Single entry point routing tool calls by their registered target.

use super::discovery::{DiscoveryError, discover_agents};
use super::proxy::{ActionProxyFactory, InvocationError};
use super::registrar::{OnDemandRegistrar, RegistrationError};
use crate::bridge::{
    domain::{
        AddAgentArguments, ControlTool, DiscoverAgentsArguments, ToolInvocation, ToolName,
        ToolTarget,
    },
    ports::{AgentExchange, ToolServer, ToolServerError},
};
use mockable::Clock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned to the tool-calling client.
#[derive(Debug, Error)]
pub enum ToolCallError {
    /// No tool is registered under the name.
    #[error("tool '{0}' not found")]
    ToolNotFound(String),
    /// The arguments do not fit the tool's input schema.
    #[error("invalid arguments for tool '{tool_name}': {reason}")]
    InvalidArguments {
        /// Called tool.
        tool_name: ToolName,
        /// Parse or validation failure.
        reason: String,
    },
    /// Forwarding to an agent action failed.
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    /// The `add_agent` control tool failed.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    /// The `discover_agents` control tool failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// The tool lookup failed.
    #[error(transparent)]
    ToolServer(#[from] ToolServerError),
}

/// Resolves tool names through the tool server and routes each call to an
/// agent action or a control tool.
pub struct ToolDispatcher<E, S, C>
where
    E: AgentExchange,
    S: ToolServer,
    C: Clock + Send + Sync,
{
    factory: ActionProxyFactory<E, S>,
    registrar: OnDemandRegistrar<E, S, C>,
}

impl<E, S, C> Clone for ToolDispatcher<E, S, C>
where
    E: AgentExchange,
    S: ToolServer,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            registrar: self.registrar.clone(),
        }
    }
}

impl<E, S, C> ToolDispatcher<E, S, C>
where
    E: AgentExchange,
    S: ToolServer,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(factory: ActionProxyFactory<E, S>, registrar: OnDemandRegistrar<E, S, C>) -> Self {
        Self { factory, registrar }
    }

    /// Calls the tool registered as `name` with JSON `arguments`.
    ///
    /// Proxy tools take `{"args": [...], "kwargs": {...}}` and return the
    /// remote result unchanged. `add_agent` returns the registered tool
    /// names mapped to their descriptions, and `discover_agents` returns the
    /// matching agent ids in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCallError::ToolNotFound`] for unregistered names,
    /// [`ToolCallError::InvalidArguments`] when `arguments` do not match the
    /// tool's schema, or the failure of the routed operation.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolCallError> {
        let tool_name =
            ToolName::new(name).map_err(|_| ToolCallError::ToolNotFound(name.to_owned()))?;
        let definition = self
            .factory
            .tool_server()
            .get_tool(&tool_name)
            .await?
            .ok_or_else(|| ToolCallError::ToolNotFound(name.to_owned()))?;

        match definition.target() {
            ToolTarget::AgentAction(_) => {
                let invocation: ToolInvocation = parse_arguments(&tool_name, arguments)?;
                Ok(self.factory.invoke(tool_name.as_str(), invocation).await?)
            }
            ToolTarget::Control(ControlTool::AddAgent) => {
                let request: AddAgentArguments = parse_arguments(&tool_name, arguments)?;
                let registered = self.registrar.register_now(request.agent_uid).await?;
                Ok(Value::Object(
                    registered
                        .into_iter()
                        .map(|(registered_name, description)| {
                            (registered_name.to_string(), Value::String(description))
                        })
                        .collect::<Map<_, _>>(),
                ))
            }
            ToolTarget::Control(ControlTool::DiscoverAgents) => {
                let request: DiscoverAgentsArguments = parse_arguments(&tool_name, arguments)?;
                let filter = request.into_filter().map_err(|err| ToolCallError::InvalidArguments {
                    tool_name: tool_name.clone(),
                    reason: err.to_string(),
                })?;
                let found = discover_agents(self.factory.exchange().as_ref(), &filter).await?;
                Ok(Value::Array(
                    found
                        .into_iter()
                        .map(|agent_id| Value::String(agent_id.to_string()))
                        .collect(),
                ))
            }
        }
    }
}

fn parse_arguments<T: DeserializeOwned>(
    tool_name: &ToolName,
    arguments: Value,
) -> Result<T, ToolCallError> {
    serde_json::from_value(arguments).map_err(|err| ToolCallError::InvalidArguments {
        tool_name: tool_name.clone(),
        reason: err.to_string(),
    })
}
