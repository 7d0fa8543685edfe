//! Exchange port for discovering and invoking remote agents.

use crate::bridge::domain::{
    ActionDescriptor, AgentId, DiscoveryFilter, ExchangeConfig, ToolInvocation,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;

/// Result type for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Connection to the agent exchange.
///
/// One connection is shared by every discovery query, catalog fetch and
/// action invocation for the lifetime of the bridge.
#[async_trait]
pub trait AgentExchange: Send + Sync {
    /// Returns the live agents selected by `filter`.
    async fn discover(&self, filter: &DiscoveryFilter) -> ExchangeResult<HashSet<AgentId>>;

    /// Fetches the action catalog of one agent.
    async fn describe(&self, agent_id: AgentId) -> ExchangeResult<Vec<ActionDescriptor>>;

    /// Invokes `action` on one agent and waits for its result.
    async fn invoke(
        &self,
        agent_id: AgentId,
        action: &str,
        invocation: ToolInvocation,
    ) -> ExchangeResult<Value>;

    /// Releases the connection. Later operations fail with
    /// [`ExchangeError::Closed`].
    async fn close(&self) -> ExchangeResult<()>;
}

/// Opens exchange connections from resolved settings.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    /// Connection type produced by this connector.
    type Exchange: AgentExchange + 'static;

    /// Opens a connection to the exchange described by `config`.
    async fn connect(&self, config: &ExchangeConfig) -> ExchangeResult<Self::Exchange>;
}

/// Reference to one remote agent, bound to an exchange connection.
///
/// Holding a handle does not keep the agent alive; it only remembers where
/// to send requests.
pub struct AgentHandle<E: ?Sized> {
    agent_id: AgentId,
    exchange: Arc<E>,
}

impl<E> AgentHandle<E>
where
    E: AgentExchange + ?Sized,
{
    /// Creates a handle for `agent_id` on `exchange`.
    #[must_use]
    pub const fn new(agent_id: AgentId, exchange: Arc<E>) -> Self {
        Self { agent_id, exchange }
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Fetches the agent's action catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError`] when the agent is unreachable or the
    /// exchange fails.
    pub async fn describe(&self) -> ExchangeResult<Vec<ActionDescriptor>> {
        self.exchange.describe(self.agent_id).await
    }

    /// Invokes `action` on the agent.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError`] when the agent is unreachable, the action
    /// fails remotely, or the exchange fails.
    pub async fn action(&self, action: &str, invocation: ToolInvocation) -> ExchangeResult<Value> {
        self.exchange.invoke(self.agent_id, action, invocation).await
    }
}

impl<E: ?Sized> Clone for AgentHandle<E> {
    fn clone(&self) -> Self {
        Self {
            agent_id: self.agent_id,
            exchange: Arc::clone(&self.exchange),
        }
    }
}

impl<E: ?Sized> PartialEq for AgentHandle<E> {
    fn eq(&self, other: &Self) -> bool {
        self.agent_id == other.agent_id
    }
}

impl<E: ?Sized> Eq for AgentHandle<E> {}

impl<E: ?Sized> Hash for AgentHandle<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.agent_id.hash(state);
    }
}

impl<E: ?Sized> fmt::Debug for AgentHandle<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AgentHandle")
            .field("agent_id", &self.agent_id)
            .finish_non_exhaustive()
    }
}

/// Errors returned by exchange adapters.
#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    /// No mailbox was ever created for the agent.
    #[error("agent {0} is not known to the exchange")]
    UnknownAgent(AgentId),

    /// The agent's mailbox has been closed because the agent terminated.
    #[error("mailbox of agent {0} has been terminated")]
    MailboxTerminated(AgentId),

    /// The agent does not expose the requested action.
    #[error("agent {agent_id} has no action named '{action}'")]
    UnknownAction {
        /// Agent that received the request.
        agent_id: AgentId,
        /// Requested action.
        action: String,
    },

    /// The action ran and raised an error on the agent.
    #[error("action '{action}' failed on agent {agent_id}: {message}")]
    ActionFailed {
        /// Agent that ran the action.
        agent_id: AgentId,
        /// Failed action.
        action: String,
        /// Remote failure message.
        message: String,
    },

    /// The connection has been closed.
    #[error("exchange connection is closed")]
    Closed,

    /// Transport or exchange-side failure.
    #[error("exchange transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl ExchangeError {
    /// Wraps a transport failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns whether the target agent can no longer receive messages.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::UnknownAgent(_) | Self::MailboxTerminated(_))
    }
}
