//! Immediate registration of a single agent, bypassing the refresh interval.

use super::proxy::{ActionProxyFactory, AdaptError, ToolDescriptions};
use crate::bridge::{
    domain::{AgentId, KnownAgents},
    ports::{AgentExchange, ExchangeError, ToolServer},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors raised by on-demand registration.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The exchange could not describe the agent.
    #[error("agent {agent_id} could not be reached: {source}")]
    UnknownAgent {
        /// Requested agent.
        agent_id: AgentId,
        /// Exchange failure.
        #[source]
        source: ExchangeError,
    },
    /// Adaptation failed after the catalog was fetched.
    #[error(transparent)]
    Adapt(AdaptError),
}

impl From<AdaptError> for RegistrationError {
    fn from(err: AdaptError) -> Self {
        match err {
            AdaptError::CatalogFetch { agent_id, source } => Self::UnknownAgent { agent_id, source },
            other => Self::Adapt(other),
        }
    }
}

/// Registers named agents immediately and records them as known.
pub struct OnDemandRegistrar<E, S, C>
where
    E: AgentExchange,
    S: ToolServer,
    C: Clock + Send + Sync,
{
    factory: ActionProxyFactory<E, S>,
    known: KnownAgents,
    clock: Arc<C>,
}

impl<E, S, C> Clone for OnDemandRegistrar<E, S, C>
where
    E: AgentExchange,
    S: ToolServer,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            known: self.known.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<E, S, C> OnDemandRegistrar<E, S, C>
where
    E: AgentExchange,
    S: ToolServer,
    C: Clock + Send + Sync,
{
    /// Creates a registrar sharing `known` with the reconciliation loop.
    #[must_use]
    pub const fn new(factory: ActionProxyFactory<E, S>, known: KnownAgents, clock: Arc<C>) -> Self {
        Self {
            factory,
            known,
            clock,
        }
    }

    /// Adapts `agent_id` now and marks it known once its tools are
    /// registered, so later reconciliation cycles skip it.
    ///
    /// Registering an agent that is already known adapts it again; the
    /// overwrite semantics of the tool server keep that harmless.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::UnknownAgent`] when the agent's catalog
    /// cannot be fetched, leaving the known set unchanged, or
    /// [`RegistrationError::Adapt`] for other adaptation failures.
    pub async fn register_now(
        &self,
        agent_id: AgentId,
    ) -> Result<ToolDescriptions, RegistrationError> {
        let registered = self.factory.adapt(&self.factory.handle(agent_id)).await?;
        let newly_known = self.known.insert(agent_id, self.clock.utc());
        info!(%agent_id, newly_known, tools = registered.len(), "registered agent on demand");
        Ok(registered)
    }
}
