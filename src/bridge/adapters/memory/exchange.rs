//! In-memory exchange adapter hosting agents inside the current process.
//!
//! [`InMemoryExchange`] plays the role of the exchange itself: agents are
//! launched into it and terminated from it. Bridges talk to it through
//! [`InMemoryExchangeClient`] connections, each of which can be closed
//! independently.

use crate::bridge::{
    domain::{ActionDescriptor, AgentCapability, AgentId, DiscoveryFilter, ExchangeConfig, ToolInvocation},
    ports::{AgentExchange, ExchangeConnector, ExchangeError, ExchangeResult},
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// Synchronous body of an in-memory action.
///
/// Returning `Err` models an exception raised by the remote action.
pub type ActionHandler = Arc<dyn Fn(ToolInvocation) -> Result<Value, String> + Send + Sync>;

#[derive(Clone)]
struct HostedAction {
    descriptor: ActionDescriptor,
    handler: ActionHandler,
}

/// Agent definition that can be launched into an [`InMemoryExchange`].
#[derive(Clone)]
pub struct InMemoryAgent {
    capability: AgentCapability,
    actions: BTreeMap<String, HostedAction>,
}

impl InMemoryAgent {
    /// Creates an agent with no actions.
    #[must_use]
    pub const fn new(capability: AgentCapability) -> Self {
        Self {
            capability,
            actions: BTreeMap::new(),
        }
    }

    /// Adds an action, replacing any action with the same name.
    #[must_use]
    pub fn with_action(
        mut self,
        descriptor: ActionDescriptor,
        handler: impl Fn(ToolInvocation) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.actions.insert(
            descriptor.name().to_owned(),
            HostedAction {
                descriptor,
                handler: Arc::new(handler),
            },
        );
        self
    }

    /// Returns the agent's declared class lineage.
    #[must_use]
    pub const fn capability(&self) -> &AgentCapability {
        &self.capability
    }

    /// Returns the descriptors of all actions, ordered by name.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ActionDescriptor> {
        self.actions
            .values()
            .map(|action| action.descriptor.clone())
            .collect()
    }
}

impl fmt::Debug for InMemoryAgent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("InMemoryAgent")
            .field("capability", &self.capability)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Default)]
struct ExchangeState {
    live: HashMap<AgentId, InMemoryAgent>,
    terminated: HashSet<AgentId>,
    catalog_failures: HashMap<AgentId, String>,
    catalog_delays: HashMap<AgentId, Duration>,
    discovery_outage: Option<String>,
}

/// In-process agent exchange.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExchange {
    state: Arc<RwLock<ExchangeState>>,
}

impl InMemoryExchange {
    /// Creates an exchange with no agents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches `agent` and returns its new identifier.
    ///
    /// # Errors
    ///
    /// Returns exchange transport errors when lock acquisition fails.
    pub fn launch(&self, agent: InMemoryAgent) -> ExchangeResult<AgentId> {
        let agent_id = AgentId::new();
        self.write_state()?.live.insert(agent_id, agent);
        Ok(agent_id)
    }

    /// Terminates a live agent, closing its mailbox.
    ///
    /// Returns `false` when the agent was not live.
    ///
    /// # Errors
    ///
    /// Returns exchange transport errors when lock acquisition fails.
    pub fn terminate(&self, agent_id: AgentId) -> ExchangeResult<bool> {
        let mut state = self.write_state()?;
        if state.live.remove(&agent_id).is_none() {
            return Ok(false);
        }
        state.terminated.insert(agent_id);
        Ok(true)
    }

    /// Makes catalog fetches for `agent_id` fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns exchange transport errors when lock acquisition fails.
    pub fn fail_catalog(&self, agent_id: AgentId, message: impl Into<String>) -> ExchangeResult<()> {
        self.write_state()?
            .catalog_failures
            .insert(agent_id, message.into());
        Ok(())
    }

    /// Delays catalog fetches for `agent_id` by `delay`.
    ///
    /// # Errors
    ///
    /// Returns exchange transport errors when lock acquisition fails.
    pub fn delay_catalog(&self, agent_id: AgentId, delay: Duration) -> ExchangeResult<()> {
        self.write_state()?.catalog_delays.insert(agent_id, delay);
        Ok(())
    }

    /// Makes discovery queries fail with `message` until cleared with `None`.
    ///
    /// # Errors
    ///
    /// Returns exchange transport errors when lock acquisition fails.
    pub fn set_discovery_outage(&self, message: Option<String>) -> ExchangeResult<()> {
        self.write_state()?.discovery_outage = message;
        Ok(())
    }

    /// Opens a new client connection.
    #[must_use]
    pub fn client(&self) -> InMemoryExchangeClient {
        InMemoryExchangeClient {
            exchange: self.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn read_state(&self) -> ExchangeResult<std::sync::RwLockReadGuard<'_, ExchangeState>> {
        self.state
            .read()
            .map_err(|err| ExchangeError::transport(std::io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> ExchangeResult<std::sync::RwLockWriteGuard<'_, ExchangeState>> {
        self.state
            .write()
            .map_err(|err| ExchangeError::transport(std::io::Error::other(err.to_string())))
    }
}

/// Connection to an [`InMemoryExchange`].
#[derive(Debug, Clone)]
pub struct InMemoryExchangeClient {
    exchange: InMemoryExchange,
    closed: Arc<AtomicBool>,
}

impl InMemoryExchangeClient {
    /// Returns whether [`AgentExchange::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> ExchangeResult<()> {
        if self.is_closed() {
            return Err(ExchangeError::Closed);
        }
        Ok(())
    }

    fn unreachable(state: &ExchangeState, agent_id: AgentId) -> ExchangeError {
        if state.terminated.contains(&agent_id) {
            ExchangeError::MailboxTerminated(agent_id)
        } else {
            ExchangeError::UnknownAgent(agent_id)
        }
    }
}

#[async_trait]
impl AgentExchange for InMemoryExchangeClient {
    async fn discover(&self, filter: &DiscoveryFilter) -> ExchangeResult<HashSet<AgentId>> {
        self.ensure_open()?;
        let state = self.exchange.read_state()?;
        if let Some(message) = &state.discovery_outage {
            return Err(ExchangeError::transport(std::io::Error::other(
                message.clone(),
            )));
        }

        Ok(state
            .live
            .iter()
            .filter(|(_, agent)| filter.matches(agent.capability()))
            .map(|(agent_id, _)| *agent_id)
            .collect())
    }

    async fn describe(&self, agent_id: AgentId) -> ExchangeResult<Vec<ActionDescriptor>> {
        self.ensure_open()?;
        let delay = self
            .exchange
            .read_state()?
            .catalog_delays
            .get(&agent_id)
            .copied();
        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }

        let state = self.exchange.read_state()?;
        if let Some(message) = state.catalog_failures.get(&agent_id) {
            return Err(ExchangeError::transport(std::io::Error::other(
                message.clone(),
            )));
        }
        state
            .live
            .get(&agent_id)
            .map(InMemoryAgent::descriptors)
            .ok_or_else(|| Self::unreachable(&state, agent_id))
    }

    async fn invoke(
        &self,
        agent_id: AgentId,
        action: &str,
        invocation: ToolInvocation,
    ) -> ExchangeResult<Value> {
        self.ensure_open()?;
        let handler = {
            let state = self.exchange.read_state()?;
            let agent = state
                .live
                .get(&agent_id)
                .ok_or_else(|| Self::unreachable(&state, agent_id))?;
            agent
                .actions
                .get(action)
                .map(|hosted| Arc::clone(&hosted.handler))
                .ok_or_else(|| ExchangeError::UnknownAction {
                    agent_id,
                    action: action.to_owned(),
                })?
        };

        handler(invocation).map_err(|message| ExchangeError::ActionFailed {
            agent_id,
            action: action.to_owned(),
            message,
        })
    }

    async fn close(&self) -> ExchangeResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Connector handing out [`InMemoryExchangeClient`] connections.
///
/// Every issued connection is retained so callers can check that it was
/// released.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExchangeConnector {
    exchange: InMemoryExchange,
    issued: Arc<Mutex<Vec<InMemoryExchangeClient>>>,
}

impl InMemoryExchangeConnector {
    /// Creates a connector for `exchange`.
    #[must_use]
    pub fn new(exchange: InMemoryExchange) -> Self {
        Self {
            exchange,
            issued: Arc::default(),
        }
    }

    /// Returns every connection issued so far.
    ///
    /// # Errors
    ///
    /// Returns exchange transport errors when lock acquisition fails.
    pub fn issued(&self) -> ExchangeResult<Vec<InMemoryExchangeClient>> {
        let issued = self
            .issued
            .lock()
            .map_err(|err| ExchangeError::transport(std::io::Error::other(err.to_string())))?;
        Ok(issued.clone())
    }
}

#[async_trait]
impl ExchangeConnector for InMemoryExchangeConnector {
    type Exchange = InMemoryExchangeClient;

    async fn connect(&self, _config: &ExchangeConfig) -> ExchangeResult<Self::Exchange> {
        let client = self.exchange.client();
        self.issued
            .lock()
            .map_err(|err| ExchangeError::transport(std::io::Error::other(err.to_string())))?
            .push(client.clone());
        Ok(client)
    }
}
