//! Agents and wiring shared by the bridge unit tests.

use crate::bridge::{
    adapters::memory::{InMemoryAgent, InMemoryExchange, InMemoryExchangeClient, InMemoryToolServer},
    domain::{ActionDescriptor, AgentCapability, QualifiedClass},
};
use serde_json::Value;
use std::sync::Arc;

/// Agent with a single `identity` action echoing its first argument.
pub(crate) fn identity_agent() -> InMemoryAgent {
    let class = QualifiedClass::new("tests.agents", "IdentityAgent").expect("valid class");
    let identity = ActionDescriptor::new("identity", "Echo the provided value.", "(value: T) -> T")
        .expect("valid descriptor");
    InMemoryAgent::new(AgentCapability::new(class)).with_action(identity, |invocation| {
        invocation
            .args
            .into_iter()
            .next()
            .or_else(|| invocation.kwargs.get("value").cloned())
            .ok_or_else(|| "identity expects a value".to_owned())
    })
}

/// Agent with `alpha` and `beta` actions that always return `null`.
pub(crate) fn two_action_agent() -> InMemoryAgent {
    let class = QualifiedClass::new("tests.agents", "PairAgent").expect("valid class");
    ["alpha", "beta"]
        .into_iter()
        .fold(InMemoryAgent::new(AgentCapability::new(class)), |agent, name| {
            let descriptor = ActionDescriptor::new(name, "", "").expect("valid descriptor");
            agent.with_action(descriptor, |_| Ok(Value::Null))
        })
}

/// In-memory exchange, one client connection, and an empty tool server.
pub(crate) struct Harness {
    pub(crate) exchange: InMemoryExchange,
    pub(crate) client: Arc<InMemoryExchangeClient>,
    pub(crate) server: Arc<InMemoryToolServer>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let exchange = InMemoryExchange::new();
        let client = Arc::new(exchange.client());
        Self {
            exchange,
            client,
            server: Arc::new(InMemoryToolServer::new()),
        }
    }
}
