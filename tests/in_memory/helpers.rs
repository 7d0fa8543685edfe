//! Shared fixtures for in-memory bridge integration tests.

use eyre::{Result, WrapErr};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use switchboard::bridge::{
    adapters::memory::{
        InMemoryAgent, InMemoryExchange, InMemoryExchangeClient, InMemoryExchangeConnector,
        InMemoryToolServer,
    },
    domain::{
        ActionDescriptor, AgentCapability, DiscoveryFilter, ExchangeConfig, QualifiedClass,
    },
    services::BridgeLifespan,
};

/// Bridge lifespan over the in-memory adapters.
pub type TestLifespan = BridgeLifespan<InMemoryExchangeClient, InMemoryToolServer, DefaultClock>;

/// Exchange, connector and tool server shared by one test.
pub struct Environment {
    /// Population the bridge observes.
    pub exchange: InMemoryExchange,
    /// Connector handing out connections to `exchange`.
    pub connector: InMemoryExchangeConnector,
    /// Tool server the bridge registers into.
    pub server: Arc<InMemoryToolServer>,
}

impl Environment {
    /// Starts a bridge refreshing every `interval`.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or startup fails.
    pub async fn start(&self, interval: Duration) -> Result<TestLifespan> {
        let config = exchange_config()?
            .with_refresh_interval(interval)
            .wrap_err("refresh interval should be accepted")?;
        self.start_with(config).await
    }

    /// Starts a bridge whose loop matches no agent, so tools only appear
    /// through on-demand registration.
    ///
    /// # Errors
    ///
    /// Returns an error when startup fails.
    pub async fn start_on_demand_only(&self) -> Result<TestLifespan> {
        let filter = DiscoveryFilter::new("UnclaimedClass")?.with_subclasses(false);
        self.start_with(exchange_config()?.with_filter(filter)).await
    }

    /// Starts a bridge with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when startup fails.
    pub async fn start_with(&self, config: ExchangeConfig) -> Result<TestLifespan> {
        BridgeLifespan::start(
            &self.connector,
            config,
            Arc::clone(&self.server),
            Arc::new(DefaultClock),
        )
        .await
        .wrap_err("bridge should start")
    }
}

/// Provides a fresh exchange and tool server for each test.
#[fixture]
pub fn environment() -> Environment {
    let exchange = InMemoryExchange::new();
    Environment {
        connector: InMemoryExchangeConnector::new(exchange.clone()),
        exchange,
        server: Arc::new(InMemoryToolServer::new()),
    }
}

/// Returns settings pointing at a local exchange.
///
/// # Errors
///
/// Returns an error if the address is rejected.
pub fn exchange_config() -> Result<ExchangeConfig> {
    ExchangeConfig::new("http://127.0.0.1:8700").wrap_err("address should be valid")
}

/// Builds an agent whose `identity` action returns its argument.
///
/// # Errors
///
/// Returns an error if the class or descriptor is invalid.
pub fn identity_agent() -> Result<InMemoryAgent> {
    let class = QualifiedClass::new("demo.agents", "IdentityAgent")?;
    let identity = ActionDescriptor::new(
        "identity",
        "Return the value unchanged.",
        "(value: Any) -> Any",
    )?;
    Ok(
        InMemoryAgent::new(AgentCapability::new(class)).with_action(identity, |invocation| {
            invocation
                .args
                .into_iter()
                .next()
                .or_else(|| invocation.kwargs.get("value").cloned())
                .ok_or_else(|| "missing value".to_owned())
        }),
    )
}

/// Builds a calculator agent deriving from `demo.agents.MathAgent`.
///
/// # Errors
///
/// Returns an error if the class or descriptors are invalid.
pub fn calculator_agent() -> Result<InMemoryAgent> {
    let class = QualifiedClass::new("demo.agents", "Calculator")?;
    let parent = QualifiedClass::new("demo.agents", "MathAgent")?;
    let add = ActionDescriptor::new("add", "Add two integers.", "(a: int, b: int) -> int")?;
    let negate = ActionDescriptor::new("negate", "Negate an integer.", "(a: int) -> int")?;
    Ok(
        InMemoryAgent::new(AgentCapability::new(class).with_ancestors([parent]))
            .with_action(add, |invocation| {
                let operand = |name: &str| {
                    invocation
                        .kwargs
                        .get(name)
                        .and_then(Value::as_i64)
                        .ok_or_else(|| format!("missing integer '{name}'"))
                };
                Ok(json!(operand("a")? + operand("b")?))
            })
            .with_action(negate, |invocation| {
                invocation
                    .args
                    .first()
                    .and_then(Value::as_i64)
                    .map(|value| json!(-value))
                    .ok_or_else(|| "missing integer".to_owned())
            }),
    )
}
