//! Process-wide bridge state bound to one exchange connection.
//!
//! [`BridgeLifespan::start`] connects to the exchange, registers the control
//! tools and launches the reconciliation loop. [`BridgeLifespan::stop`]
//! cancels the loop and releases the connection. A lifespan dropped without
//! being stopped still aborts the loop and closes the connection in the
//! background.

use super::discovery::{DiscoveryError, discover_agents};
use super::dispatch::{ToolCallError, ToolDispatcher};
use super::proxy::{ActionProxyFactory, ToolDescriptions};
use super::reconcile::{ReconciliationCancelled, ReconciliationLoop};
use super::registrar::{OnDemandRegistrar, RegistrationError};
use crate::bridge::{
    domain::{
        AgentId, ConfigurationError, ControlTool, DiscoveryFilter, ExchangeConfig, KnownAgents,
        ToolDefinition,
    },
    ports::{AgentExchange, ExchangeConnector, ExchangeError, ToolServer, ToolServerError},
};
use mockable::Clock;
use serde_json::Value;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Errors raised while starting or stopping the bridge.
#[derive(Debug, Error)]
pub enum LifespanError {
    /// Settings could not be resolved.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The exchange connection could not be opened.
    #[error("failed to connect to the exchange: {0}")]
    Connect(#[source] ExchangeError),
    /// The control tools could not be registered.
    #[error("failed to register control tools: {0}")]
    ControlTools(#[from] ToolServerError),
    /// The reconciliation loop task panicked before acknowledging shutdown.
    #[error("reconciliation loop panicked: {0}")]
    RefreshLoopPanicked(String),
    /// The exchange connection could not be closed cleanly.
    #[error("failed to close the exchange connection: {0}")]
    Close(#[source] ExchangeError),
}

/// Shared state handed to tool handlers while the bridge runs.
pub struct BridgeContext<E, S, C>
where
    E: AgentExchange,
    S: ToolServer,
    C: Clock + Send + Sync,
{
    config: ExchangeConfig,
    known: KnownAgents,
    factory: ActionProxyFactory<E, S>,
    registrar: OnDemandRegistrar<E, S, C>,
    dispatcher: ToolDispatcher<E, S, C>,
}

impl<E, S, C> Clone for BridgeContext<E, S, C>
where
    E: AgentExchange,
    S: ToolServer,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            known: self.known.clone(),
            factory: self.factory.clone(),
            registrar: self.registrar.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<E, S, C> BridgeContext<E, S, C>
where
    E: AgentExchange,
    S: ToolServer,
    C: Clock + Send + Sync,
{
    fn new(config: ExchangeConfig, exchange: Arc<E>, server: Arc<S>, clock: Arc<C>) -> Self {
        let known = KnownAgents::new();
        let factory = ActionProxyFactory::new(exchange, server);
        let registrar = OnDemandRegistrar::new(factory.clone(), known.clone(), clock);
        let dispatcher = ToolDispatcher::new(factory.clone(), registrar.clone());
        Self {
            config,
            known,
            factory,
            registrar,
            dispatcher,
        }
    }

    /// Returns the settings the bridge was started with.
    #[must_use]
    pub const fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Returns the agents claimed so far.
    #[must_use]
    pub const fn known(&self) -> &KnownAgents {
        &self.known
    }

    /// Returns the exchange connection.
    #[must_use]
    pub const fn exchange(&self) -> &Arc<E> {
        self.factory.exchange()
    }

    /// Returns the tool server.
    #[must_use]
    pub const fn tool_server(&self) -> &Arc<S> {
        self.factory.tool_server()
    }

    /// Registers `agent_id` immediately.
    ///
    /// # Errors
    ///
    /// See [`OnDemandRegistrar::register_now`].
    pub async fn register_now(
        &self,
        agent_id: AgentId,
    ) -> Result<ToolDescriptions, RegistrationError> {
        self.registrar.register_now(agent_id).await
    }

    /// Lists live agents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] when the exchange query fails.
    pub async fn discover(
        &self,
        filter: &DiscoveryFilter,
    ) -> Result<BTreeSet<AgentId>, DiscoveryError> {
        discover_agents(self.exchange().as_ref(), filter).await
    }

    /// Calls a registered tool.
    ///
    /// # Errors
    ///
    /// See [`ToolDispatcher::call`].
    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolCallError> {
        self.dispatcher.call(name, arguments).await
    }
}

/// Running bridge: an open exchange connection plus the reconciliation loop.
pub struct BridgeLifespan<E, S, C>
where
    E: AgentExchange + 'static,
    S: ToolServer + 'static,
    C: Clock + Send + Sync + 'static,
{
    context: BridgeContext<E, S, C>,
    shutdown: watch::Sender<bool>,
    refresh: Option<JoinHandle<ReconciliationCancelled>>,
    released: bool,
}

impl<E, S, C> BridgeLifespan<E, S, C>
where
    E: AgentExchange + 'static,
    S: ToolServer + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Connects to the exchange, registers the control tools and starts the
    /// reconciliation loop.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`LifespanError::Connect`] when the connection fails or
    /// [`LifespanError::ControlTools`] when the tool server rejects a control
    /// tool; the connection is closed again in the latter case.
    pub async fn start<K>(
        connector: &K,
        config: ExchangeConfig,
        server: Arc<S>,
        clock: Arc<C>,
    ) -> Result<Self, LifespanError>
    where
        K: ExchangeConnector<Exchange = E> + ?Sized,
    {
        let exchange = Arc::new(
            connector
                .connect(&config)
                .await
                .map_err(LifespanError::Connect)?,
        );
        info!(
            address = config.address(),
            auth = ?config.auth_method(),
            "connected to exchange"
        );

        if let Err(err) = register_control_tools(server.as_ref()).await {
            if let Err(close_err) = exchange.close().await {
                warn!(error = %close_err, "failed to close exchange after startup failure");
            }
            return Err(err.into());
        }

        let interval = config.refresh_interval();
        let filter = config.filter().clone();
        let context = BridgeContext::new(config, exchange, server, Arc::clone(&clock));
        let mut reconciliation =
            ReconciliationLoop::new(context.factory.clone(), context.known.clone(), filter, clock);
        let (shutdown, receiver) = watch::channel(false);
        let refresh =
            tokio::spawn(async move { reconciliation.run(interval, receiver).await });

        Ok(Self {
            context,
            shutdown,
            refresh: Some(refresh),
            released: false,
        })
    }

    /// Starts the bridge with settings read from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`LifespanError::Configuration`] when the environment does
    /// not describe a usable exchange, or any error of [`Self::start`].
    pub async fn start_from_env<K>(
        connector: &K,
        server: Arc<S>,
        clock: Arc<C>,
    ) -> Result<Self, LifespanError>
    where
        K: ExchangeConnector<Exchange = E> + ?Sized,
    {
        let config = ExchangeConfig::from_env()?;
        Self::start(connector, config, server, clock).await
    }

    /// Returns the shared bridge state.
    #[must_use]
    pub const fn context(&self) -> &BridgeContext<E, S, C> {
        &self.context
    }

    /// Cancels the reconciliation loop, waits for its acknowledgement and
    /// closes the exchange connection.
    ///
    /// The connection is closed even when the loop task panicked. If the
    /// returned future is dropped before it finishes, the connection is
    /// released as if the lifespan had been dropped without stopping.
    ///
    /// # Errors
    ///
    /// Returns [`LifespanError::RefreshLoopPanicked`] when the loop task
    /// panicked, or [`LifespanError::Close`] when closing fails.
    pub async fn stop(mut self) -> Result<ReconciliationCancelled, LifespanError> {
        self.shutdown.send_replace(true);
        let acknowledged = match self.refresh.as_mut() {
            Some(refresh) => refresh.await,
            None => Ok(ReconciliationCancelled { aborted_tasks: 0 }),
        };
        self.refresh = None;
        let closed = self.context.exchange().close().await;
        self.released = true;
        info!("bridge stopped; exchange connection released");

        let cancelled = acknowledged.map_err(|join_error| {
            error!(error = %join_error, "reconciliation loop panicked");
            LifespanError::RefreshLoopPanicked(join_error.to_string())
        })?;
        closed.map_err(LifespanError::Close)?;
        Ok(cancelled)
    }

    /// Runs `body` with the bridge context, then stops the bridge whatever
    /// the body returned.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Self::stop`]; the body's own result is only
    /// returned when stopping succeeds.
    pub async fn scope<F, Fut, T>(self, body: F) -> Result<T, LifespanError>
    where
        F: FnOnce(BridgeContext<E, S, C>) -> Fut,
        Fut: Future<Output = T>,
    {
        let output = body(self.context.clone()).await;
        self.stop().await?;
        Ok(output)
    }
}

impl<E, S, C> Drop for BridgeLifespan<E, S, C>
where
    E: AgentExchange + 'static,
    S: ToolServer + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let refresh = self.refresh.take();
        if let Some(pending) = &refresh {
            pending.abort();
        }
        warn!("bridge dropped before stop finished; releasing exchange connection in the background");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no Tokio runtime available; exchange connection left open");
            return;
        };
        let exchange = Arc::clone(self.context.exchange());
        drop(runtime.spawn(async move {
            if let Some(aborted) = refresh {
                match aborted.await {
                    Err(join_error) if join_error.is_panic() => {
                        error!(error = %join_error, "reconciliation loop panicked");
                    }
                    _ => {}
                }
            }
            if let Err(err) = exchange.close().await {
                warn!(error = %err, "failed to close exchange connection");
            }
        }));
    }
}

async fn register_control_tools<S>(server: &S) -> Result<(), ToolServerError>
where
    S: ToolServer + ?Sized,
{
    for tool in ControlTool::ALL {
        server.add_tool(ToolDefinition::control(tool)).await?;
    }
    Ok(())
}
