//! Periodic reconciliation of registered tools against the live population.
//!
//! Each cycle asks the exchange for the agents matching the configured
//! filter, claims the ones not seen before, and spawns one adaptation task
//! per claimed agent. Adaptation runs in the background: a slow catalog
//! fetch never delays the next cycle. The loop owns its tasks, so cancelling
//! or dropping the loop aborts whatever adaptation is still pending.

use super::discovery::discover_agents;
use super::proxy::{ActionProxyFactory, AdaptError, ToolDescriptions};
use crate::bridge::{
    domain::{AgentId, DiscoveryFilter, KnownAgents},
    ports::{AgentExchange, ToolServer},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

type AdaptationOutcome = Result<ToolDescriptions, AdaptError>;

/// Summary of one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// When the cycle began.
    pub started_at: DateTime<Utc>,
    /// Number of live agents the discovery query returned.
    pub discovered: usize,
    /// Newly seen agents whose adaptation was dispatched, in id order.
    pub dispatched: Vec<AgentId>,
}

/// Acknowledgement returned once the loop has observed cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationCancelled {
    /// Adaptation tasks that were still pending and got aborted.
    pub aborted_tasks: usize,
}

/// Background loop keeping the tool server in step with the exchange.
pub struct ReconciliationLoop<E, S, C>
where
    E: AgentExchange + 'static,
    S: ToolServer + 'static,
    C: Clock + Send + Sync,
{
    factory: ActionProxyFactory<E, S>,
    known: KnownAgents,
    filter: DiscoveryFilter,
    clock: Arc<C>,
    tasks: JoinSet<AdaptationOutcome>,
    in_flight: HashMap<Id, AgentId>,
}

impl<E, S, C> ReconciliationLoop<E, S, C>
where
    E: AgentExchange + 'static,
    S: ToolServer + 'static,
    C: Clock + Send + Sync,
{
    /// Creates a loop that discovers agents matching `filter`.
    #[must_use]
    pub fn new(
        factory: ActionProxyFactory<E, S>,
        known: KnownAgents,
        filter: DiscoveryFilter,
        clock: Arc<C>,
    ) -> Self {
        Self {
            factory,
            known,
            filter,
            clock,
            tasks: JoinSet::new(),
            in_flight: HashMap::new(),
        }
    }

    /// Returns the known-agent set shared with this loop.
    #[must_use]
    pub const fn known(&self) -> &KnownAgents {
        &self.known
    }

    /// Returns the number of adaptation tasks not yet reaped.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Runs one discovery and dispatch pass.
    ///
    /// Discovery failures are logged and produce an empty report. Dispatched
    /// agents are marked known before their adaptation starts, so a failed
    /// adaptation is not retried by later cycles.
    pub async fn cycle(&mut self) -> CycleReport {
        let started_at = self.clock.utc();
        self.reap_finished();

        let population = match discover_agents(self.factory.exchange().as_ref(), &self.filter).await
        {
            Ok(population) => population,
            Err(err) => {
                warn!(error = %err, "agent discovery failed; retrying next cycle");
                return CycleReport {
                    started_at,
                    discovered: 0,
                    dispatched: Vec::new(),
                };
            }
        };

        let dispatched = self.known.claim_new(&population, started_at);
        for agent_id in &dispatched {
            self.dispatch(*agent_id);
        }
        debug!(
            discovered = population.len(),
            dispatched = dispatched.len(),
            in_flight = self.tasks.len(),
            "reconciliation cycle finished"
        );

        CycleReport {
            started_at,
            discovered: population.len(),
            dispatched,
        }
    }

    /// Cycles every `interval` until `shutdown` becomes `true` or its sender
    /// is dropped.
    ///
    /// The sleep between cycles does not wait for dispatched adaptation.
    /// On cancellation every pending adaptation task is aborted.
    pub async fn run(
        &mut self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> ReconciliationCancelled {
        info!(interval_secs = interval.as_secs(), "reconciliation loop started");
        loop {
            tokio::select! {
                biased;
                () = shutdown_requested(&mut shutdown) => break,
                _report = self.cycle() => {}
            }
            tokio::select! {
                biased;
                () = shutdown_requested(&mut shutdown) => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        self.reap_finished();
        let aborted_tasks = self.tasks.len();
        self.tasks.shutdown().await;
        self.in_flight.clear();
        info!(aborted_tasks, "reconciliation loop cancelled");
        ReconciliationCancelled { aborted_tasks }
    }

    /// Waits for every dispatched adaptation task and returns how many
    /// finished.
    pub async fn join_in_flight(&mut self) -> usize {
        let mut joined = 0;
        while let Some(finished) = self.tasks.join_next_with_id().await {
            self.record(finished);
            joined += 1;
        }
        joined
    }

    fn dispatch(&mut self, agent_id: AgentId) {
        let factory = self.factory.clone();
        let task = self.tasks.spawn(async move {
            let handle = factory.handle(agent_id);
            factory.adapt(&handle).await
        });
        self.in_flight.insert(task.id(), agent_id);
        info!(%agent_id, "dispatched adaptation for newly seen agent");
    }

    fn reap_finished(&mut self) {
        while let Some(finished) = self.tasks.try_join_next_with_id() {
            self.record(finished);
        }
    }

    fn record(&mut self, finished: Result<(Id, AdaptationOutcome), JoinError>) {
        match finished {
            Ok((task_id, outcome)) => {
                let agent_id = self.in_flight.remove(&task_id);
                match outcome {
                    Ok(tools) => debug!(agent_id = ?agent_id, tools = tools.len(), "adaptation finished"),
                    Err(err) => warn!(agent_id = ?agent_id, error = %err, "adaptation failed"),
                }
            }
            Err(join_error) => {
                let agent_id = self.in_flight.remove(&join_error.id());
                if join_error.is_panic() {
                    error!(agent_id = ?agent_id, "adaptation task panicked");
                } else {
                    debug!(agent_id = ?agent_id, "adaptation task cancelled");
                }
            }
        }
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        debug!("shutdown sender dropped");
    }
}
