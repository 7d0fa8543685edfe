//! Discovery query over the exchange.

use crate::bridge::{
    domain::{AgentId, DiscoveryFilter},
    ports::{AgentExchange, ExchangeError},
};
use std::collections::BTreeSet;
use thiserror::Error;

/// Error raised when the exchange cannot answer a discovery query.
#[derive(Debug, Error)]
#[error("agent discovery for class '{class_name}' failed: {source}")]
pub struct DiscoveryError {
    class_name: String,
    #[source]
    source: ExchangeError,
}

impl DiscoveryError {
    /// Returns the class name the failed query asked for.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// Returns the live agents matching `filter`, in identifier order.
///
/// # Errors
///
/// Returns [`DiscoveryError`] when the exchange query fails.
pub async fn discover_agents<E>(
    exchange: &E,
    filter: &DiscoveryFilter,
) -> Result<BTreeSet<AgentId>, DiscoveryError>
where
    E: AgentExchange + ?Sized,
{
    exchange
        .discover(filter)
        .await
        .map(|found| found.into_iter().collect())
        .map_err(|source| DiscoveryError {
            class_name: filter.class_name().to_owned(),
            source,
        })
}
