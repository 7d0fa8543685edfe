//! Cumulative set of agents whose tools have been (or are being) adapted.

use super::AgentId;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared set of agents already claimed for adaptation.
///
/// Entries are never removed: an agent that terminates keeps its entry, so a
/// reissued identifier would not be rescanned. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct KnownAgents {
    seen: Arc<Mutex<HashMap<AgentId, DateTime<Utc>>>>,
}

impl KnownAgents {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `agent_id`, returning `false` when it was already known.
    pub fn insert(&self, agent_id: AgentId, seen_at: DateTime<Utc>) -> bool {
        let mut seen = self.lock();
        if seen.contains_key(&agent_id) {
            return false;
        }
        seen.insert(agent_id, seen_at);
        true
    }

    /// Claims every agent of `population` not yet known.
    ///
    /// The diff and the insertions happen under one lock, so a claimed
    /// agent can never be returned by a later call. The result is sorted.
    pub fn claim_new<'a>(
        &self,
        population: impl IntoIterator<Item = &'a AgentId>,
        seen_at: DateTime<Utc>,
    ) -> Vec<AgentId> {
        let mut seen = self.lock();
        let claimed: BTreeSet<AgentId> = population
            .into_iter()
            .copied()
            .filter(|agent_id| !seen.contains_key(agent_id))
            .collect();
        for agent_id in &claimed {
            seen.insert(*agent_id, seen_at);
        }
        claimed.into_iter().collect()
    }

    /// Returns whether `agent_id` is known.
    #[must_use]
    pub fn contains(&self, agent_id: AgentId) -> bool {
        self.lock().contains_key(&agent_id)
    }

    /// Returns when `agent_id` was first recorded.
    #[must_use]
    pub fn first_seen(&self, agent_id: AgentId) -> Option<DateTime<Utc>> {
        self.lock().get(&agent_id).copied()
    }

    /// Returns the number of known agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether no agent is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a sorted copy of the known identifiers.
    #[must_use]
    pub fn snapshot(&self) -> BTreeSet<AgentId> {
        self.lock().keys().copied().collect()
    }

    // Critical sections never panic part-way through an update, so a
    // poisoned lock still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<AgentId, DateTime<Utc>>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
