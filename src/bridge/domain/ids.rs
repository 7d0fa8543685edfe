//! Identifier types for agents and the tools generated from them.

use super::BridgeDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier of an agent on the exchange.
///
/// Identifiers are stable for the lifetime of the agent and globally unique,
/// which is what keeps generated tool names collision free.
///
/// # Examples
///
/// ```
/// use switchboard::bridge::domain::AgentId;
///
/// let id: AgentId = "67e55044-10b1-426f-9247-bb680e5fe0c8"
///     .parse()
///     .expect("valid agent id");
/// assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Creates a new random agent identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an agent identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for AgentId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = BridgeDomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|_| BridgeDomainError::InvalidAgentId(trimmed.to_owned()))
    }
}

/// Name under which a tool is registered with the tool server.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolName(String);

impl ToolName {
    /// Creates a tool name from free text.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError::EmptyToolName`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, BridgeDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(BridgeDomainError::EmptyToolName);
        }
        Ok(Self(normalized))
    }

    /// Derives the proxy tool name `<agent_id>_<action>`.
    ///
    /// `action` is expected to be a validated action name.
    #[must_use]
    pub fn for_action(agent_id: AgentId, action: &str) -> Self {
        Self(format!("{agent_id}_{action}"))
    }

    pub(super) fn from_static(value: &'static str) -> Self {
        Self(value.to_owned())
    }

    /// Returns the tool name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ToolName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
