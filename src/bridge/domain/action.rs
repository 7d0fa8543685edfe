//! Action descriptors published by agents.

use super::{AgentId, BridgeDomainError};
use serde::{Deserialize, Serialize};

/// Describes one remotely callable action of an agent.
///
/// Deserialization applies the same validation as [`ActionDescriptor::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawActionDescriptor")]
pub struct ActionDescriptor {
    name: String,
    doc: String,
    type_signature: String,
}

impl ActionDescriptor {
    /// Creates an action descriptor.
    ///
    /// The name is trimmed and must be a single non-empty token because it
    /// becomes part of the generated tool name. Documentation and signature
    /// are trimmed and may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError::EmptyActionName`] or
    /// [`BridgeDomainError::InvalidActionName`] when the name is unusable.
    pub fn new(
        name: impl Into<String>,
        doc: impl Into<String>,
        type_signature: impl Into<String>,
    ) -> Result<Self, BridgeDomainError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(BridgeDomainError::EmptyActionName);
        }
        if normalized_name.chars().any(char::is_whitespace) {
            return Err(BridgeDomainError::InvalidActionName(normalized_name));
        }

        Ok(Self {
            name: normalized_name,
            doc: doc.into().trim().to_owned(),
            type_signature: type_signature.into().trim().to_owned(),
        })
    }

    /// Returns the action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the action documentation.
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Returns the rendered type signature.
    #[must_use]
    pub fn type_signature(&self) -> &str {
        &self.type_signature
    }
}

#[derive(Deserialize)]
struct RawActionDescriptor {
    name: String,
    #[serde(default)]
    doc: String,
    #[serde(default)]
    type_signature: String,
}

impl TryFrom<RawActionDescriptor> for ActionDescriptor {
    type Error = BridgeDomainError;

    fn try_from(raw: RawActionDescriptor) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.doc, raw.type_signature)
    }
}

/// Remote action a proxy tool forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionTarget {
    agent_id: AgentId,
    action: String,
}

impl ActionTarget {
    /// Creates an action target.
    #[must_use]
    pub fn new(agent_id: AgentId, action: impl Into<String>) -> Self {
        Self {
            agent_id,
            action: action.into(),
        }
    }

    /// Returns the agent hosting the action.
    #[must_use]
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Returns the action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}
