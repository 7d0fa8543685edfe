//! Agent class lineage and the filters used to discover agents.
//!
//! Every agent declares the class it was launched from plus that class's
//! ancestors. All agents implicitly descend from [`ROOT_AGENT_CLASS`], so the
//! default filter selects the whole population.

use super::BridgeDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the class every agent descends from.
pub const ROOT_AGENT_CLASS: &str = "Agent";

/// Module declaring [`ROOT_AGENT_CLASS`].
pub const ROOT_AGENT_MODULE: &str = "switchboard.agent";

/// Fully qualified agent class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedClass {
    module: String,
    name: String,
}

impl QualifiedClass {
    /// Creates a qualified class name.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError::EmptyModuleName`] or
    /// [`BridgeDomainError::EmptyClassName`] when either part is blank.
    pub fn new(
        module: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, BridgeDomainError> {
        let normalized_module = module.into().trim().to_owned();
        if normalized_module.is_empty() {
            return Err(BridgeDomainError::EmptyModuleName);
        }
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(BridgeDomainError::EmptyClassName);
        }

        Ok(Self {
            module: normalized_module,
            name: normalized_name,
        })
    }

    /// Returns the root agent class.
    #[must_use]
    pub fn root() -> Self {
        Self {
            module: ROOT_AGENT_MODULE.to_owned(),
            name: ROOT_AGENT_CLASS.to_owned(),
        }
    }

    /// Returns the declaring module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the bare class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for QualifiedClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.module, self.name)
    }
}

/// Declared class and ancestry of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCapability {
    class: QualifiedClass,
    ancestors: Vec<QualifiedClass>,
}

impl AgentCapability {
    /// Creates a capability for an agent launched from `class`.
    #[must_use]
    pub const fn new(class: QualifiedClass) -> Self {
        Self {
            class,
            ancestors: Vec::new(),
        }
    }

    /// Replaces the explicit ancestor list, nearest ancestor first.
    #[must_use]
    pub fn with_ancestors(mut self, ancestors: impl IntoIterator<Item = QualifiedClass>) -> Self {
        self.ancestors = ancestors.into_iter().collect();
        self
    }

    /// Returns the declared class.
    #[must_use]
    pub const fn class(&self) -> &QualifiedClass {
        &self.class
    }

    /// Returns the explicit ancestors, excluding the implicit root.
    #[must_use]
    pub fn ancestors(&self) -> &[QualifiedClass] {
        &self.ancestors
    }
}

/// Filter selecting agents by declared class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryFilter {
    class_name: String,
    module: Option<String>,
    allow_subclasses: bool,
}

impl DiscoveryFilter {
    /// Creates a subclass-inclusive filter for `class_name` in any module.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError::EmptyClassName`] when the class name is
    /// blank.
    pub fn new(class_name: impl Into<String>) -> Result<Self, BridgeDomainError> {
        let normalized = class_name.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(BridgeDomainError::EmptyClassName);
        }

        Ok(Self {
            class_name: normalized,
            module: None,
            allow_subclasses: true,
        })
    }

    /// Restricts matches to classes declared in `module`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError::EmptyModuleName`] when the module is
    /// blank.
    pub fn with_module(mut self, module: impl Into<String>) -> Result<Self, BridgeDomainError> {
        let normalized = module.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(BridgeDomainError::EmptyModuleName);
        }
        self.module = Some(normalized);
        Ok(self)
    }

    /// Sets whether subclasses of the filtered class also match.
    #[must_use]
    pub const fn with_subclasses(mut self, allow_subclasses: bool) -> Self {
        self.allow_subclasses = allow_subclasses;
        self
    }

    /// Returns the filtered class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the optional module restriction.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Returns whether subclasses match.
    #[must_use]
    pub const fn allow_subclasses(&self) -> bool {
        self.allow_subclasses
    }

    /// Returns whether an agent with `capability` is selected.
    #[must_use]
    pub fn matches(&self, capability: &AgentCapability) -> bool {
        if self.matches_class(capability.class()) {
            return true;
        }
        if !self.allow_subclasses {
            return false;
        }

        let root = QualifiedClass::root();
        capability
            .ancestors()
            .iter()
            .chain(std::iter::once(&root))
            .any(|ancestor| self.matches_class(ancestor))
    }

    fn matches_class(&self, class: &QualifiedClass) -> bool {
        class.name() == self.class_name
            && self
                .module
                .as_deref()
                .is_none_or(|module| module == class.module())
    }
}

impl Default for DiscoveryFilter {
    fn default() -> Self {
        Self {
            class_name: ROOT_AGENT_CLASS.to_owned(),
            module: None,
            allow_subclasses: true,
        }
    }
}
