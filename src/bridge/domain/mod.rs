//! Domain model for bridging exchange agents to tool-server tools.
//!
//! The bridge domain models agent identity and class lineage, the action
//! catalog an agent publishes, the tool definitions derived from it, the
//! cumulative set of known agents, and exchange connection settings.
//! Infrastructure concerns remain outside this boundary.

mod action;
mod capability;
mod config;
mod error;
mod ids;
mod known;
mod tool;

pub use action::{ActionDescriptor, ActionTarget};
pub use capability::{
    AgentCapability, DiscoveryFilter, QualifiedClass, ROOT_AGENT_CLASS, ROOT_AGENT_MODULE,
};
pub use config::{
    AuthMethod, DEFAULT_REFRESH_INTERVAL, EXCHANGE_ADDRESS_ENV, EXCHANGE_AUTH_ENV, ExchangeConfig,
    REFRESH_INTERVAL_ENV,
};
pub use error::{BridgeDomainError, ConfigurationError};
pub use ids::{AgentId, ToolName};
pub use known::KnownAgents;
pub use tool::{
    AddAgentArguments, ControlTool, DiscoverAgentsArguments, ToolDefinition, ToolInvocation,
    ToolTarget,
};
