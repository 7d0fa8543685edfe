//! Error types for bridge domain validation and configuration.

use thiserror::Error;

/// Errors returned while constructing bridge domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeDomainError {
    /// The agent identifier is not a valid UUID.
    #[error("invalid agent identifier '{0}'")]
    InvalidAgentId(String),

    /// An action name is empty after trimming.
    #[error("action name must not be empty")]
    EmptyActionName,

    /// An action name contains whitespace.
    #[error("action name '{0}' must not contain whitespace")]
    InvalidActionName(String),

    /// A tool name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// A class name used for discovery is empty after trimming.
    #[error("agent class name must not be empty")]
    EmptyClassName,

    /// A module name used for discovery is empty after trimming.
    #[error("agent module name must not be empty when provided")]
    EmptyModuleName,

    /// Rendering a tool description failed.
    #[error("failed to render description for tool '{tool_name}': {reason}")]
    DescriptionRender {
        /// Tool whose description failed to render.
        tool_name: String,
        /// Template engine failure message.
        reason: String,
    },
}

/// Errors returned while resolving exchange connection settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The exchange address was not provided.
    #[error("exchange address is not configured (set {variable})")]
    MissingExchangeAddress {
        /// Environment variable that should carry the address.
        variable: &'static str,
    },

    /// The exchange address is not an HTTP(S) URL.
    #[error("exchange address '{0}' must start with 'http://' or 'https://'")]
    InvalidExchangeAddress(String),

    /// The requested authentication method is not supported.
    #[error("unsupported exchange authentication method '{0}'")]
    UnsupportedAuthMethod(String),

    /// The refresh interval is not a positive number of seconds.
    #[error("invalid refresh interval '{value}': {reason}")]
    InvalidRefreshInterval {
        /// Raw configured value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}
