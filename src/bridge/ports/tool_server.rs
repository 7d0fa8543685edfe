//! Tool server port holding the tools exposed to tool-calling clients.

use crate::bridge::domain::{ToolDefinition, ToolName};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for tool server operations.
pub type ToolServerResult<T> = Result<T, ToolServerError>;

/// Registry of invocable tools, keyed by name.
///
/// Each operation is atomic on its own; no transaction spans several names.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Adds a tool, replacing any tool registered under the same name.
    async fn add_tool(&self, tool: ToolDefinition) -> ToolServerResult<()>;

    /// Removes a tool, returning it when it was registered.
    async fn remove_tool(&self, name: &ToolName) -> ToolServerResult<Option<ToolDefinition>>;

    /// Finds a tool by name.
    async fn get_tool(&self, name: &ToolName) -> ToolServerResult<Option<ToolDefinition>>;

    /// Returns every registered tool.
    async fn list_tools(&self) -> ToolServerResult<Vec<ToolDefinition>>;
}

/// Errors returned by tool server adapters.
#[derive(Debug, Clone, Error)]
pub enum ToolServerError {
    /// The server refused the tool.
    #[error("tool server rejected tool '{name}': {reason}")]
    Rejected {
        /// Rejected tool.
        name: ToolName,
        /// Rejection reason.
        reason: String,
    },

    /// Generic runtime failure.
    #[error("tool server runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ToolServerError {
    /// Wraps a runtime error from the tool server adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
