//! Port contracts for the exchange and the tool server.

mod exchange;
mod tool_server;

pub use exchange::{AgentExchange, AgentHandle, ExchangeConnector, ExchangeError, ExchangeResult};
pub use tool_server::{ToolServer, ToolServerError, ToolServerResult};
