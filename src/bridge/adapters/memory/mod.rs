//! In-memory adapters for the exchange and tool server ports.

mod exchange;
mod tool_server;

pub use exchange::{
    ActionHandler, InMemoryAgent, InMemoryExchange, InMemoryExchangeClient,
    InMemoryExchangeConnector,
};
pub use tool_server::InMemoryToolServer;
