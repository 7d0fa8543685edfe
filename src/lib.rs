//! Switchboard: exposes exchange-hosted agents as tool-server tools.
//!
//! Agents on an agent exchange publish typed remote actions. Switchboard
//! discovers those agents, registers one tool per action with a tool
//! server, and forwards tool calls to the agents. New agents are picked up
//! by a periodic reconciliation loop or registered on demand; tools of
//! departed agents are removed the first time a call cannot reach them.
//!
//! # Architecture
//!
//! Switchboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for the exchange and tool server
//! - **Adapters**: Concrete implementations of ports (in-memory)
//! - **Services**: Adaptation, reconciliation and lifecycle orchestration
//!
//! # Modules
//!
//! - [`bridge`]: Agent discovery, tool adaptation and the bridge lifespan

pub mod bridge;
