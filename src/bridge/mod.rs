//! Bridge between an agent exchange and a tool server.
//!
//! Agents running on the exchange publish named actions. The bridge turns
//! every action of every matching agent into a tool definition, keeps the
//! tool server in step with the live population through a periodic
//! reconciliation loop, and forwards tool calls back to the agents.
//!
//! Following hexagonal architecture:
//!
//! - [`domain`]: identifiers, action catalogs, tool definitions and settings
//! - [`ports`]: the exchange and tool server abstractions
//! - [`adapters`]: in-memory implementations of the ports
//! - [`services`]: adaptation, reconciliation, registration and lifecycle

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod test_fixtures;
