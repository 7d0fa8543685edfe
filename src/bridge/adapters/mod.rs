//! Adapter implementations for the bridge ports.

pub mod memory;
