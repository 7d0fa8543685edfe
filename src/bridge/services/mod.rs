//! Application services wiring the exchange to the tool server.

mod discovery;
mod dispatch;
mod lifespan;
mod proxy;
mod reconcile;
mod registrar;

pub use discovery::{DiscoveryError, discover_agents};
pub use dispatch::{ToolCallError, ToolDispatcher};
pub use lifespan::{BridgeContext, BridgeLifespan, LifespanError};
pub use proxy::{ActionProxyFactory, AdaptError, InvocationError, ToolDescriptions};
pub use reconcile::{CycleReport, ReconciliationCancelled, ReconciliationLoop};
pub use registrar::{OnDemandRegistrar, RegistrationError};
