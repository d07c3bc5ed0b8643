//! API server state.

use std::sync::Arc;

use fleet_config::FleetConfig;
use power_runtime_interface::PowerRuntime;

/// Shared state for the API server.
///
/// The fleet config is built once at startup and never mutated, so
/// handlers read it through the `Arc` with no locking.
#[derive(Clone)]
pub struct ApiState {
    /// Loaded fleet configuration.
    pub fleet: Arc<FleetConfig>,
    /// Power runtime used to reach BMCs.
    pub runtime: Arc<dyn PowerRuntime>,
}

impl ApiState {
    /// Create new API state.
    pub fn new(fleet: Arc<FleetConfig>, runtime: Arc<dyn PowerRuntime>) -> Self {
        Self { fleet, runtime }
    }
}
