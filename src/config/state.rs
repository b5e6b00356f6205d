// Application state module
// Shared, injected runtime state for request handling

use super::types::Config;
use crate::health::HealthState;
use crate::metrics::Metrics;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Status reported by `/health`, changed by POST requests
    pub health: HealthState,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            health: HealthState::default(),
            metrics: Metrics::new(env!("CARGO_PKG_VERSION")),
        }
    }
}
