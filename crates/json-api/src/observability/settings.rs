//! Runtime knobs read by the request middleware on every request.

use std::sync::OnceLock;

use crate::config::ServerConfig;

static RUNTIME: OnceLock<RuntimeSettings> = OnceLock::new();

/// Snapshot of the logging config taken once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct RuntimeSettings {
    pub slow_request_threshold_ms: u64,
    pub parent_propagation: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            slow_request_threshold_ms: 1_000,
            parent_propagation: false,
        }
    }
}

impl RuntimeSettings {
    fn from_config(config: &ServerConfig) -> Self {
        Self {
            slow_request_threshold_ms: config.logging.slow_request_threshold_ms,
            // Remote parents only make sense when spans are exported.
            parent_propagation: config.observability.otel_enabled
                && config.observability.otel_parent_propagation_enabled,
        }
    }
}

/// First call wins; later calls are ignored.
pub(super) fn apply_runtime_config(config: &ServerConfig) {
    let _already_set = RUNTIME.set(RuntimeSettings::from_config(config));
}

pub(super) fn current() -> RuntimeSettings {
    RUNTIME.get().copied().unwrap_or_default()
}
