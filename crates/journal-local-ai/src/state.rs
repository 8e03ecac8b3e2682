//! Process-wide service state shared between the health monitor and handlers.

use std::sync::atomic::{AtomicBool, Ordering};

/// State of the chat backend for the lifetime of the host process.
///
/// `available` is written by the [`HealthMonitor`](crate::HealthMonitor)
/// only and read by any number of request handlers. Reads never block.
#[derive(Debug)]
pub struct ServiceState {
    model: String,
    use_external_binary: bool,
    available: AtomicBool,
}

impl ServiceState {
    /// Create a new state. The service starts out unavailable.
    pub fn new(model: impl Into<String>, use_external_binary: bool) -> Self {
        Self {
            model: model.into(),
            use_external_binary,
            available: AtomicBool::new(false),
        }
    }

    /// Model identifier fixed at initialization.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the service runs against a locally launched binary.
    pub fn use_external_binary(&self) -> bool {
        self.use_external_binary
    }

    /// Outcome of the most recent health probe.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Record the outcome of a health probe. Returns the previous value.
    pub fn record_probe(&self, healthy: bool) -> bool {
        self.available.swap(healthy, Ordering::AcqRel)
    }
}
