//! Background liveness polling of llama-server.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::LlamaCppClient;
use crate::state::ServiceState;
use crate::DEFAULT_HEALTH_INTERVAL;

/// Outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Up,
    Down,
}

/// Periodically probes `GET /health` and records the result in
/// [`ServiceState`].
///
/// The monitor is the only writer of the availability flag. A failed
/// probe marks the service down and the loop carries on.
pub struct HealthMonitor {
    client: LlamaCppClient,
    state: Arc<ServiceState>,
    interval: Duration,
}

impl HealthMonitor {
    /// Create a monitor probing through `client`.
    pub fn new(client: LlamaCppClient, state: Arc<ServiceState>) -> Self {
        Self {
            client,
            state,
            interval: DEFAULT_HEALTH_INTERVAL,
        }
    }

    /// Set the time between probes.
    ///
    /// A zero interval keeps [`DEFAULT_HEALTH_INTERVAL`].
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!(
                "Ignoring zero health check interval, using {:?}",
                DEFAULT_HEALTH_INTERVAL
            );
            self.interval = DEFAULT_HEALTH_INTERVAL;
        } else {
            self.interval = interval;
        }
        self
    }

    /// Time between probes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one probe and record its outcome.
    ///
    /// The probe times out after one interval, so a hung server cannot
    /// hold more than one request open at a time.
    pub async fn probe(&self) -> HealthStatus {
        let status = match self.client.check_health(self.interval).await {
            Ok(()) => HealthStatus::Up,
            Err(e) => {
                debug!("{}", e);
                HealthStatus::Down
            }
        };

        let was_up = self.state.record_probe(status == HealthStatus::Up);
        match (was_up, status) {
            (false, HealthStatus::Up) => info!("llama-server health check SUCCESS"),
            (true, HealthStatus::Down) => warn!("llama-server health check FAIL"),
            _ => debug!("llama-server health: {:?}", status),
        }

        status
    }

    /// Probe forever. Only returns if the task is aborted.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.probe().await;
        }
    }

    /// Spawn [`run`](Self::run) onto the current Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        debug!(
            "Starting health monitor for {} every {:?}",
            self.client.base_url(),
            self.interval
        );
        tokio::spawn(self.run())
    }
}
