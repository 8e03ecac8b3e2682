//! Process manager for llama-server.

use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::LlamaCppClient;
use crate::error::LocalAIError;
use crate::health::HealthMonitor;
use crate::locator::{BinaryLocator, CandidateLocator};
use crate::state::ServiceState;
use crate::{DEFAULT_HEALTH_INTERVAL, DEFAULT_PORT};

/// Manager for the llama-server process and its health monitor.
pub struct LlamaCppServer {
    port: u16,
    health_interval: Duration,
    locator: Box<dyn BinaryLocator>,
    state: Arc<ServiceState>,
    process: Option<Child>,
    binary: Option<PathBuf>,
    monitor: Option<JoinHandle<()>>,
}

impl LlamaCppServer {
    /// Create a new server manager with default settings.
    pub fn new(state: Arc<ServiceState>) -> Self {
        Self {
            port: DEFAULT_PORT,
            health_interval: DEFAULT_HEALTH_INTERVAL,
            locator: Box::new(CandidateLocator::new()),
            state,
            process: None,
            binary: None,
            monitor: None,
        }
    }

    /// Set a custom port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the health probe interval.
    pub fn with_health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = interval;
        self
    }

    /// Replace the binary discovery strategy.
    pub fn with_locator(mut self, locator: impl BinaryLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    /// Get the port this server is configured to use.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path the running binary was started from.
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    /// Start llama-server and the background health monitor.
    ///
    /// Returns once the process has been created; it is not ready yet.
    /// Must be called from within a Tokio runtime.
    pub fn launch(&mut self) -> Result<&Path, LocalAIError> {
        if self.is_running() {
            if let Some(ref process) = self.process {
                return Err(LocalAIError::ServerStartFailed(format!(
                    "llama-server already running (PID: {})",
                    process.id()
                )));
            }
        }

        info!(
            "Starting llama-server on port {} with model {}",
            self.port,
            self.state.model()
        );

        let launched = self.locator.launch(self.state.model(), self.port)?;
        debug!("llama-server process started with PID: {}", launched.child.id());

        self.process = Some(launched.child);
        self.start_monitor();

        Ok(self.binary.insert(launched.path).as_path())
    }

    /// Start the health monitor without launching a process, for a server
    /// managed elsewhere. Does nothing if a monitor is already running.
    pub fn start_monitor(&mut self) {
        if self.monitor.is_some() {
            return;
        }
        let monitor = HealthMonitor::new(self.client(), self.state.clone())
            .with_interval(self.health_interval);
        self.monitor = Some(monitor.spawn());
    }

    /// Wait until the health monitor reports the server up.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), LocalAIError> {
        let start = std::time::Instant::now();
        let check_interval = Duration::from_millis(100);

        info!("Waiting for llama-server to become ready...");

        while start.elapsed() < timeout {
            if self.state.is_available() {
                info!("llama-server is ready");
                return Ok(());
            }
            sleep(check_interval).await;
        }

        Err(LocalAIError::ServerStartTimeout)
    }

    /// Stop the health monitor and the server process.
    ///
    /// Blocks the calling thread for up to [`STOP_GRACE`] while the process
    /// exits. Use [`shutdown`](Self::shutdown) from async code.
    pub fn stop(&mut self) -> Result<(), LocalAIError> {
        self.stop_monitor();

        if let Some(mut child) = self.process.take() {
            info!("Stopping llama-server (PID: {})", child.id());
            terminate(&child);

            #[cfg(unix)]
            std::thread::sleep(STOP_GRACE);

            reap(&mut child);
        }
        self.binary = None;
        Ok(())
    }

    /// Like [`stop`](Self::stop), but waits for the process without
    /// blocking the runtime.
    pub async fn shutdown(&mut self) -> Result<(), LocalAIError> {
        self.stop_monitor();

        if let Some(mut child) = self.process.take() {
            info!("Stopping llama-server (PID: {})", child.id());
            terminate(&child);

            let deadline = tokio::time::Instant::now() + STOP_GRACE;
            while tokio::time::Instant::now() < deadline {
                if let Ok(Some(_)) = child.try_wait() {
                    break;
                }
                sleep(Duration::from_millis(25)).await;
            }

            reap(&mut child);
        }
        self.binary = None;
        Ok(())
    }

    fn stop_monitor(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
            // The monitor can no longer observe the server going away.
            self.state.record_probe(false);
        }
    }

    /// Check if the server process is running.
    pub fn is_running(&mut self) -> bool {
        if let Some(ref mut child) = self.process {
            match child.try_wait() {
                Ok(Some(_)) => {
                    self.process = None;
                    false
                }
                Ok(None) => true,
                Err(_) => false,
            }
        } else {
            false
        }
    }

    /// Get a client connected to this server.
    pub fn client(&self) -> LlamaCppClient {
        LlamaCppClient::with_port(self.port)
    }
}

/// How long a stopping server gets to exit after SIGTERM.
pub const STOP_GRACE: Duration = Duration::from_millis(500);

/// Ask the process to exit. A no-op off unix, where `reap` kills it.
fn terminate(child: &Child) {
    #[cfg(unix)]
    unsafe {
        libc::kill(child.id() as i32, libc::SIGTERM);
    }
    #[cfg(not(unix))]
    let _ = child;
}

fn reap(child: &mut Child) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!("Server exited with status: {:?}", status);
        }
        Ok(None) => {
            warn!("Server didn't exit gracefully, killing...");
            let _ = child.kill();
            let _ = child.wait();
        }
        Err(e) => {
            warn!("Error checking server status: {}", e);
            let _ = child.kill();
        }
    }
}

impl Drop for LlamaCppServer {
    fn drop(&mut self) {
        if self.process.is_some() || self.monitor.is_some() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::LaunchedServer;

    struct NeverFound;

    impl BinaryLocator for NeverFound {
        fn launch(&self, _model: &str, _port: u16) -> Result<LaunchedServer, LocalAIError> {
            Err(LocalAIError::BinaryNotFound {
                tried: vec!["llama-server".to_string()],
            })
        }
    }

    #[test]
    fn test_server_config() {
        let state = Arc::new(ServiceState::new("m", true));
        let server = LlamaCppServer::new(state).with_port(9999);
        assert_eq!(server.port(), 9999);
        assert_eq!(server.client().base_url(), "http://127.0.0.1:9999");
        assert!(server.binary().is_none());
    }

    #[tokio::test]
    async fn test_launch_failure_starts_no_monitor() {
        let state = Arc::new(ServiceState::new("m", true));
        let mut server = LlamaCppServer::new(state.clone()).with_locator(NeverFound);

        let result = server.launch();
        assert!(matches!(result, Err(LocalAIError::BinaryNotFound { .. })));
        assert!(server.monitor.is_none());
        assert!(!server.is_running());
        assert!(!state.is_available());
    }

    #[tokio::test]
    async fn test_wait_ready_times_out_when_down() {
        let state = Arc::new(ServiceState::new("m", true));
        let server = LlamaCppServer::new(state);
        let result = server.wait_ready(Duration::from_millis(250)).await;
        assert!(matches!(result, Err(LocalAIError::ServerStartTimeout)));
    }
}
