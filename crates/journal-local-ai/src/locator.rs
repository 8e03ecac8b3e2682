//! Locating and launching the llama-server binary.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

use crate::error::LocalAIError;
use crate::paths::{self, DEFAULT_CANDIDATES};

/// A llama-server process that was successfully created.
#[derive(Debug)]
pub struct LaunchedServer {
    /// Path the process was started from.
    pub path: PathBuf,
    /// Handle to the child process.
    pub child: Child,
}

/// Strategy for starting the inference server.
///
/// Implementations only need to create the process. Readiness is tracked
/// separately by the health monitor.
pub trait BinaryLocator: Send + Sync {
    /// Start llama-server serving `model` on `port`.
    fn launch(&self, model: &str, port: u16) -> Result<LaunchedServer, LocalAIError>;
}

/// Tries an ordered list of candidate paths; the first one that starts wins.
#[derive(Debug, Clone)]
pub struct CandidateLocator {
    candidates: Vec<String>,
    home: Option<PathBuf>,
    user_dirs: Vec<String>,
}

impl CandidateLocator {
    /// Locator over [`DEFAULT_CANDIDATES`] using the current environment.
    pub fn new() -> Self {
        Self::with_candidates(DEFAULT_CANDIDATES.iter().map(|c| c.to_string()))
    }

    /// Locator over a custom candidate list using the current environment.
    pub fn with_candidates(candidates: impl IntoIterator<Item = String>) -> Self {
        Self {
            candidates: candidates.into_iter().collect(),
            home: paths::home_dir(),
            user_dirs: paths::user_dir_values(),
        }
    }

    /// Override the home directory used for `~` expansion.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Override the user directories used for `*` expansion.
    pub fn with_user_dirs(mut self, user_dirs: Vec<String>) -> Self {
        self.user_dirs = user_dirs;
        self
    }

    /// The raw candidate list.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Every concrete path this locator would try, in order.
    pub fn resolved_paths(&self) -> Vec<PathBuf> {
        self.candidates
            .iter()
            .flat_map(|c| paths::expand_candidate(c, self.home.as_deref(), &self.user_dirs))
            .collect()
    }
}

impl Default for CandidateLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryLocator for CandidateLocator {
    fn launch(&self, model: &str, port: u16) -> Result<LaunchedServer, LocalAIError> {
        let mut tried = Vec::new();

        for path in self.resolved_paths() {
            let spawned = Command::new(&path)
                .arg("-hf")
                .arg(model)
                .arg("--port")
                .arg(port.to_string())
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            match spawned {
                Ok(child) => {
                    info!(
                        "Started llama-server from {} (PID: {})",
                        path.display(),
                        child.id()
                    );
                    return Ok(LaunchedServer { path, child });
                }
                Err(e) => {
                    debug!("Could not start {}: {}", path.display(), e);
                    tried.push(path.display().to_string());
                }
            }
        }

        warn!("Error starting llama-server from any known location");
        for path in &tried {
            warn!("  tried: {}", path);
        }
        Err(LocalAIError::BinaryNotFound { tried })
    }
}
