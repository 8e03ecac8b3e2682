//! Local inference backend for LM Journal.
//!
//! This crate owns everything that touches the local `llama-server`
//! process: finding and launching the binary, polling its health in the
//! background, and streaming completions back from it.
//!
//! ```text
//! ┌─────────────────┐  spawn   ┌─────────────────┐
//! │  BinaryLocator  │ -------> │  llama-server   │
//! └─────────────────┘          └─────────────────┘
//!                                ▲            ▲
//!                    GET /health │            │ POST /completions
//!                  ┌─────────────┴───┐   ┌────┴────────────┐
//!                  │  HealthMonitor  │   │  LlamaCppClient │
//!                  └────────┬────────┘   └─────────────────┘
//!                           │ writes
//!                   ┌───────┴───────┐
//!                   │ ServiceState  │ <── is_available() from handlers
//!                   └───────────────┘
//! ```

mod client;
mod error;
mod health;
mod locator;
pub mod paths;
mod server;
mod state;

pub use client::{CompletionRequest, LlamaCppClient, SamplingParams};
pub use error::LocalAIError;
pub use health::{HealthMonitor, HealthStatus};
pub use locator::{BinaryLocator, CandidateLocator, LaunchedServer};
pub use server::{LlamaCppServer, STOP_GRACE};
pub use state::ServiceState;

/// Default port for the local llama-server instance.
pub const DEFAULT_PORT: u16 = 8029;

/// Default Hugging Face model identifier passed to `llama-server -hf`.
pub const DEFAULT_MODEL: &str = "ggml-org/gemma-3-1b-it-GGUF";

/// Model identifier reported when the local binary is not used.
pub const REMOTE_FALLBACK_MODEL: &str = "llama3.1-8b-instant";

/// Interval between two health probes.
pub const DEFAULT_HEALTH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(2);
