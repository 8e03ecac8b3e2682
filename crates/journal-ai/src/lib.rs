//! # LM Journal AI
//!
//! Turns journal text into reflections and digests using a local
//! llama-server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  Entry / Notes  │ --> │ PromptComposer  │ --> │  llama-server   │
//! └─────────────────┘     └─────────────────┘     └────────┬────────┘
//!                                                          │ lines
//!                                                  ┌───────┴───────┐
//!                                                  │   callback    │
//!                                                  └───────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use journal_ai::{ChatConfig, ChatService};
//!
//! let mut service = ChatService::new(ChatConfig::from_env());
//! service.launch()?;
//! service.wait_until_available(Duration::from_secs(120)).await?;
//!
//! service.chat_stream("Had a tough day.", |chunk| println!("{chunk}")).await?;
//! ```

mod chat;
mod config;
mod notes;
pub mod prompt;

pub use chat::{AIError, ChatService};
pub use config::{ChatConfig, ChatConfigBuilder};
pub use notes::{InMemoryNotes, InvalidTimeframe, Note, NoteSource, NoteSourceError, Timeframe};
pub use prompt::{compose, compose_from_notes, PromptVariant};

// Re-export local AI types
pub use journal_local_ai::{
    paths as local_ai_paths, BinaryLocator, CandidateLocator, HealthMonitor, HealthStatus,
    LlamaCppClient, LocalAIError, SamplingParams, ServiceState, DEFAULT_MODEL,
    DEFAULT_PORT as DEFAULT_LOCAL_AI_PORT, REMOTE_FALLBACK_MODEL,
};
