//! Error types for local AI operations.

use thiserror::Error;

/// Errors that can occur while talking to or managing llama-server.
#[derive(Debug, Error)]
pub enum LocalAIError {
    /// No candidate path could be started.
    #[error("llama-server not found in any expected location (tried: {})", .tried.join(", "))]
    BinaryNotFound { tried: Vec<String> },

    /// A resolved binary path was found but the process could not be created.
    #[error("Failed to start server: {0}")]
    ServerStartFailed(String),

    /// Refused to send a completion request with an empty prompt.
    #[error("Completion prompt is empty")]
    EmptyPrompt,

    /// The completion request could not be serialized.
    #[error("Failed to serialize completion request: {0}")]
    RequestSerialization(#[source] serde_json::Error),

    /// Connecting to or sending a request to the server failed.
    #[error("Transport error talking to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Reading the streamed response body failed part-way through.
    #[error("Error reading streaming response: {0}")]
    StreamRead(#[source] reqwest::Error),

    /// The non-streaming response body was not a single structured object.
    #[error("Failed to decode completion response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Server returned a non-success status.
    #[error("API error: {0}")]
    Api(String),

    /// A single health probe failed. Absorbed by the health monitor.
    #[error("Health probe failed: {0}")]
    ProbeFailed(String),

    /// The caller cancelled an in-flight request.
    #[error("Request cancelled")]
    Cancelled,

    /// Timeout waiting for server to report healthy.
    #[error("Timeout waiting for server to become ready")]
    ServerStartTimeout,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
