//! Chat service - the entry point used by request handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ChatConfig;
use crate::notes::{NoteSource, NoteSourceError, Timeframe};
use crate::prompt;
use journal_local_ai::{
    BinaryLocator, LlamaCppClient, LlamaCppServer, LocalAIError, ServiceState,
    REMOTE_FALLBACK_MODEL,
};

/// Journal chat backed by a local llama-server.
///
/// Owns the server process (if any) and the shared [`ServiceState`]. Every
/// streaming method checks availability first and fails fast when the
/// health monitor last saw the server down.
pub struct ChatService {
    state: Arc<ServiceState>,
    client: LlamaCppClient,
    server: LlamaCppServer,
}

/// Errors from the chat service.
#[derive(Debug, Error)]
pub enum AIError {
    #[error(transparent)]
    Local(#[from] LocalAIError),
    #[error("chat service unavailable: llama-server for '{model}' is not healthy")]
    Unavailable { model: String },
    #[error("nothing to send: input is empty")]
    EmptyInput,
    #[error("no journal entries found{}", .0.map(|t| format!(" for the past {}", t)).unwrap_or_default())]
    NoNotes(Option<Timeframe>),
    #[error(transparent)]
    NoteSource(#[from] NoteSourceError),
}

impl ChatService {
    /// Create a service. Nothing is launched until [`launch`](Self::launch).
    ///
    /// Without a local binary the model identifier falls back to
    /// [`REMOTE_FALLBACK_MODEL`].
    pub fn new(config: ChatConfig) -> Self {
        let model = if config.use_external_binary {
            config.model.clone()
        } else {
            REMOTE_FALLBACK_MODEL.to_string()
        };
        let state = Arc::new(ServiceState::new(model, config.use_external_binary));

        let client = LlamaCppClient::with_port(config.port).with_sampling(config.sampling.clone());
        let server = LlamaCppServer::new(state.clone())
            .with_port(config.port)
            .with_health_interval(config.health_interval);

        Self {
            state,
            client,
            server,
        }
    }

    /// Replace the binary discovery strategy used by [`launch`](Self::launch).
    pub fn with_locator(mut self, locator: impl BinaryLocator + 'static) -> Self {
        self.server = self.server.with_locator(locator);
        self
    }

    /// Start llama-server and its health monitor.
    ///
    /// Returns the binary path, or `None` when the local binary is disabled.
    /// Must be called from within a Tokio runtime.
    pub fn launch(&mut self) -> Result<Option<PathBuf>, AIError> {
        if !self.state.use_external_binary() {
            info!(
                "Local llama-server disabled, using model {}",
                self.state.model()
            );
            return Ok(None);
        }
        let path = self.server.launch()?;
        Ok(Some(path.to_path_buf()))
    }

    /// Monitor a llama-server that was started outside this process.
    pub fn attach(&mut self) {
        info!("Monitoring existing llama-server at {}", self.client.base_url());
        self.server.start_monitor();
    }

    /// Wait until the health monitor reports the server up.
    pub async fn wait_until_available(&self, timeout: Duration) -> Result<(), AIError> {
        self.server.wait_ready(timeout).await?;
        Ok(())
    }

    /// Whether the last health probe succeeded.
    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    /// Model identifier in use.
    pub fn model(&self) -> &str {
        self.state.model()
    }

    /// Shared state, for handlers that only need the availability flag.
    pub fn state(&self) -> Arc<ServiceState> {
        self.state.clone()
    }

    /// Stream a reflection on `raw_text`, one chunk per callback.
    pub async fn chat_stream<F>(&self, raw_text: &str, on_chunk: F) -> Result<(), AIError>
    where
        F: FnMut(&str),
    {
        self.chat_stream_until(raw_text, &CancellationToken::new(), on_chunk)
            .await
    }

    /// [`chat_stream`](Self::chat_stream) that stops when `cancel` fires.
    pub async fn chat_stream_until<F>(
        &self,
        raw_text: &str,
        cancel: &CancellationToken,
        on_chunk: F,
    ) -> Result<(), AIError>
    where
        F: FnMut(&str),
    {
        let prompt = self.prepare(raw_text)?;
        self.client
            .stream_completion_until(&prompt, cancel, on_chunk)
            .await?;
        Ok(())
    }

    /// Reflection on `raw_text` returned in one piece.
    pub async fn chat(&self, raw_text: &str) -> Result<String, AIError> {
        let prompt = self.prepare(raw_text)?;
        Ok(self.client.complete(&prompt).await?)
    }

    /// Stream a digest over `notes`.
    pub async fn clarity_stream<S, F>(&self, notes: &[S], on_chunk: F) -> Result<(), AIError>
    where
        S: AsRef<str>,
        F: FnMut(&str),
    {
        self.clarity_stream_until(notes, &CancellationToken::new(), on_chunk)
            .await
    }

    /// [`clarity_stream`](Self::clarity_stream) that stops when `cancel` fires.
    pub async fn clarity_stream_until<S, F>(
        &self,
        notes: &[S],
        cancel: &CancellationToken,
        on_chunk: F,
    ) -> Result<(), AIError>
    where
        S: AsRef<str>,
        F: FnMut(&str),
    {
        let prompt = self.prepare_digest(notes)?;
        self.client
            .stream_completion_until(&prompt, cancel, on_chunk)
            .await?;
        Ok(())
    }

    /// Digest over `notes` returned in one piece.
    pub async fn clarity<S: AsRef<str>>(&self, notes: &[S]) -> Result<String, AIError> {
        let prompt = self.prepare_digest(notes)?;
        Ok(self.client.complete(&prompt).await?)
    }

    /// Stream a digest of the notes `source` holds for `timeframe`.
    ///
    /// Returns how many notes went into the digest.
    pub async fn clarity_for_timeframe<F>(
        &self,
        source: &dyn NoteSource,
        timeframe: Timeframe,
        on_chunk: F,
    ) -> Result<usize, AIError>
    where
        F: FnMut(&str),
    {
        self.clarity_for_timeframe_until(source, timeframe, &CancellationToken::new(), on_chunk)
            .await
    }

    /// [`clarity_for_timeframe`](Self::clarity_for_timeframe) that stops when
    /// `cancel` fires.
    pub async fn clarity_for_timeframe_until<F>(
        &self,
        source: &dyn NoteSource,
        timeframe: Timeframe,
        cancel: &CancellationToken,
        on_chunk: F,
    ) -> Result<usize, AIError>
    where
        F: FnMut(&str),
    {
        info!("Clarity request received for timeframe: {}", timeframe);

        let notes = source.notes_within(timeframe.duration()).await?;
        info!("Found {} notes within timeframe", notes.len());

        if notes.is_empty() {
            return Err(AIError::NoNotes(Some(timeframe)));
        }

        let contents: Vec<&str> = notes.iter().map(|note| note.content.as_str()).collect();
        self.clarity_stream_until(&contents, cancel, on_chunk)
            .await?;
        Ok(contents.len())
    }

    /// Stop the health monitor and the llama-server process.
    pub async fn shutdown(&mut self) -> Result<(), AIError> {
        self.server.shutdown().await?;
        Ok(())
    }

    fn prepare(&self, raw_text: &str) -> Result<String, AIError> {
        if raw_text.trim().is_empty() {
            return Err(AIError::EmptyInput);
        }
        self.ensure_available()?;
        let variant = prompt::PromptVariant::classify(raw_text);
        debug!("Composing {:?} prompt", variant);
        Ok(variant.render(raw_text))
    }

    fn prepare_digest<S: AsRef<str>>(&self, notes: &[S]) -> Result<String, AIError> {
        if notes.is_empty() {
            return Err(AIError::NoNotes(None));
        }
        self.ensure_available()?;
        debug!("Composing digest over {} notes", notes.len());
        Ok(prompt::compose_from_notes(notes))
    }

    fn ensure_available(&self) -> Result<(), AIError> {
        if self.state.is_available() {
            Ok(())
        } else {
            Err(AIError::Unavailable {
                model: self.state.model().to_string(),
            })
        }
    }
}
