//! HTTP client for llama-server's native completion API.

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::LocalAIError;
use crate::DEFAULT_PORT;

/// Client for communicating with llama-server.
#[derive(Debug, Clone)]
pub struct LlamaCppClient {
    client: reqwest::Client,
    base_url: String,
    sampling: SamplingParams,
}

/// Sampling settings sent with every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 1.0,
            top_k: 64,
            top_p: 0.95,
            repeat_penalty: 1.0,
        }
    }
}

/// Request body for `POST /completions`.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(rename = "n_predict")]
    pub max_tokens: u32,
    pub stream: bool,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

impl CompletionRequest {
    /// Build a request for `prompt` with the given sampling settings.
    pub fn new(prompt: impl Into<String>, sampling: &SamplingParams, stream: bool) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: sampling.max_tokens,
            stream,
            temperature: sampling.temperature,
            top_k: sampling.top_k,
            top_p: sampling.top_p,
            repeat_penalty: sampling.repeat_penalty,
        }
    }
}

/// Non-streaming completion response. Only `content` is used.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

impl LlamaCppClient {
    /// Create a new client with default URL (127.0.0.1:8029).
    pub fn new() -> Self {
        Self::with_port(DEFAULT_PORT)
    }

    /// Create a new client with a custom URL.
    pub fn with_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            sampling: SamplingParams::default(),
        }
    }

    /// Create a new client with a custom port on localhost.
    pub fn with_port(port: u16) -> Self {
        Self::with_url(format!("http://127.0.0.1:{}", port))
    }

    /// Replace the sampling settings.
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sampling settings used for completions.
    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    /// Probe `GET /health` once. Anything but `200 OK` is a failure.
    pub async fn check_health(&self, timeout: Duration) -> Result<(), LocalAIError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| LocalAIError::ProbeFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::OK {
            Ok(())
        } else {
            Err(LocalAIError::ProbeFailed(format!(
                "{} returned {}",
                url,
                response.status()
            )))
        }
    }

    /// Stream a completion, calling `on_chunk` once per non-empty line.
    pub async fn stream_completion<F>(&self, prompt: &str, on_chunk: F) -> Result<(), LocalAIError>
    where
        F: FnMut(&str),
    {
        self.stream_completion_until(prompt, &CancellationToken::new(), on_chunk)
            .await
    }

    /// Stream a completion until the body ends or `cancel` fires.
    ///
    /// Chunks are delivered in the order their bytes arrived. On error or
    /// cancellation no further chunks are delivered; chunks already handed
    /// to `on_chunk` are not retracted.
    pub async fn stream_completion_until<F>(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
        mut on_chunk: F,
    ) -> Result<(), LocalAIError>
    where
        F: FnMut(&str),
    {
        let request = CompletionRequest::new(prompt, &self.sampling, true);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LocalAIError::Cancelled),
            response = self.post_completion(&request) => response?,
        };

        // The body stream is dropped on every return below, which releases
        // the connection.
        let mut body = response.bytes_stream();
        let mut lines = LineBuffer::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LocalAIError::Cancelled),
                next = body.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    for line in lines.push(&bytes) {
                        if cancel.is_cancelled() {
                            return Err(LocalAIError::Cancelled);
                        }
                        deliver(&line, &mut on_chunk);
                    }
                }
                Some(Err(e)) => {
                    debug!("Error reading streaming response: {}", e);
                    return Err(LocalAIError::StreamRead(e));
                }
                None => break,
            }
        }

        if let Some(line) = lines.finish() {
            if cancel.is_cancelled() {
                return Err(LocalAIError::Cancelled);
            }
            deliver(&line, &mut on_chunk);
        }

        Ok(())
    }

    /// Request a completion and return its `content` in one piece.
    pub async fn complete(&self, prompt: &str) -> Result<String, LocalAIError> {
        let request = CompletionRequest::new(prompt, &self.sampling, false);
        let response = self.post_completion(&request).await?;

        let body = response.bytes().await.map_err(LocalAIError::StreamRead)?;
        let completion: CompletionResponse =
            serde_json::from_slice(&body).map_err(LocalAIError::Decode)?;

        Ok(completion.content)
    }

    async fn post_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<reqwest::Response, LocalAIError> {
        if request.prompt.is_empty() {
            return Err(LocalAIError::EmptyPrompt);
        }

        let body = serde_json::to_vec(request).map_err(LocalAIError::RequestSerialization)?;
        let url = format!("{}/completions", self.base_url);

        debug!(
            "Sending completion request to {} (stream: {}, {} bytes)",
            url,
            request.stream,
            body.len()
        );

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| LocalAIError::Transport {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LocalAIError::Api(format!("{}: {}", status, text)));
        }

        Ok(response)
    }
}

impl Default for LlamaCppClient {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver<F: FnMut(&str)>(line: &str, on_chunk: &mut F) {
    if line.is_empty() {
        return;
    }
    trace!("Received chunk: {}", line);
    on_chunk(line);
}

/// Splits a byte stream into lines.
///
/// Bytes are buffered until a `\n` arrives, so multi-byte characters split
/// across network reads decode correctly.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append `bytes` and return every line completed by them.
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            lines.push(decode_line(line));
        }
        lines
    }

    /// The trailing unterminated line, if any.
    fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        Some(decode_line(std::mem::take(&mut self.pending)))
    }
}

fn decode_line(mut line: Vec<u8>) -> String {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    String::from_utf8_lossy(&line).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        let client = LlamaCppClient::new();
        assert_eq!(client.base_url(), "http://127.0.0.1:8029");
    }

    #[test]
    fn test_custom_url() {
        let client = LlamaCppClient::with_url("http://192.168.1.100:8080");
        assert_eq!(client.base_url(), "http://192.168.1.100:8080");
    }

    #[test]
    fn test_custom_port() {
        let client = LlamaCppClient::with_port(9000);
        assert_eq!(client.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_request_wire_format() {
        let request = CompletionRequest::new("hello", &SamplingParams::default(), true);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["prompt"], "hello");
        assert_eq!(json["n_predict"], 512);
        assert_eq!(json["stream"], true);
        assert_eq!(json["temperature"], 1.0);
        assert_eq!(json["top_k"], 64);
        assert_eq!(json["repeat_penalty"], 1.0);
        assert!((json["top_p"].as_f64().unwrap() - 0.95).abs() < 1e-6);
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_line_buffer_splits_across_reads() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.push(b"data: {\"con").is_empty());
        assert_eq!(buffer.push(b"tent\":\"a\"}\n\nda"), vec!["data: {\"content\":\"a\"}", ""]);
        assert_eq!(buffer.push(b"ta: b\r\n"), vec!["data: b"]);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_line_buffer_trailing_line() {
        let mut buffer = LineBuffer::default();
        assert_eq!(buffer.push(b"one\ntwo"), vec!["one"]);
        assert_eq!(buffer.finish(), Some("two".to_string()));
    }

    #[test]
    fn test_line_buffer_split_utf8() {
        let mut buffer = LineBuffer::default();
        let text = "café\n".as_bytes();
        assert!(buffer.push(&text[..4]).is_empty());
        assert_eq!(buffer.push(&text[4..]), vec!["café"]);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_before_sending() {
        // Nothing listens on port 1; reaching the network would be a
        // transport error instead.
        let client = LlamaCppClient::with_port(1);
        let result = client.stream_completion("", |_| {}).await;
        assert!(matches!(result, Err(LocalAIError::EmptyPrompt)));
    }
}
