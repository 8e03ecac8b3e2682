//! CLI commands.

pub mod chat;
pub mod clarity;
pub mod health;
pub mod info;

use journal_ai::{ChatConfig, ChatService};
use serde::Deserialize;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Build the chat service and bring llama-server up.
pub(crate) async fn start_service(attach: bool, wait: u64) -> miette::Result<ChatService> {
    let mut service = ChatService::new(ChatConfig::from_env());

    if attach {
        service.attach();
    } else {
        match service
            .launch()
            .map_err(|e| miette::miette!("Failed to start llama-server: {}", e))?
        {
            Some(path) => eprintln!("Started llama-server from {}", path.display()),
            None => service.attach(),
        }
    }

    eprintln!("Waiting for model {} ...", service.model());
    service
        .wait_until_available(Duration::from_secs(wait))
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    Ok(service)
}

/// Token that fires on Ctrl-C.
pub(crate) fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    content: String,
}

/// Text to show for one streamed line.
///
/// `data: {...}` events show their `content`; anything else is shown as is.
pub(crate) fn chunk_text(chunk: &str) -> Option<String> {
    let Some(data) = chunk.strip_prefix("data:") else {
        return Some(chunk.to_string());
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return None;
    }
    match serde_json::from_str::<ChunkPayload>(data) {
        Ok(payload) => Some(payload.content),
        Err(_) => Some(chunk.to_string()),
    }
}

/// Print one streamed line to stdout.
pub(crate) fn print_chunk(chunk: &str) {
    if let Some(text) = chunk_text(chunk) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_decodes_event() {
        assert_eq!(
            chunk_text("data: {\"content\":\"Be kind\",\"stop\":false}"),
            Some("Be kind".to_string())
        );
    }

    #[test]
    fn test_chunk_text_passes_through_other_lines() {
        assert_eq!(chunk_text("plain"), Some("plain".to_string()));
        assert_eq!(chunk_text("data: not json"), Some("data: not json".to_string()));
        assert_eq!(chunk_text("data: [DONE]"), None);
    }
}
