//! Health command - probe llama-server once.

use journal_ai::{HealthMonitor, HealthStatus, LlamaCppClient, ServiceState, DEFAULT_LOCAL_AI_PORT};
use std::sync::Arc;

pub(crate) async fn run(port: Option<u16>) -> miette::Result<()> {
    let port = port.unwrap_or(DEFAULT_LOCAL_AI_PORT);
    let client = LlamaCppClient::with_port(port);
    println!("Probing {}/health", client.base_url());

    let state = Arc::new(ServiceState::new("", true));
    match HealthMonitor::new(client, state).probe().await {
        HealthStatus::Up => {
            println!("llama-server is up");
            Ok(())
        }
        HealthStatus::Down => Err(miette::miette!("llama-server on port {} is down", port)),
    }
}
