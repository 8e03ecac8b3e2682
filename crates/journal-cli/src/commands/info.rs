//! Info command - show configuration and llama-server discovery.

use journal_ai::{CandidateLocator, ChatConfig, REMOTE_FALLBACK_MODEL};

pub(crate) fn run() -> miette::Result<()> {
    let config = ChatConfig::from_env();

    println!("LM Journal");
    println!("==========");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Local AI:");
    if config.use_external_binary {
        println!("  Model:           {}", config.model);
    } else {
        println!("  Model:           {} (local server disabled)", REMOTE_FALLBACK_MODEL);
    }
    println!("  Port:            {}", config.port);
    println!("  Health interval: {:?}", config.health_interval);
    println!("  Max tokens:      {}", config.sampling.max_tokens);
    println!();

    println!("llama-server search order:");
    for path in CandidateLocator::new().resolved_paths() {
        let marker = if path.is_file() { "*" } else { " " };
        println!("  {} {}", marker, path.display());
    }
    println!();

    println!("Environment:");
    println!("  JOURNAL_MODEL, JOURNAL_USE_LOCAL_SERVER, JOURNAL_LLAMA_PORT,");
    println!("  JOURNAL_HEALTH_INTERVAL_MS, RUST_LOG");

    Ok(())
}
