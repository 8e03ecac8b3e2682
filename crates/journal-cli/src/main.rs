//! LM Journal CLI - reflect on journal entries with a local llama-server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// LM Journal - private reflections from a local model
#[derive(Parser)]
#[command(name = "journal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a reflection on a journal entry
    Chat {
        /// Entry text (read from stdin when omitted)
        text: Option<String>,
        /// Use a llama-server that is already running instead of launching one
        #[arg(long)]
        attach: bool,
        /// Seconds to wait for llama-server to become healthy
        #[arg(long, default_value_t = 120)]
        wait: u64,
    },

    /// Stream a digest over the notes in a directory
    Clarity {
        /// Window to cover: 3days, 2weeks or 3months
        #[arg(short, long, default_value = "3days")]
        timeframe: String,
        /// Directory of note files
        #[arg(short, long)]
        notes: PathBuf,
        /// Use a llama-server that is already running instead of launching one
        #[arg(long)]
        attach: bool,
        /// Seconds to wait for llama-server to become healthy
        #[arg(long, default_value_t = 120)]
        wait: u64,
    },

    /// Probe a llama-server once and report its health
    Health {
        /// Port llama-server listens on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration and where llama-server is looked for
    Info,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start async runtime: {}", e))?;

    match cli.command {
        Commands::Chat { text, attach, wait } => {
            runtime.block_on(commands::chat::run(text, attach, wait))
        }
        Commands::Clarity {
            timeframe,
            notes,
            attach,
            wait,
        } => runtime.block_on(commands::clarity::run(&timeframe, &notes, attach, wait)),
        Commands::Health { port } => runtime.block_on(commands::health::run(port)),
        Commands::Info => commands::info::run(),
    }
}
