//! llmrelay CLI entry point.
//!
//! # Commands
//!
//! - `llmrelay serve [--logs]`: run the HTTP gateway
//! - `llmrelay status`: show configuration and probe every provider
//! - `llmrelay onboard`: write a default config file

mod helpers;
mod onboard;
mod serve;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// llmrelay: gateway in front of self-hosted LLM servers
#[derive(Parser)]
#[command(name = "llmrelay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider health
    Status,

    /// Initialize configuration
    Onboard,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { logs } => {
            init_logging(logs);
            serve::run().await
        }
        Commands::Status => status::run().await,
        Commands::Onboard => onboard::run(),
    }
}

/// Initialize tracing. `RUST_LOG` wins over the `--logs` default.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "llmrelay=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
