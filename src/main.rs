//! RagChat - terminal chat client for a generative-QA server
//!
//! Main entry point: parses the CLI, loads configuration, and dispatches
//! to the command handlers.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ragchat::cli::{Cli, Commands};
use ragchat::commands;
use ragchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // If the user supplied a storage path on the CLI, mirror it into
    // RAGCHAT_HISTORY_DB so the storage initializer picks it up without
    // threading the path through every call site.
    if let Some(db_path) = &cli.storage_path {
        std::env::set_var("RAGCHAT_HISTORY_DB", db_path);
        tracing::info!("Using storage DB override from CLI: {}", db_path);
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Ask { question, session } => {
            commands::ask::run_ask(config, question, session).await
        }
        Commands::Chat { resume } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(r) = &resume {
                tracing::debug!("Resuming conversation: {}", r);
            }
            commands::chat::run_chat(config, resume).await
        }
        Commands::History { command } => commands::history::handle_history(&config, command),
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "ragchat=debug" } else { "ragchat=info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
