//! Command-line interface definition for RagChat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for one-shot questions, interactive chat, and
//! conversation history.

use clap::{Parser, Subcommand};

/// RagChat - terminal chat client for a generative-QA server
///
/// Ask questions against the server's `/generative_ai` endpoint, stream
/// the answer as it is generated, and keep conversation history locally.
#[derive(Parser, Debug, Clone)]
#[command(name = "ragchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the answer server base URL
    #[arg(long, env = "RAGCHAT_SERVER_URL")]
    pub server_url: Option<String>,

    /// Override the history database path
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for RagChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Ask a single question and stream the answer
    Ask {
        /// The question to send to the answer server
        question: String,

        /// Record the exchange into an existing session instead of a new one
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive chat session
    Chat {
        /// Resume a stored conversation by id
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Inspect stored conversation history
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List stored conversations
    List,

    /// Show the transcript of a stored conversation
    Show {
        /// Conversation id
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
