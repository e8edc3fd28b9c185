//! RagChat - terminal chat client library
//!
//! This library provides the core functionality for the RagChat client:
//! streaming answers from a generative-QA server and persisting the
//! resulting conversations.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `client`: HTTP client and the incremental answer-stream parser
//! - `store`: Chat session store with pluggable persistence backends
//! - `commands`: Handlers behind the CLI subcommands
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use ragchat::client::AnswerClient;
//! use ragchat::config::Config;
//! use ragchat::store::{ChatStore, MemoryBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let client = AnswerClient::new(&config.server)?;
//!     let mut store = ChatStore::new(MemoryBackend::new());
//!
//!     let session_id = store.new_session();
//!     let answer = client.ask("What is retrieval?").await?.collect().await?;
//!     store.record_exchange(&session_id, "What is retrieval?", &answer)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use client::{AnswerClient, AnswerStream};
pub use config::Config;
pub use error::{RagChatError, Result};
pub use store::{ChatStore, HistoryBackend, MemoryBackend, SqliteBackend};
