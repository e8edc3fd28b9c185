//! One-shot ask command handler
//!
//! Submits a single question, streams the answer to stdout, and records
//! the exchange. By default the exchange lands in a fresh session; with
//! `--session` it continues (or explicitly creates) the given one.

use colored::Colorize;

use crate::client::AnswerClient;
use crate::config::Config;
use crate::error::Result;

use super::{open_store, stream_exchange};

/// Ask a single question and record the exchange
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `question` - The question text
/// * `session` - Optional existing session id to append to
pub async fn run_ask(config: Config, question: String, session: Option<String>) -> Result<()> {
    let client = AnswerClient::new(&config.server)?;
    let mut store = open_store(&config)?;

    let session_id = match session {
        Some(id) => {
            if store.load_session(&id).is_none() {
                tracing::warn!("Session {} not found, it will be created", id);
            }
            store.set_active(id.clone());
            id
        }
        None => store.new_session(),
    };

    if let Some(answer) = stream_exchange(&client, &question).await? {
        store.record_exchange(&session_id, &question, &answer)?;
        println!("{}", format!("Recorded in session {}", session_id).dimmed());
    }

    Ok(())
}
