/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `ask`     — One-shot question with streamed answer
- `chat`    — Interactive chat mode
- `history` — Stored conversation listing and replay

These handlers are intentionally small and use the library components:
the answer client and the chat store.
*/

use std::io::{self, Write};

use colored::Colorize;

use crate::client::AnswerClient;
use crate::config::Config;
use crate::error::{RagChatError, Result};
use crate::store::{ChatStore, SqliteBackend};

// One-shot ask command handler
pub mod ask;

// Interactive chat command handler
pub mod chat;

// History listing and replay
pub mod history;

/// Open the on-disk chat store and restore persisted history.
pub(crate) fn open_store(config: &Config) -> Result<ChatStore<SqliteBackend>> {
    let backend = SqliteBackend::new()?;
    let mut store = ChatStore::with_title_limit(backend, config.chat.title_max_chars);
    store.restore()?;
    Ok(store)
}

/// Run one question/answer exchange, printing fragments as they arrive.
///
/// Returns the full answer on success. On failure the error is rendered
/// for the user (a transport failure gets a generic apology, a server
/// error payload is shown verbatim as the assistant's reply), `Ok(None)`
/// is returned, and nothing should be recorded for the turn.
pub(crate) async fn stream_exchange(
    client: &AnswerClient,
    question: &str,
) -> Result<Option<String>> {
    let mut stream = match client.ask(question).await {
        Ok(stream) => stream,
        Err(e) => {
            report_exchange_error(&e);
            return Ok(None);
        }
    };

    let mut out = io::stdout();
    loop {
        match stream.next_fragment().await {
            Ok(Some(fragment)) => {
                write!(out, "{}", fragment)?;
                out.flush()?;
            }
            Ok(None) => break,
            Err(e) => {
                println!();
                report_exchange_error(&e);
                return Ok(None);
            }
        }
    }
    println!();

    Ok(Some(stream.answer().to_string()))
}

/// Render an exchange failure for the user and log the detail.
fn report_exchange_error(err: &anyhow::Error) {
    match err.downcast_ref::<RagChatError>() {
        Some(RagChatError::Answer(message)) => {
            // Server-reported failure: shown verbatim as the reply.
            println!("{}", message.red());
            tracing::warn!("Answer stream returned an error payload: {}", message);
        }
        _ => {
            println!(
                "{}",
                "Sorry, I encountered an error processing your request. Please try again.".red()
            );
            tracing::error!("Exchange failed: {:#}", err);
        }
    }
}
