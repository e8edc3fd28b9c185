//! Interactive chat mode handler
//!
//! Runs a readline-based loop that submits each input line to the answer
//! server, renders the answer as it streams in, and records completed
//! exchanges into the active session. Special inputs:
//!
//! - `/new`     — start a fresh conversation (the next exchange opens it)
//! - `/history` — list stored conversations
//! - `/help`    — show available commands
//! - `/quit`    — leave chat mode
//!
//! `--resume <id>` replays a stored transcript and continues that session.

use std::io::{self, Write};

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::client::AnswerClient;
use crate::config::Config;
use crate::error::Result;

use super::history::{print_session_list, print_transcript};
use super::{open_store, stream_exchange};

/// Start interactive chat mode
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `resume` - Optional stored conversation id to replay and continue
pub async fn run_chat(config: Config, resume: Option<String>) -> Result<()> {
    let client = AnswerClient::new(&config.server)?;
    let mut store = open_store(&config)?;

    if let Some(id) = resume {
        match store.load_session(&id) {
            Some(session) => {
                print_transcript(session);
                store.set_active(id);
            }
            None => {
                println!(
                    "{}",
                    format!("No stored conversation with id {}", id).yellow()
                );
                return Ok(());
            }
        }
    }

    let mut rl = DefaultEditor::new()?;
    print_welcome_banner(client.endpoint());

    loop {
        let line = match rl.readline(&format!("{} ", "you>".cyan().bold())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        match input {
            "/quit" | "/exit" => break,
            "/new" => {
                store.new_session();
                println!("{}", "Started a new conversation.".green());
                continue;
            }
            "/history" => {
                print_session_list(store.sessions());
                continue;
            }
            "/help" => {
                print_help();
                continue;
            }
            _ => {}
        }

        print!("{} ", "assistant>".magenta().bold());
        io::stdout().flush()?;

        if let Some(answer) = stream_exchange(&client, input).await? {
            let session_id = store.active_session().to_string();
            store.record_exchange(&session_id, input, &answer)?;
        }
    }

    println!("{}", "Goodbye!".green());
    Ok(())
}

fn print_welcome_banner(endpoint: &str) {
    println!();
    println!("{}", "RagChat interactive mode".bold());
    println!("Connected to {}", endpoint.cyan());
    println!(
        "Type a question, or {} for available commands.",
        "/help".cyan()
    );
    println!();
}

fn print_help() {
    println!();
    println!("  {}      start a fresh conversation", "/new".cyan());
    println!("  {}  list stored conversations", "/history".cyan());
    println!("  {}     leave chat mode", "/quit".cyan());
    println!();
}
