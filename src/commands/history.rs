//! History listing and transcript replay

use colored::Colorize;
use prettytable::{format, Table};

use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::store::{ChatSession, Sender};

use super::open_store;

/// Handle history commands
pub fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let store = open_store(config)?;

    match command {
        HistoryCommand::List => print_session_list(store.sessions()),
        HistoryCommand::Show { id } => match store.load_session(&id) {
            Some(session) => print_transcript(session),
            None => println!(
                "{}",
                format!("No stored conversation with id {}", id).yellow()
            ),
        },
    }

    Ok(())
}

/// Print the stored sessions as a table, most recently created first.
pub(crate) fn print_session_list(sessions: &[ChatSession]) {
    if sessions.is_empty() {
        println!("{}", "No conversation history found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Messages".bold()
    ]);

    for session in sessions {
        table.add_row(prettytable::row![
            session.id.cyan(),
            session.title,
            session.messages.len()
        ]);
    }

    println!("\nConversation History:");
    table.printstd();
    println!();
    println!(
        "Use {} to resume a session.",
        "ragchat chat --resume <ID>".cyan()
    );
    println!();
}

/// Replay a stored transcript to the terminal.
pub(crate) fn print_transcript(session: &ChatSession) {
    println!("\n{}\n", session.title.bold());
    for message in &session.messages {
        let label = match message.sender {
            Sender::User => "you>".cyan().bold(),
            Sender::Assistant => "assistant>".magenta().bold(),
        };
        println!("{} {}", label, message.content);
    }
    println!();
}
