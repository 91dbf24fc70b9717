//! Interactive chat command.

use crate::cli::{Output, TerminalSink};
use crate::config::Settings;
use crate::llm::Role;
use crate::rag::{ConversationLog, RagSession};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
///
/// Components are loaded once. If loading failed, every question is answered
/// with the same error until the process is restarted.
pub async fn run_chat(settings: &Settings) -> Result<()> {
    let mut session = RagSession::start(settings).await;
    let mut log = ConversationLog::new();

    println!("\n{}", style("Casebook Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the case studies. 'history' shows the transcript, 'clear' resets it, 'exit' quits.").dim()
    );

    if let Some(reason) = session.unavailable_reason() {
        Output::error(reason);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            log.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        if input.eq_ignore_ascii_case("history") {
            print_history(&log);
            continue;
        }

        print!("\n{} ", style("Casebook:").cyan().bold());
        stdout.flush()?;

        let mut sink = TerminalSink::new();
        if let Err(e) = session.answer(input, &mut log, &mut sink).await {
            println!();
            Output::error(&format!("Error: {}", e));
        }
        println!();
    }

    Ok(())
}

fn print_history(log: &ConversationLog) {
    if log.is_empty() {
        Output::info("No messages yet.");
        return;
    }

    println!();
    for turn in log.turns() {
        let speaker = match turn.role {
            Role::User => "You",
            Role::Assistant => "Casebook",
            Role::System => "System",
        };
        Output::turn(speaker, &turn.content);
    }
    println!();
}
