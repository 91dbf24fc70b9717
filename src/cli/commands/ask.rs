//! Ask command implementation.

use crate::cli::{Output, TerminalSink};
use crate::config::Settings;
use crate::rag::{ConversationLog, RagSession};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, top_k: Option<usize>, settings: &Settings) -> Result<()> {
    let mut session = RagSession::start(settings).await;
    if let Some(reason) = session.unavailable_reason() {
        Output::error(reason);
        Output::info("Run 'casebook status' to check the index.");
        return Err(anyhow::anyhow!("{}", reason));
    }
    if let Some(k) = top_k {
        session = session.with_top_k(k);
    }

    let mut log = ConversationLog::new();
    let mut sink = TerminalSink::new();
    println!();

    match session.answer(question, &mut log, &mut sink).await {
        Ok(answer) => {
            if !answer.sources.is_empty() {
                Output::header("Sources");
                for source in &answer.sources {
                    Output::list_item(&format!(
                        "{} {} (score: {:.3})",
                        source.chunk.id, source.chunk.source, source.score
                    ));
                }
                println!();
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
    }
}
