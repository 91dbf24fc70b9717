//! CLI output formatting utilities.

use crate::rag::{AnswerSink, PipelineState, CURSOR};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a retrieved chunk.
    pub fn search_result(rank: usize, id: &str, score: f32, content: &str) {
        println!(
            "\n{} {} {} (score: {:.3})",
            style(format!("[{}]", rank)).green(),
            style(id).bold(),
            style("|").dim(),
            score
        );
        println!("   {}", content_preview(content, 200));
    }

    /// Print one conversation turn.
    pub fn turn(speaker: &str, content: &str) {
        println!("{} {}", style(format!("{}:", speaker)).cyan().bold(), content);
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("#>-"));
        }
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content to `max_chars` characters with an ellipsis, on one line.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let prefix: String = content.chars().take(max_chars).collect();
        format!("{}...", prefix)
    }
}

/// Streams an answer to the terminal as it arrives.
///
/// Shows a spinner while retrieving and waiting for the first token, then
/// prints tokens followed by a cursor marker that is erased once the stream
/// ends. The marker is only drawn on an interactive terminal.
pub struct TerminalSink {
    term: Term,
    spinner: Option<ProgressBar>,
    cursor_drawn: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            spinner: None,
            cursor_drawn: false,
        }
    }

    fn show_spinner(&mut self, msg: &str) {
        match &self.spinner {
            Some(pb) => pb.set_message(msg.to_string()),
            None => self.spinner = Some(Output::spinner(msg)),
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn erase_cursor(&mut self) {
        if self.cursor_drawn {
            let _ = self.term.clear_chars(1);
            self.cursor_drawn = false;
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerSink for TerminalSink {
    fn state_changed(&mut self, state: PipelineState) {
        match state {
            PipelineState::Embedding | PipelineState::Retrieving => {
                self.show_spinner("Searching case studies...")
            }
            PipelineState::Generating => self.show_spinner("Waiting for the model..."),
            PipelineState::Streaming | PipelineState::Idle => self.clear_spinner(),
        }
    }

    fn partial(&mut self, token: &str, _display: &str) {
        self.clear_spinner();
        self.erase_cursor();
        let _ = self.term.write_str(token);
        if self.term.is_term() {
            let _ = self.term.write_str(CURSOR);
            self.cursor_drawn = true;
        }
    }

    fn finalize(&mut self, _text: &str) {
        self.clear_spinner();
        self.erase_cursor();
        let _ = self.term.write_line("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview_is_char_safe() {
        assert_eq!(content_preview("short\ntext", 200), "short text");
        let long = "é".repeat(10);
        assert_eq!(content_preview(&long, 4), "éééé...");
    }
}
