//! CLI module for Casebook.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{Output, TerminalSink};

use clap::{Parser, Subcommand};

/// Casebook - ask questions about a book of medical case studies
///
/// Extracts the case study PDF, splits it into chunks, indexes them in a local
/// vector store and answers questions grounded in the retrieved passages.
#[derive(Parser, Debug)]
#[command(name = "casebook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CASEBOOK_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the text of the case study PDF
    Extract {
        /// PDF file (defaults to source.pdf_path)
        #[arg(short, long)]
        input: Option<String>,

        /// Raw text output file (defaults to source.raw_text_path)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Clean the extracted text and split it into chunks
    Chunk {
        /// Raw text file (defaults to source.raw_text_path)
        #[arg(short, long)]
        input: Option<String>,

        /// Chunk JSON output file (defaults to source.chunks_path)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Embed the chunks and rebuild the vector collection
    Index {
        /// Chunk JSON file (defaults to source.chunks_path)
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Ask a single question and stream the answer
    Ask {
        /// The question to ask
        question: String,

        /// Number of chunks to retrieve (defaults to rag.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show the chunks closest to a query without calling the model
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "5")]
        limit: usize,
    },

    /// Start an interactive chat session
    Chat,

    /// Show the state of the pipeline artifacts and the collection
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the current configuration to the configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
