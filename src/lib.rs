//! Casebook - question answering over a book of medical case studies
//!
//! A small retrieval-augmented generation pipeline with a CLI front end.
//!
//! # Overview
//!
//! Casebook lets you:
//! - Extract the text of the case study PDF, page by page
//! - Clean it and split it into overlapping chunks
//! - Embed the chunks into a local, persistent vector collection
//! - Ask questions and get streamed answers grounded in the retrieved chunks
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `extraction` - PDF text extraction
//! - `chunking` - Text cleaning and recursive splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector collection storage and similarity search
//! - `indexing` - Building a collection from a chunk file
//! - `llm` - Streaming chat completion client
//! - `rag` - The per-question query pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use casebook::config::Settings;
//! use casebook::rag::{ConversationLog, NullSink, RagSession};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut session = RagSession::start(&settings).await;
//!     let mut log = ConversationLog::new();
//!
//!     let answer = session
//!         .answer("What are the symptoms of COPD?", &mut log, &mut NullSink)
//!         .await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extraction;
mod fs_util;
pub mod indexing;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod vector_store;

pub use error::{CasebookError, Result};
