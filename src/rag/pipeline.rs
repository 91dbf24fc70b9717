//! Per-turn query pipeline.

use super::context::assemble_context;
use super::{Components, ConversationLog};
use crate::config::{RagSettings, Settings};
use crate::embedding::Embedder;
use crate::error::{CasebookError, Result};
use crate::llm::ChatMessage;
use crate::vector_store::{SearchResult, VectorStore};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Marker shown after a partial answer while tokens are still arriving.
pub const CURSOR: &str = "▌";

/// Stage of the turn currently being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Embedding,
    Retrieving,
    Generating,
    Streaming,
}

/// Receives progress of a turn. Only presentation lives here.
pub trait AnswerSink {
    fn state_changed(&mut self, _state: PipelineState) {}

    /// Called after every token with the new token and the running display
    /// text (answer so far followed by [`CURSOR`]).
    fn partial(&mut self, token: &str, display: &str);

    /// Called once the stream ends, or fails, with the text received so far.
    fn finalize(&mut self, text: &str);
}

/// Sink that discards all updates.
pub struct NullSink;

impl AnswerSink for NullSink {
    fn partial(&mut self, _token: &str, _display: &str) {}
    fn finalize(&mut self, _text: &str) {}
}

/// A completed answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub text: String,
    pub sources: Vec<SearchResult>,
}

/// Answers questions against a loaded collection.
///
/// When startup loading failed the session stays usable but every turn is
/// rejected with `ComponentsUnavailable` and the same reason.
pub struct RagSession {
    components: std::result::Result<Arc<Components>, String>,
    top_k: usize,
    max_context_chars: usize,
    state: PipelineState,
}

impl RagSession {
    pub fn new(components: Arc<Components>, settings: &RagSettings) -> Self {
        Self::with_components(Ok(components), settings)
    }

    pub fn unavailable(reason: &str, settings: &RagSettings) -> Self {
        Self::with_components(Err(reason.to_string()), settings)
    }

    fn with_components(
        components: std::result::Result<Arc<Components>, String>,
        settings: &RagSettings,
    ) -> Self {
        Self {
            components,
            top_k: settings.top_k,
            max_context_chars: settings.max_context_chars,
            state: PipelineState::Idle,
        }
    }

    /// Load components once. A load failure is recorded, not returned.
    pub async fn start(settings: &Settings) -> Self {
        match Components::load(settings).await {
            Ok(components) => Self::new(Arc::new(components), &settings.rag),
            Err(e) => {
                warn!("Query components unavailable: {}", e);
                Self::unavailable(&e.to_string(), &settings.rag)
            }
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.components.is_ok()
    }

    /// Reason the components could not be loaded, if any.
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.components.as_ref().err().map(String::as_str)
    }

    pub fn components(&self) -> Result<Arc<Components>> {
        self.components
            .clone()
            .map_err(CasebookError::ComponentsUnavailable)
    }

    fn set_state<S: AnswerSink + ?Sized>(&mut self, state: PipelineState, sink: &mut S) {
        self.state = state;
        sink.state_changed(state);
    }

    /// Answer one question, streaming progress to `sink`.
    ///
    /// The question is appended to `log` before any work starts. The answer
    /// is appended only when the whole stream was received, so a failed turn
    /// leaves the log with an unanswered user turn.
    #[instrument(skip(self, log, sink), fields(top_k = self.top_k))]
    pub async fn answer<S: AnswerSink + ?Sized>(
        &mut self,
        question: &str,
        log: &mut ConversationLog,
        sink: &mut S,
    ) -> Result<RagAnswer> {
        let components = self.components()?;

        log.push_user(question);
        let result = self.run_turn(&components, question, sink).await;
        self.set_state(PipelineState::Idle, sink);

        let answer = result?;
        log.push_assistant(&answer.text);
        Ok(answer)
    }

    async fn run_turn<S: AnswerSink + ?Sized>(
        &mut self,
        components: &Components,
        question: &str,
        sink: &mut S,
    ) -> Result<RagAnswer> {
        self.set_state(PipelineState::Embedding, sink);
        let query_embedding = components
            .embedder
            .embed(question)
            .await
            .map_err(as_retrieval)?;

        self.set_state(PipelineState::Retrieving, sink);
        let sources = components
            .store
            .query(&components.collection, &query_embedding, self.top_k)
            .await
            .map_err(as_retrieval)?;
        debug!("Retrieved {} chunks", sources.len());

        let context = assemble_context(&sources, self.max_context_chars);
        let prompt = components.prompts.answer_prompt(&context.text, question);

        self.set_state(PipelineState::Generating, sink);
        let mut tokens = components
            .llm
            .complete_stream(&[ChatMessage::user(prompt)])
            .await
            .map_err(as_generation)?;

        self.set_state(PipelineState::Streaming, sink);
        let mut full = String::new();
        while let Some(item) = tokens.next().await {
            match item {
                Ok(token) => {
                    full.push_str(&token);
                    let display = format!("{}{}", full, CURSOR);
                    sink.partial(&token, &display);
                }
                Err(e) => {
                    sink.finalize(&full);
                    return Err(as_generation(e));
                }
            }
        }
        sink.finalize(&full);

        info!("Answered with {} chars from {} chunks", full.len(), context.used);
        Ok(RagAnswer {
            text: full,
            sources,
        })
    }
}

/// Embed `question` and return the `k` nearest chunks of `collection`, best first.
#[instrument(skip(store, embedder))]
pub async fn retrieve(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    collection: &str,
    question: &str,
    k: usize,
) -> Result<Vec<SearchResult>> {
    let query_embedding = embedder.embed(question).await.map_err(as_retrieval)?;
    store
        .query(collection, &query_embedding, k)
        .await
        .map_err(as_retrieval)
}

fn as_retrieval(e: CasebookError) -> CasebookError {
    match e {
        CasebookError::Retrieval(_) => e,
        other => CasebookError::Retrieval(other.to_string()),
    }
}

fn as_generation(e: CasebookError) -> CasebookError {
    match e {
        CasebookError::Generation(_) => e,
        other => CasebookError::Generation(other.to_string()),
    }
}
