//! Retrieval-augmented question answering over the indexed case studies.
//!
//! A turn embeds the question, retrieves the nearest chunks, wraps them in
//! the grounding prompt and streams the model's answer to an [`AnswerSink`].

mod components;
pub mod context;
mod conversation;
mod pipeline;

pub use components::Components;
pub use context::{assemble_context, AssembledContext, CONTEXT_SEPARATOR};
pub use conversation::{ConversationLog, ConversationTurn};
pub use pipeline::{retrieve, AnswerSink, NullSink, PipelineState, RagAnswer, RagSession, CURSOR};
