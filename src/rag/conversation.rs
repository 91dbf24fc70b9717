//! In-memory conversation transcript for one session.

use crate::llm::Role;
use serde::{Deserialize, Serialize};

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// Append-only log of user and assistant turns.
///
/// Not persisted. A turn that failed after the question was recorded leaves
/// a user turn with no assistant reply after it.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: &str) {
        self.push(Role::User, content);
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.push(Role::Assistant, content);
    }

    fn push(&mut self, role: Role, content: &str) {
        self.turns.push(ConversationTurn {
            role,
            content: content.to_string(),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop the whole transcript.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
