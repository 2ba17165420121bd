//! Dialogue engine seam and the adapter the pipeline talks to.

use std::sync::Arc;

use crate::shared::{Reply, FALLBACK_REPLY};

/// Contract consumed from the pattern-matching engine.
pub trait DialogueEngine: Send + Sync {
    /// Answers `text` for `session_id`; `None` when no pattern matches.
    fn respond(&self, text: &str, session_id: &str) -> Option<String>;

    /// Stores a session-scoped predicate.
    fn set_predicate(&self, key: &str, value: &str, session_id: &str);
}

/// Wraps a [`DialogueEngine`] and guarantees a reply.
#[derive(Clone)]
pub struct DialogueAdapter {
    engine: Arc<dyn DialogueEngine>,
}

impl DialogueAdapter {
    pub fn new(engine: Arc<dyn DialogueEngine>) -> Self {
        Self { engine }
    }

    /// Engine reply, or [`FALLBACK_REPLY`] when the engine has nothing (or only whitespace).
    pub fn respond(&self, text: &str, session_id: &str) -> Reply {
        match self.engine.respond(text, session_id) {
            Some(reply) if !reply.trim().is_empty() => reply,
            _ => {
                tracing::debug!(target: "parlor::dialogue", session = session_id, "No pattern matched");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    pub fn set_predicate(&self, key: &str, value: &str, session_id: &str) {
        self.engine.set_predicate(key, value, session_id);
    }
}
