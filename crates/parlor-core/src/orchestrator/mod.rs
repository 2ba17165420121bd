//! Request dispatch: ordered utility skills first, then the dialogue engine.

use std::sync::Arc;

use crate::dialogue::DialogueAdapter;
use crate::shared::{Reply, UtilityIntent, DEFAULT_USER_ID, USER_ID_PREDICATE};

/// A fixed-format request handler (clock, calendar, weather, encyclopedia).
#[async_trait::async_trait]
pub trait UtilitySkill: Send + Sync {
    /// Unique skill name (route order reporting, logs).
    fn name(&self) -> &str;

    /// Recognizes the skill's request in lower-cased, trimmed input.
    fn recognize(&self, normalized: &str) -> Option<UtilityIntent>;

    /// Produces the reply. Failures are rendered as apology text, never returned.
    async fn answer(&self, intent: UtilityIntent) -> Reply;
}

/// Ordered list of utility skills; the first one that recognizes the input wins.
pub struct IntentRouter {
    skills: Vec<Arc<dyn UtilitySkill>>,
}

impl IntentRouter {
    pub fn new() -> Self {
        Self { skills: Vec::new() }
    }

    /// Appends a skill at the lowest precedence.
    pub fn register(&mut self, skill: Arc<dyn UtilitySkill>) {
        self.skills.push(skill);
    }

    /// Skill names in precedence order.
    pub fn route_names(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.name().to_string()).collect()
    }

    /// First skill (in order) that recognizes `text`, with the intent it produced.
    pub fn recognize(&self, text: &str) -> Option<(Arc<dyn UtilitySkill>, UtilityIntent)> {
        let normalized = text.trim().to_lowercase();
        self.skills
            .iter()
            .find_map(|skill| skill.recognize(&normalized).map(|intent| (Arc::clone(skill), intent)))
    }

    /// Utility reply for `text`, or `None` when no skill recognizes it.
    pub async fn route(&self, text: &str) -> Option<Reply> {
        let (skill, intent) = self.recognize(text)?;
        tracing::info!(target: "parlor::router", skill = skill.name(), intent = ?intent, "Utility intent matched");
        Some(skill.answer(intent).await)
    }
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-request pipeline shared by every front end.
pub struct Pipeline {
    router: Arc<IntentRouter>,
    dialogue: DialogueAdapter,
}

impl Pipeline {
    pub fn new(router: Arc<IntentRouter>, dialogue: DialogueAdapter) -> Self {
        Self { router, dialogue }
    }

    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    /// Answers one message: binds the session id predicate, tries utility skills,
    /// then falls back to the dialogue engine. Always yields exactly one reply.
    ///
    /// Only an absent `user_id` becomes [`DEFAULT_USER_ID`]; a supplied one is used as is.
    pub async fn ask(&self, user_id: Option<&str>, message: &str) -> Reply {
        let user_id = user_id.unwrap_or(DEFAULT_USER_ID);
        let text = message.trim();

        self.dialogue.set_predicate(USER_ID_PREDICATE, user_id, user_id);

        if let Some(reply) = self.router.route(text).await {
            return reply;
        }
        self.dialogue.respond(text, user_id)
    }
}
