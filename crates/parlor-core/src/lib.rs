//! parlor-core: shared types, config, brain (AIML-subset dialogue engine),
//! knowledge-base bootstrap, and the utility-first request pipeline.

mod bootstrap;
mod brain;
mod dialogue;
mod orchestrator;
mod shared;

// Shared
pub use shared::{CoreConfig, Reply, UtilityIntent, DEFAULT_USER_ID, FALLBACK_REPLY, USER_ID_PREDICATE};

// Brain and bootstrap
pub use bootstrap::{bootstrap, BootSource, BootstrapError};
pub use brain::{Brain, BrainError};

// Dialogue
pub use dialogue::{DialogueAdapter, DialogueEngine};

// Orchestrator
pub use orchestrator::{IntentRouter, Pipeline, UtilitySkill};
