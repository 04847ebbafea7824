//! Prompt system for docqa.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Handlebars template rendering for system and user messages
//! - Knowledge base context injection
//! - A built-in `qa.article` definition, overridable per workspace

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{builtin_prompt, FALLBACK_OFFER, KNOWLEDGE_ONLY_SOURCE, QA_ARTICLE_ID, VERDICT_TAG};
pub use loader::{load_prompt, resolve_prompt};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptContextConfig, PromptDefinition,
    PromptInputSpec, PromptOutputSpec,
};
