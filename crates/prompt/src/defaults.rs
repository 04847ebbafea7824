//! Built-in prompt definitions and the phrases the answering engine keys on.

use crate::types::PromptDefinition;
use docqa_core::{AppError, AppResult};

/// Identifier of the article question-answering prompt.
pub const QA_ARTICLE_ID: &str = "qa.article";

/// Sentence the model emits when the context does not answer the question.
pub const FALLBACK_OFFER: &str = "It is not provided in the article, but I can assist you using my knowledge if you want. Would you like that?";

/// Leading verdict tag the model is asked to emit before its answer.
pub const VERDICT_TAG: &str = "FOUND_IN_CONTEXT";

/// Source line for answers that come from the model's own knowledge.
pub const KNOWLEDGE_ONLY_SOURCE: &str =
    "This is from my knowledge only. Kindly verify it on the internet.";

const QA_ARTICLE_YAML: &str = include_str!("../prompts/qa.article.yml");

/// Look up a built-in prompt definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<Option<PromptDefinition>> {
    match prompt_id {
        QA_ARTICLE_ID => serde_yaml::from_str(QA_ARTICLE_YAML)
            .map(Some)
            .map_err(|e| AppError::Prompt(format!("Built-in prompt {} is invalid: {}", prompt_id, e))),
        _ => Ok(None),
    }
}
