//! Retrieval-augmented answering with fallback negotiation.

use crate::rag::context::format_passages;
use crate::rag::negotiation::{plan, settle, NegotiationState, TurnPlan};
use crate::rag::verdict;
use crate::retriever::Retriever;
use docqa_core::{AppConfig, AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use docqa_prompt::{build_prompt, resolve_prompt, PromptDefinition, QA_ARTICLE_ID};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Model settings and prompt used for every turn.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub model: String,
    pub temperature: f32,
    pub prompt: PromptDefinition,
}

impl EngineSettings {
    pub fn new(model: impl Into<String>, temperature: f32, prompt: PromptDefinition) -> Self {
        Self {
            model: model.into(),
            temperature,
            prompt,
        }
    }

    /// Active model and temperature, with the workspace's `qa.article` prompt.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let prompt = resolve_prompt(&config.workspace, QA_ARTICLE_ID)?;
        Ok(Self::new(config.model.clone(), config.temperature, prompt))
    }
}

/// Answers questions for one conversation.
///
/// Holds the bound retriever and the negotiation state. Turns on the same
/// engine are serialised: the state lock is held for the whole turn.
pub struct AnsweringEngine {
    llm: Arc<dyn LlmClient>,
    settings: EngineSettings,
    retriever: RwLock<Option<Arc<dyn Retriever>>>,
    state: Mutex<NegotiationState>,
}

impl AnsweringEngine {
    pub fn new(llm: Arc<dyn LlmClient>, settings: EngineSettings) -> Self {
        Self {
            llm,
            settings,
            retriever: RwLock::new(None),
            state: Mutex::new(NegotiationState::Idle),
        }
    }

    /// Bind a new retriever, replacing any previous one.
    ///
    /// The negotiation state is left untouched.
    pub async fn ingest(&self, retriever: Arc<dyn Retriever>) {
        *self.retriever.write().await = Some(retriever);
        tracing::debug!("Bound new retriever");
    }

    /// Whether a retriever is bound.
    pub async fn is_ready(&self) -> bool {
        self.retriever.read().await.is_some()
    }

    /// Snapshot of the negotiation state.
    pub async fn state(&self) -> NegotiationState {
        self.state.lock().await.clone()
    }

    /// Answer one user turn.
    pub async fn answer(&self, query: &str) -> AppResult<String> {
        let mut state = self.state.lock().await;
        let retriever = self.retriever.read().await.clone();

        if retriever.is_none() && !state.is_awaiting_permission() {
            return Err(AppError::NotReady);
        }

        match plan(&state, query) {
            TurnPlan::FromModelKnowledge { question } => {
                *state = NegotiationState::Idle;
                tracing::info!("Answering pending question from model knowledge");
                self.answer_from_model_knowledge(&question).await
            }
            TurnPlan::Retrieve { query } => {
                let retriever = retriever.ok_or(AppError::NotReady)?;
                let verdict = self.answer_from_context(retriever.as_ref(), &query).await?;

                *state = settle(TurnPlan::Retrieve { query }, verdict.not_found);
                if verdict.not_found {
                    tracing::info!("Context did not answer the question; offered model knowledge");
                }
                Ok(verdict.answer)
            }
        }
    }

    async fn answer_from_model_knowledge(&self, question: &str) -> AppResult<String> {
        let request = LlmRequest::new(question, &self.settings.model)
            .with_temperature(self.settings.temperature);
        let response = self.llm.complete(&request).await?;

        Ok(format!(
            "📚 From my own knowledge:\n\n{}\n\n_(Please verify externally.)_",
            response.content
        ))
    }

    async fn answer_from_context(
        &self,
        retriever: &dyn Retriever,
        query: &str,
    ) -> AppResult<verdict::Verdict> {
        let passages = retriever.retrieve(query).await.map_err(|e| {
            if e.is_upstream() {
                e
            } else {
                AppError::Upstream(format!("Retrieval failed: {}", e))
            }
        })?;
        tracing::debug!("Retrieved {} passages", passages.len());

        let mut variables = HashMap::new();
        variables.insert("prompt".to_string(), query.to_string());
        let built = build_prompt(
            &self.settings.prompt,
            variables,
            Some(format_passages(&passages)),
        )?;

        let mut request = LlmRequest::new(built.user, &self.settings.model)
            .with_temperature(self.settings.temperature);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self.llm.complete(&request).await?;
        Ok(verdict::inspect(&response.content))
    }
}

impl std::fmt::Debug for AnsweringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsweringEngine")
            .field("provider", &self.llm.provider_name())
            .field("model", &self.settings.model)
            .finish_non_exhaustive()
    }
}
