//! Per-conversation engine registry.

use crate::config::collection_name;
use crate::rag::engine::{AnsweringEngine, EngineSettings};
use docqa_llm::LlmClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Maps session ids to their answering engines.
pub struct SessionRegistry {
    llm: Arc<dyn LlmClient>,
    settings: EngineSettings,
    sessions: Mutex<HashMap<String, Arc<AnsweringEngine>>>,
}

impl SessionRegistry {
    pub fn new(llm: Arc<dyn LlmClient>, settings: EngineSettings) -> Self {
        Self {
            llm,
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Engine for `session_id`, creating it if needed.
    ///
    /// Returns whether the engine was newly created.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> (Arc<AnsweringEngine>, bool) {
        let id = collection_name(session_id);
        let mut sessions = self.sessions.lock().await;

        if let Some(engine) = sessions.get(&id) {
            return (engine.clone(), false);
        }

        tracing::debug!("Creating session '{}'", id);
        let engine = Arc::new(self.fresh_engine());
        sessions.insert(id, engine.clone());
        (engine, true)
    }

    /// Replace the session's engine with a fresh one.
    pub async fn reset(&self, session_id: Option<&str>) -> Arc<AnsweringEngine> {
        let id = collection_name(session_id);
        let engine = Arc::new(self.fresh_engine());
        self.sessions.lock().await.insert(id.clone(), engine.clone());
        tracing::info!("Reset session '{}'", id);
        engine
    }

    fn fresh_engine(&self) -> AnsweringEngine {
        AnsweringEngine::new(self.llm.clone(), self.settings.clone())
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("provider", &self.llm.provider_name())
            .finish_non_exhaustive()
    }
}
