//! Reset command handler.

use clap::Args;
use docqa_core::config::AppConfig;
use docqa_knowledge::{collection_name, KnowledgeBase};

/// Drop a session's vectors and start it over
#[derive(Args, Debug)]
pub struct ResetCommand {
    /// Session whose collection is dropped
    #[arg(short, long)]
    pub session: Option<String>,
}

impl ResetCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let session = self.session.as_deref();
        tracing::info!("Resetting collection '{}'", collection_name(session));

        let knowledge = KnowledgeBase::from_config(config)?;
        let removed = knowledge.reset(session).await?;

        println!(
            "Removed {} chunks from '{}'. Please reprocess articles.",
            removed,
            collection_name(session)
        );
        Ok(())
    }
}
