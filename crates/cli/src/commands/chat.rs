//! Chat command handler.
//!
//! A read-eval-print loop over one session's answering engine. The
//! fallback offer carries across turns exactly as it does over HTTP.

use clap::Args;
use docqa_core::{config::AppConfig, AppError};
use docqa_knowledge::{collection_name, KnowledgeBase};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Ask questions interactively
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Session to chat in
    #[arg(short, long)]
    pub session: Option<String>,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let session = self.session.as_deref();
        let knowledge = KnowledgeBase::from_config(config)?;

        let engine = knowledge.session(session).await;
        if !engine.is_ready().await {
            println!("{}", AppError::NotReady);
        }
        println!(
            "Chatting in '{}'. Type 'exit' to leave.",
            collection_name(session)
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if matches!(question, "exit" | "quit") {
                break;
            }

            match engine.answer(question).await {
                Ok(answer) => println!("{}\n", answer),
                Err(AppError::NotReady) => println!("{}\n", AppError::NotReady),
                Err(e) => {
                    tracing::error!("Answer failed: {}", e);
                    eprintln!("Error: {}\n", e);
                }
            }
        }

        Ok(())
    }
}
