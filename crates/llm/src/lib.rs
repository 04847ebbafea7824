//! Language model integration for docqa.
//!
//! This crate provides a provider-agnostic abstraction over hosted and local
//! language models, plus the speech-to-text collaborator used to turn audio
//! into ingestible text.
//!
//! # Providers
//! - **Groq**: OpenAI-compatible chat completions (default)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use docqa_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod retry;
pub mod transcription;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_client_from_config};
pub use providers::{GroqClient, OllamaClient};
pub use retry::RetryingClient;
pub use transcription::{GroqTranscriber, Transcriber, TRANSCRIPTION_PROMPT};
pub use types::{ClientOptions, ProviderType};
