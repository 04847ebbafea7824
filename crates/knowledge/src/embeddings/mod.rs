//! Embedding providers for the vector index.
//!
//! Provides provider-agnostic embedding generation. The provider is chosen
//! once from configuration and shared by every collection.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
