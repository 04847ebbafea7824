//! LLM provider factory.
//!
//! This module creates LLM clients from application configuration. It
//! handles provider resolution, secret injection and the retry wrapper.

use crate::client::LlmClient;
use crate::providers::{GroqClient, OllamaClient};
use crate::retry::RetryingClient;
use crate::types::{ClientOptions, ProviderType};
use docqa_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "ollama")
/// * `options` - Endpoint, API key, timeout and retry budget
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// secret is missing.
pub fn create_client(provider: &str, options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let endpoint = options
        .endpoint
        .as_deref()
        .unwrap_or_else(|| provider_type.default_endpoint());

    let client: Arc<dyn LlmClient> = match provider_type {
        ProviderType::Ollama => Arc::new(OllamaClient::with_timeout(endpoint, options.timeout())?),
        ProviderType::Groq => {
            let api_key = options.api_key.as_deref().ok_or_else(|| {
                AppError::Config("Groq provider requires an API key".to_string())
            })?;
            Arc::new(GroqClient::with_options(endpoint, api_key, options.timeout())?)
        }
    };

    tracing::debug!(
        provider = provider_type.as_str(),
        endpoint,
        max_retries = options.max_retries,
        "Created LLM client"
    );

    if options.max_retries == 0 {
        return Ok(client);
    }

    Ok(Arc::new(RetryingClient::new(client, options.max_retries)))
}

/// Create the client for the active provider in `config`.
pub fn create_client_from_config(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider_config = config.get_provider_config(&config.provider);

    let options = ClientOptions {
        endpoint: provider_config.and_then(|p| p.endpoint()).map(str::to_string),
        api_key: config.resolve_api_key(&config.provider),
        timeout_secs: provider_config.and_then(|p| p.timeout()),
        max_retries: config.max_retries,
    };

    create_client(&config.provider, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", &ClientOptions::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let options = ClientOptions {
            endpoint: Some("http://localhost:8080".to_string()),
            ..Default::default()
        };
        assert!(create_client("ollama", &options).is_ok());
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client("groq", &ClientOptions::default()) {
            Err(AppError::Config(msg)) => assert!(msg.contains("requires an API key")),
            other => panic!("Expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_groq_is_wrapped_with_retries() {
        let options = ClientOptions {
            api_key: Some("gsk_test".to_string()),
            max_retries: 2,
            ..Default::default()
        };
        let client = create_client("groq", &options).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", &ClientOptions::default()) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_from_config_uses_ollama_without_key() {
        let config = AppConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };
        let client = create_client_from_config(&config).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }
}
