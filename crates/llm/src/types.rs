//! Provider identification and client construction options.

use std::time::Duration;

/// Default request timeout for hosted providers.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Groq,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "groq" => Some(Self::Groq),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Ollama => "ollama",
        }
    }

    /// Default API base URL.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }
}

/// Options shared by every client the factory builds.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Custom endpoint (falls back to the provider default)
    pub endpoint: Option<String>,

    /// API key (required by hosted providers)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Automatic retries on transient failures; 0 disables the retry wrapper
    pub max_retries: u32,
}

impl ClientOptions {
    /// Effective request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("groq"), Some(ProviderType::Groq));
        assert_eq!(ProviderType::parse("Ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("unknown"), None);
    }

    #[test]
    fn test_default_timeout() {
        let options = ClientOptions::default();
        assert_eq!(options.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
