//! Intent Resolver for Assistant Commands
//!
//! Turns a typed or spoken command into a validated [`Action`]: a typed
//! command plus the persona-voiced reply to speak. Resolution goes through
//! a language model speaking a small JSON contract, or through the offline
//! [`KeywordResolver`].

mod actions;
mod error;
#[cfg(feature = "http")]
mod http;
mod keyword;
mod normalize;
mod persona;
mod resolver;
pub mod tools;
mod validate;

pub use actions::{
    Action, ActionKind, CollegeNotesRequest, Command, ContentType, Dialog, Difficulty, NewsQuery,
    Params, Route, TestRequest, Theme,
};
pub use error::{ResolutionError, Result, SchemaError};
#[cfg(feature = "http")]
pub use http::HttpCompletionClient;
pub use keyword::KeywordResolver;
pub use normalize::{normalize, DuplicateFilter, WakeWords};
pub use persona::{AssistantContext, Persona};
pub use resolver::{
    extract_json_object, instructions, parse_action, wake_word_action, ChatMessage, Completion,
    CompletionClient, IntentResolver, LlmIntentResolver, ToolCall, ToolSpec,
};
pub use validate::validate;

use serde::{Deserialize, Serialize};

/// Configuration for the model-backed resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Chat completions URL
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub temperature: f32,
    /// Tool rounds allowed before a final answer is required
    pub max_tool_rounds: usize,
    pub wake_words: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434/v1/chat/completions".to_string(),
            model: "llama3.1:8b".to_string(),
            api_key_env: Some("ASSISTANT_API_KEY".to_string()),
            temperature: 0.2,
            max_tool_rounds: 2,
            wake_words: vec!["Jarvis".to_string(), "Alya".to_string(), "Alia".to_string()],
        }
    }
}

impl ResolverConfig {
    pub fn wake_words(&self) -> WakeWords {
        WakeWords::new(&self.wake_words)
    }
}

/// Initialize the intent resolver system
pub fn init() -> Result<()> {
    tracing::info!("Initializing Intent Resolver");
    Ok(())
}

/// Offline resolver honouring the configured wake words.
pub fn create_keyword_resolver(config: &ResolverConfig) -> Result<KeywordResolver> {
    let resolver = KeywordResolver::new()
        .map_err(|e| ResolutionError::Config(format!("keyword patterns: {}", e)))?;
    Ok(resolver.with_wake_words(config.wake_words()))
}

/// Model-backed resolver talking to the configured endpoint.
#[cfg(feature = "http")]
pub fn create_http_resolver(
    config: &ResolverConfig,
) -> Result<LlmIntentResolver<HttpCompletionClient>> {
    let client = HttpCompletionClient::new(config)?;
    Ok(LlmIntentResolver::new(client)
        .with_wake_words(config.wake_words())
        .with_max_tool_rounds(config.max_tool_rounds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_and_partial_json() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"model": "gpt-4o-mini", "max_tool_rounds": 1}"#).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tool_rounds, 1);
        assert_eq!(config.endpoint, ResolverConfig::default().endpoint);
        assert!(config.wake_words().strip_prefix("hey jarvis open notes").is_some());
    }

    #[tokio::test]
    async fn test_keyword_resolver_uses_configured_wake_words() {
        let config = ResolverConfig {
            wake_words: vec!["Friday".to_string()],
            ..ResolverConfig::default()
        };
        let resolver = create_keyword_resolver(&config).unwrap();
        let action = resolver
            .resolve("Friday", &AssistantContext::default(), Persona::Jarvis)
            .await
            .unwrap();
        assert!(action.is_wake_word());

        let action = resolver
            .resolve("Jarvis", &AssistantContext::default(), Persona::Jarvis)
            .await
            .unwrap();
        assert!(!action.is_wake_word());
    }
}
