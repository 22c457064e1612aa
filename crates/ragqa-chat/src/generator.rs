//! The generation capability: (question, context) → answer.

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::config::LLMConfig;
use crate::prompt::build_messages;
use crate::providers::{complete, Sampling};
use crate::types::LLMProvider;
use ragqa_core::Result;

/// Produces an answer to a question from retrieved context.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> Result<String>;

    /// Short label for logs and stats, e.g. `groq/llama-3.1-8b-instant`.
    fn describe(&self) -> String;
}

/// Generator backed by a hosted chat-completion API.
pub struct LlmGenerator {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: String,
    sampling: Sampling,
}

impl LlmGenerator {
    pub fn new(provider: LLMProvider, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            provider,
            model: model.into(),
            api_key: api_key.into(),
            sampling: Sampling {
                temperature: crate::config::DEFAULT_TEMPERATURE,
                max_tokens: crate::config::DEFAULT_MAX_TOKENS,
            },
        }
    }

    /// Build from stored config. `None` when no provider has an API key.
    pub fn from_config(config: &LLMConfig) -> Option<Self> {
        let (provider, model, api_key) = config.resolve_provider()?;
        info!("Using LLM provider {} with model {}", provider, model);
        let mut generator = Self::new(provider, model, api_key);
        generator.sampling = Sampling {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };
        Some(generator)
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let messages = build_messages(question, context);
        complete(
            &self.client,
            self.provider,
            &messages,
            &self.model,
            &self.api_key,
            self.sampling,
        )
        .await
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_without_keys_is_none() {
        let config = LLMConfig {
            preferred_provider: "openai".into(),
            ..Default::default()
        };
        assert!(LlmGenerator::from_config(&config).is_none());
    }

    #[test]
    fn test_from_config_uses_resolved_provider() {
        let config = LLMConfig {
            anthropic_api_key: Some("sk-ant".into()),
            max_tokens: 32,
            ..Default::default()
        };
        let generator = LlmGenerator::from_config(&config).unwrap();
        assert_eq!(generator.provider(), LLMProvider::Anthropic);
        assert_eq!(
            generator.describe(),
            format!("anthropic/{}", crate::config::DEFAULT_ANTHROPIC_MODEL)
        );
        assert_eq!(generator.sampling.max_tokens, 32);
    }

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, question: &str, context: &str) -> Result<String> {
            Ok(format!("{}|{}", question, context))
        }

        fn describe(&self) -> String {
            "echo".into()
        }
    }

    #[tokio::test]
    async fn test_generator_is_object_safe() {
        let generator: std::sync::Arc<dyn Generator> = std::sync::Arc::new(EchoGenerator);
        assert_eq!(generator.generate("q", "ctx").await.unwrap(), "q|ctx");
    }
}
