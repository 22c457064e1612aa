//! LLM settings read from `llm-config.json` and provider API key env vars.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::LLMProvider;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
/// Answers are short; the context already carries the facts.
pub const DEFAULT_MAX_TOKENS: usize = 150;
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Order tried when `preferred_provider` is `auto`.
const AUTO_ORDER: [LLMProvider; 3] = [LLMProvider::Anthropic, LLMProvider::Groq, LLMProvider::OpenAI];

/// Generation settings. Every field is optional in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// `auto`, `openai`, `anthropic` or `groq`.
    pub preferred_provider: String,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_model: String,
    pub groq_model: String,
    pub max_tokens: usize,
    pub temperature: f64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: "auto".into(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.into(),
            groq_model: DEFAULT_GROQ_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LLMConfig {
    /// Read `path` if present; keys missing from the file come from
    /// `OPENAI_API_KEY`, `ANTHROPIC_API_KEY` and `GROQ_API_KEY`.
    pub fn load(path: &Path) -> Self {
        let mut config = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring unreadable {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => {
                debug!("No LLM config at {}", path.display());
                Self::default()
            }
        };

        for provider in AUTO_ORDER {
            let slot = config.key_slot(provider);
            if slot.is_none() {
                *slot = std::env::var(env_key(provider)).ok().filter(|k| !k.is_empty());
            }
        }
        config
    }

    /// Provider, model and API key to call, or `None` if nothing usable is keyed.
    pub fn resolve_provider(&self) -> Option<(LLMProvider, String, String)> {
        let candidates: &[LLMProvider] = match self.preferred_provider.as_str() {
            "auto" => &AUTO_ORDER,
            "openai" => &[LLMProvider::OpenAI],
            "anthropic" => &[LLMProvider::Anthropic],
            "groq" => &[LLMProvider::Groq],
            other => {
                warn!("Unknown preferred_provider {:?}", other);
                &[]
            }
        };

        candidates.iter().find_map(|&provider| {
            let (model, key) = self.settings(provider);
            key.map(|k| (provider, model.to_string(), k.to_string()))
        })
    }

    fn settings(&self, provider: LLMProvider) -> (&str, Option<&str>) {
        match provider {
            LLMProvider::OpenAI => (&self.openai_model, self.openai_api_key.as_deref()),
            LLMProvider::Anthropic => (&self.anthropic_model, self.anthropic_api_key.as_deref()),
            LLMProvider::Groq => (&self.groq_model, self.groq_api_key.as_deref()),
        }
    }

    fn key_slot(&mut self, provider: LLMProvider) -> &mut Option<String> {
        match provider {
            LLMProvider::OpenAI => &mut self.openai_api_key,
            LLMProvider::Anthropic => &mut self.anthropic_api_key,
            LLMProvider::Groq => &mut self.groq_api_key,
        }
    }
}

fn env_key(provider: LLMProvider) -> &'static str {
    match provider {
        LLMProvider::OpenAI => "OPENAI_API_KEY",
        LLMProvider::Anthropic => "ANTHROPIC_API_KEY",
        LLMProvider::Groq => "GROQ_API_KEY",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keyed() -> LLMConfig {
        LLMConfig {
            openai_api_key: Some("sk-openai".into()),
            groq_api_key: Some("gsk-groq".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_auto_prefers_groq_over_openai() {
        let (provider, model, key) = keyed().resolve_provider().unwrap();
        assert_eq!(provider, LLMProvider::Groq);
        assert_eq!(model, DEFAULT_GROQ_MODEL);
        assert_eq!(key, "gsk-groq");
    }

    #[test]
    fn test_explicit_provider_without_key_resolves_to_none() {
        let config = LLMConfig {
            preferred_provider: "anthropic".into(),
            ..keyed()
        };
        assert!(config.resolve_provider().is_none());

        let config = LLMConfig {
            preferred_provider: "openai".into(),
            ..keyed()
        };
        assert_eq!(config.resolve_provider().unwrap().0, LLMProvider::OpenAI);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(
            &path,
            r#"{"preferred_provider": "groq", "groq_api_key": "gsk-file", "max_tokens": 64}"#,
        )
        .unwrap();

        let loaded = LLMConfig::load(&path);
        assert_eq!(loaded.preferred_provider, "groq");
        assert_eq!(loaded.groq_api_key.as_deref(), Some("gsk-file"));
        assert_eq!(loaded.max_tokens, 64);
        assert_eq!(loaded.groq_model, DEFAULT_GROQ_MODEL);
        assert_eq!(loaded.resolve_provider().unwrap().2, "gsk-file");
    }
}
