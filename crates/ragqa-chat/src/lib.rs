//! Answer generation through external LLM APIs (OpenAI/Anthropic/Groq).
//!
//! Retrieved fragments are joined into a context block and sent with the
//! question; the model is told to answer from that context only.

pub mod config;
pub mod generator;
pub mod prompt;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use generator::{Generator, LlmGenerator};
pub use types::*;
