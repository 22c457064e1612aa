//! External LLM provider calls.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API with the system prompt carried outside the message list.

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::types::{ChatMessage, LLMProvider};
use ragqa_core::{Error, Result};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Sampling parameters shared by every provider.
#[derive(Debug, Clone, Copy)]
pub struct Sampling {
    pub temperature: f64,
    pub max_tokens: usize,
}

/// Send a completion request to the given provider and return the reply text.
pub async fn complete(
    client: &Client,
    provider: LLMProvider,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    sampling: Sampling,
) -> Result<String> {
    match provider {
        LLMProvider::OpenAI => {
            complete_openai_compat(client, OPENAI_URL, messages, model, api_key, sampling).await
        }
        LLMProvider::Groq => {
            complete_openai_compat(client, GROQ_URL, messages, model, api_key, sampling).await
        }
        LLMProvider::Anthropic => {
            complete_anthropic(client, messages, model, api_key, sampling).await
        }
    }
}

async fn complete_openai_compat(
    client: &Client,
    url: &str,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    sampling: Sampling,
) -> Result<String> {
    let body = json!({
        "model": model,
        "messages": messages,
        "temperature": sampling.temperature,
        "max_tokens": sampling.max_tokens,
    });

    debug!("Requesting completion from {} with model {}", url, model);

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Generation(format!("Request failed: {}", e)))?;

    let payload = read_json(response).await?;
    parse_openai_reply(&payload)
}

async fn complete_anthropic(
    client: &Client,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    sampling: Sampling,
) -> Result<String> {
    let system_msg = messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.clone());
    let conv_msgs: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != "system").collect();

    let mut body = json!({
        "model": model,
        "messages": conv_msgs,
        "temperature": sampling.temperature,
        "max_tokens": sampling.max_tokens,
    });
    if let Some(sys) = system_msg {
        body["system"] = json!(sys);
    }

    debug!("Requesting completion from Anthropic with model {}", model);

    let response = client
        .post(ANTHROPIC_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Generation(format!("Request failed: {}", e)))?;

    let payload = read_json(response).await?;
    parse_anthropic_reply(&payload)
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("LLM API error {}: {}", status, body);
        return Err(Error::Generation(format!("API error {}: {}", status, body)));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| Error::Generation(format!("Invalid response body: {}", e)))
}

fn parse_openai_reply(payload: &Value) -> Result<String> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| Error::Generation("response has no choices[0].message.content".into()))
}

fn parse_anthropic_reply(payload: &Value) -> Result<String> {
    if payload["type"] == "error" {
        let msg = payload["error"]["message"].as_str().unwrap_or("Unknown error");
        return Err(Error::Generation(msg.to_string()));
    }
    let text: String = payload["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"] == "text")
                .filter_map(|b| b["text"].as_str())
                .collect()
        })
        .unwrap_or_default();
    if text.is_empty() {
        return Err(Error::Generation("response has no text content".into()));
    }
    Ok(text.trim().to_string())
}
