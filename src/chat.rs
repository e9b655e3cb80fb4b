//! Language-model chat relay.
//!
//! Defines the [`ChatModel`] trait and [`OllamaChat`], which talks to an
//! Ollama-compatible `POST /api/chat` endpoint. Each turn is a single
//! blocking request with a fixed timeout and no retry.
//!
//! Chat failures are not Rust errors: they come back as reply text
//! (`Error: <status> - <body>` or `Error: <cause>`) so the relay can hand
//! them straight to the user.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ModelConfig;

/// Default system prompt that keeps the assistant inside the ontology.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an ontology-bound AI assistant. \
You only answer questions about the topics, entities, relationships and processes \
defined in the provided ontology context.

If a question is about the ontology, answer using only the ontology data.
If a question is outside the ontology, respond: \"I can only discuss topics within \
the provided ontology context. Please ask about entities, relationships, or processes \
defined in the knowledge base.\"

Speak directly to the user, keep answers concise and conversational, and do not \
offer general knowledge that the ontology does not contain.";

const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// A chat-capable language model backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier sent with each request (e.g. `"qwen2.5-coder:7b"`).
    fn model_name(&self) -> &str;

    /// Base URL of the backend, for status reporting.
    fn base_url(&self) -> &str;

    /// Sends one user turn, optionally grounded in ontology `context`.
    ///
    /// Always returns text; failures are rendered as `Error: ...`.
    async fn chat(&self, message: &str, context: &str) -> String;

    /// Whether the backend answers at all.
    async fn is_available(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Builds the message list for one turn: system prompt, then the user turn.
pub fn build_messages(system_prompt: &str, message: &str, context: &str) -> Vec<ChatMessage> {
    let user = if context.is_empty() {
        message.to_string()
    } else {
        format!(
            "Ontology Context:\n{}\n\nUser Question: {}",
            context, message
        )
    };
    vec![
        ChatMessage::new("system", system_prompt),
        ChatMessage::new("user", user),
    ]
}

/// Client for an Ollama-compatible chat API.
pub struct OllamaChat {
    base_url: String,
    model: String,
    system_prompt: String,
    client: reqwest::Client,
}

impl OllamaChat {
    pub fn new(config: &ModelConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.name.clone(),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            client,
        })
    }

    async fn send(&self, messages: &[ChatMessage]) -> Result<String, reqwest::Error> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let parsed: ChatResponse = response.json().await?;
            return Ok(parsed.message.content);
        }

        let text = response.text().await.unwrap_or_default();
        Ok(format!("Error: {} - {}", status.as_u16(), text))
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn chat(&self, message: &str, context: &str) -> String {
        let messages = build_messages(&self.system_prompt, message, context);
        match self.send(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, url = %self.base_url, "chat request failed");
                format!("Error: {}", e)
            }
        }
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(AVAILABILITY_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}
