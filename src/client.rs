//! HTTP client commands for a running relay.
//!
//! Backs the `onto status|ontologies|load|upload|chat|context|query`
//! commands and the terminal chat loop in [`crate::repl`]. Network failures
//! are reported on stdout as `Error: ...`; they do not abort the process.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

const QUICK_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin wrapper around the relay's JSON endpoints.
pub struct RelayClient {
    base_url: String,
    client: reqwest::Client,
}

impl RelayClient {
    /// `chat_timeout_secs` bounds chat requests; other calls use 5 seconds.
    pub fn new(base_url: &str, chat_timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(chat_timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let resp = self
            .client
            .get(self.url(path))
            .timeout(QUICK_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("cannot reach relay at {}", self.base_url))?;
        Ok(resp.json().await?)
    }

    async fn post_message(&self, path: &str, message: &str, quick: bool) -> Result<Value> {
        let mut req = self
            .client
            .post(self.url(path))
            .json(&serde_json::json!({ "message": message }));
        if quick {
            req = req.timeout(QUICK_TIMEOUT);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("cannot reach relay at {}", self.base_url))?;
        Ok(resp.json().await?)
    }

    /// `GET /`: service description.
    pub async fn status(&self) -> Result<Value> {
        self.get_json("/").await
    }

    pub async fn ontologies(&self) -> Result<Vec<String>> {
        let body = self.get_json("/ontologies").await?;
        Ok(string_list(&body["ontologies"]))
    }

    /// Loads a stored ontology; `Ok(Err(msg))` when the relay refused it.
    pub async fn load(&self, name: &str) -> Result<std::result::Result<String, String>> {
        let body = self
            .post_message("/load-ontology-from-storage", name, true)
            .await?;
        Ok(load_outcome(&body))
    }

    pub async fn upload(&self, path: &Path) -> Result<std::result::Result<String, String>> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("invalid file name: {}", path.display()))?
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(self.url("/load-ontology"))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("cannot reach relay at {}", self.base_url))?;
        let body: Value = resp.json().await?;
        Ok(load_outcome(&body))
    }

    pub async fn chat(&self, message: &str) -> Result<String> {
        let body = self.post_message("/chat", message, false).await?;
        Ok(body["response"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error_text(&body).unwrap_or_else(|| "No response".to_string())))
    }

    pub async fn context(&self) -> Result<String> {
        let body = self.get_json("/ontology-context").await?;
        Ok(body["context"].as_str().unwrap_or("No context").to_string())
    }

    pub async fn query(&self, term: &str) -> Result<String> {
        let body = self.post_message("/query-ontology", term, true).await?;
        Ok(body["result"].as_str().unwrap_or("No result").to_string())
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Extracts the error text from either `{error: "..."}` or
/// `{error: {code, message}}`.
fn error_text(body: &Value) -> Option<String> {
    match &body["error"] {
        Value::String(s) => Some(s.clone()),
        Value::Object(detail) => detail
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}

fn load_outcome(body: &Value) -> std::result::Result<String, String> {
    match body["message"].as_str() {
        Some(message) => Ok(message.to_string()),
        None => Err(error_text(body).unwrap_or_else(|| "Unknown error".to_string())),
    }
}

// ============ CLI entry points ============

pub async fn run_status(client: &RelayClient) -> Result<()> {
    match client.status().await {
        Ok(body) => {
            println!("Relay is running at {}", client.base_url());
            println!(
                "Model URL: {}",
                body["model_url"].as_str().unwrap_or("Unknown")
            );
            if let Some(model) = body["model"].as_str() {
                println!("Model: {}", model);
            }
        }
        Err(e) => println!("Relay not available: {:#}", e),
    }
    Ok(())
}

pub async fn run_ontologies(client: &RelayClient) -> Result<()> {
    match client.ontologies().await {
        Ok(names) if names.is_empty() => println!("No ontologies found"),
        Ok(names) => {
            println!("Available ontologies:");
            for name in names {
                println!("  - {}", name);
            }
        }
        Err(e) => println!("Error: {:#}", e),
    }
    Ok(())
}

pub async fn run_load(client: &RelayClient, name: &str) -> Result<()> {
    match client.load(name).await {
        Ok(Ok(message)) => println!("{}", message),
        Ok(Err(error)) => println!("Error: {}", error),
        Err(e) => println!("Error: {:#}", e),
    }
    Ok(())
}

pub async fn run_upload(client: &RelayClient, path: &Path) -> Result<()> {
    match client.upload(path).await {
        Ok(Ok(message)) => println!("{}", message),
        Ok(Err(error)) => println!("Error: {}", error),
        Err(e) => println!("Error: {:#}", e),
    }
    Ok(())
}

pub async fn run_chat(client: &RelayClient, message: &str) -> Result<()> {
    match client.chat(message).await {
        Ok(reply) => println!("{}", reply),
        Err(e) => println!("Error: {:#}", e),
    }
    Ok(())
}

pub async fn run_context(client: &RelayClient) -> Result<()> {
    match client.context().await {
        Ok(context) => {
            println!("Current ontology context:");
            println!("{}", context);
        }
        Err(e) => println!("Error: {:#}", e),
    }
    Ok(())
}

pub async fn run_query(client: &RelayClient, term: &str) -> Result<()> {
    match client.query(term).await {
        Ok(result) => println!("{}", result),
        Err(e) => println!("Error: {:#}", e),
    }
    Ok(())
}
