//! Anthropic Messages API client.
//!
//! Implements the workflow engine's `LlmClient` port. One completion call
//! per request, no retries; text generation is the long pole of a proposal
//! run, so the timeout is configured well above the CRM calls.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use propflow_core::config::LlmConfig;
use propflow_core::ports::LlmClient;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub struct AnthropicClient {
    http: Client,
    api_key: SecretString,
    model: String,
    messages_url: String,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build Anthropic HTTP client")?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            messages_url: MESSAGES_URL.to_owned(),
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

fn collect_text(response: &MessagesResponse) -> String {
    response
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text.as_str())
        .collect::<String>()
        .trim()
        .to_owned()
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        debug!(model = %self.model, user_chars = user.len(), "anthropic completion request");

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: [UserMessage { role: "user", content: user }],
        };
        let response = self
            .http
            .post(&self.messages_url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("request to Anthropic failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Anthropic returned {status}: {detail}"));
        }

        let decoded: MessagesResponse =
            response.json().await.context("failed to decode Anthropic response")?;
        Ok(collect_text(&decoded))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{collect_text, MessagesRequest, MessagesResponse, UserMessage, MAX_TOKENS};

    #[test]
    fn request_serializes_to_the_messages_api_shape() {
        let request = MessagesRequest {
            model: "claude-sonnet-4-20250514",
            max_tokens: MAX_TOKENS,
            system: "You are a RevOps consultant.",
            messages: [UserMessage { role: "user", content: "Company: Acme Corp" }],
        };
        let body = serde_json::to_value(&request).expect("request should serialize");

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["system"], "You are a RevOps consultant.");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Company: Acme Corp");
    }

    #[test]
    fn text_blocks_are_concatenated_and_trimmed() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "  <h3>Summary</h3>" },
                { "type": "tool_use", "id": "t1", "name": "noop", "input": {} },
                { "type": "text", "text": "<p>Body</p>\n" },
            ],
        }))
        .expect("response should decode");

        assert_eq!(collect_text(&response), "<h3>Summary</h3><p>Body</p>");
    }

    #[test]
    fn empty_content_yields_an_empty_string() {
        let response: MessagesResponse =
            serde_json::from_value(json!({ "id": "msg_1", "content": [] })).expect("decode");
        assert_eq!(collect_text(&response), "");
    }
}
