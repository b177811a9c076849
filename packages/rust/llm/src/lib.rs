//! Remote language-model transformation of page text.
//!
//! One page of text plus the user's instruction go out as a single
//! chat-completions request; the model's reply comes back as the
//! transformed text. Any failure here is fatal to the run.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use webdigest_shared::{LlmConfig, Result, WebdigestError};

/// Longest slice of an error response body quoted in error messages.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Turns page text into transformed text according to an instruction.
pub trait ContentTransformer {
    fn transform(
        &self,
        content: &str,
        instruction: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Wire types (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Chat-completions client authenticated with a bearer key.
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WebdigestError::config(format!("failed to build HTTP client: {e}")))?;

        info!(endpoint = %config.endpoint, model = %config.model, "transform client configured");

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ContentTransformer for ChatCompletionsClient {
    #[instrument(skip_all, fields(model = %self.model, content_len = content.len()))]
    async fn transform(&self, content: &str, instruction: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WebdigestError::Transform(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WebdigestError::Transform(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(WebdigestError::Transform(format!(
                "HTTP {status}: {}",
                truncate(&body, MAX_ERROR_BODY_CHARS)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| WebdigestError::Transform(format!("malformed response body: {e}")))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                tokens_in = usage.prompt_tokens,
                tokens_out = usage.completion_tokens,
                "transform complete"
            );
        }

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WebdigestError::Transform("response contained no message content".into()))?;

        Ok(text)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
