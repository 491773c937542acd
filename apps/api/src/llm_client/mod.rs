//! Anthropic Messages API client. Every model call in the service goes through
//! `LlmClient`; the model is pinned in `MODEL`.
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every LLM call.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_ATTEMPTS: u32 = 4;
/// Low temperature keeps reviews of the same shortlist consistent.
const TEMPERATURE: f32 = 0.2;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl MessagesResponse {
    /// Text of the first `text` block, if any.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Outcome of a single HTTP attempt.
enum Attempt {
    Done(MessagesResponse),
    Retry(LlmError),
    Fail(LlmError),
}

/// 1s, 2s, 4s before the second, third and fourth attempts.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.saturating_sub(1).min(2))
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Anthropic Messages API client with retries and JSON-output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: ANTHROPIC_API_BASE.to_string(),
        })
    }

    /// Points the client at another host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sends one user prompt. Rate limits, 5xx responses and transport errors are
    /// retried up to `MAX_ATTEMPTS` times; other 4xx responses fail immediately.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<MessagesResponse, LlmError> {
        let request = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error = None;
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!("Retrying LLM call in {}s (attempt {}/{MAX_ATTEMPTS})", delay.as_secs(), attempt + 1);
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&request).await {
                Attempt::Done(response) => {
                    debug!(
                        "LLM call succeeded: input_tokens={}, output_tokens={}",
                        response.usage.input_tokens, response.usage.output_tokens
                    );
                    return Ok(response);
                }
                Attempt::Retry(e) => last_error = Some(e),
                Attempt::Fail(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_ATTEMPTS,
        }))
    }

    async fn send_once(&self, request: &MessagesRequest<'_>) -> Attempt {
        let sent = self
            .client
            .post(format!("{}{MESSAGES_PATH}", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(LlmError::Http(e)),
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<MessagesResponse>().await {
                Ok(parsed) => Attempt::Done(parsed),
                Err(e) => Attempt::Fail(LlmError::Http(e)),
            };
        }

        let body = response.text().await.unwrap_or_default();
        if is_retryable(status) {
            warn!("LLM API returned {status}: {body}");
            return Attempt::Retry(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        Attempt::Fail(LlmError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Calls the model and deserializes its text reply as JSON.
    /// The prompt must instruct the model to return JSON only.
    pub async fn call_json<T: DeserializeOwned>(&self, prompt: &str, system: &str) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(serde_json::from_str(strip_json_fences(text))?)
    }
}

/// Removes a surrounding markdown fence (optionally tagged `json`) from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim_end().strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": 1}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": 1}");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        assert_eq!(strip_json_fences("```json\n[1, 2]"), "[1, 2]");
    }

    #[test]
    fn test_backoff_schedule() {
        let delays: Vec<u64> = (1..MAX_ATTEMPTS).map(|a| backoff_delay(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4]);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_text_skips_non_text_blocks() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "thinking"},
                {"type": "text", "text": "hello"}
            ],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }))
        .unwrap();
        assert_eq!(response.text(), Some("hello"));
    }
}
