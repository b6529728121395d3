//! Remote completion backends.
//!
//! [`CompletionBackend`] is the seam between the batch job and the inference
//! service; [`OpenAiClient`] implements it over the OpenAI Responses API.

use std::future::Future;
use std::time::Duration;

use asrskit_shared::{AsrsError, ClassifierConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("asrskit/", env!("CARGO_PKG_VERSION"));

/// Longest response body kept in error messages.
const MAX_ERROR_BODY: usize = 500;

/// Text produced by the model for one prompt, with reported token usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    /// Includes reasoning tokens, which are billed as output.
    pub output_tokens: u64,
}

/// A request/response text completion service.
pub trait CompletionBackend: Send + Sync {
    /// Send one prompt and wait for the full answer.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<Completion>> + Send;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<Reasoning<'a>>,
    input: [InputMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Reasoning<'a> {
    effort: &'a str,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl ResponsesResponse {
    /// Concatenate the `output_text` parts of every message item.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// Client for `POST {api_base}/responses`.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    reasoning_effort: Option<String>,
}

impl OpenAiClient {
    /// Build a client from the `[classifier]` config and a resolved API key.
    pub fn new(config: &ClassifierConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AsrsError::Network(format!("failed to build HTTP client: {e}")))?;

        let effort = config.reasoning_effort.trim();

        Ok(Self {
            client,
            endpoint: format!("{}/responses", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            reasoning_effort: (!effort.is_empty()).then(|| effort.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl CompletionBackend for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let body = ResponsesRequest {
            model: &self.model,
            reasoning: self
                .reasoning_effort
                .as_deref()
                .map(|effort| Reasoning { effort }),
            input: [InputMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AsrsError::Network(format!("{}: request timed out", self.endpoint))
                } else {
                    AsrsError::Network(format!("{}: {e}", self.endpoint))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AsrsError::Api {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let parsed: ResponsesResponse = response.json().await.map_err(|e| {
            AsrsError::Network(format!("{}: failed to read response body: {e}", self.endpoint))
        })?;

        let usage = parsed.usage.as_ref();
        let completion = Completion {
            text: parsed.output_text(),
            input_tokens: usage.map_or(0, |u| u.input_tokens),
            output_tokens: usage.map_or(0, |u| u.output_tokens),
        };

        debug!(
            input_tokens = completion.input_tokens,
            output_tokens = completion.output_tokens,
            "completion received"
        );

        Ok(completion)
    }
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ClassifierConfig {
        ClassifierConfig {
            api_base: format!("{}/v1/", server.uri()),
            timeout_secs: 5,
            ..ClassifierConfig::default()
        }
    }

    fn response_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "resp_1",
            "object": "response",
            "output": [
                { "type": "reasoning", "id": "rs_1", "summary": [] },
                {
                    "type": "message",
                    "role": "assistant",
                    "content": [ { "type": "output_text", "text": text, "annotations": [] } ]
                }
            ],
            "usage": { "input_tokens": 1200, "output_tokens": 850, "total_tokens": 2050 }
        })
    }

    #[test]
    fn request_serializes_reasoning_and_input() {
        let body = ResponsesRequest {
            model: "o3",
            reasoning: Some(Reasoning { effort: "medium" }),
            input: [InputMessage {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["reasoning"]["effort"], "medium");
        assert_eq!(json["input"][0]["role"], "user");
        assert_eq!(json["input"][0]["content"], "hello");
    }

    #[test]
    fn request_omits_empty_reasoning() {
        let body = ResponsesRequest {
            model: "gpt-4.1",
            reasoning: None,
            input: [InputMessage {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("reasoning"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééé", 3), "é…");
    }

    #[tokio::test]
    async fn complete_posts_to_responses_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "o3-2025-04-16",
                "reasoning": { "effort": "medium" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body("[]")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&config_for(&server), "sk-test".into()).unwrap();
        let completion = client.complete("classify this").await.unwrap();

        assert_eq!(completion.text, "[]");
        assert_eq!(completion.input_tokens, 1200);
        assert_eq!(completion.output_tokens, 850);
    }

    #[tokio::test]
    async fn complete_surfaces_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&config_for(&server), "sk-test".into()).unwrap();
        let err = client.complete("classify this").await.unwrap_err();

        match err {
            AsrsError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limit exceeded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_tolerates_missing_usage() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": [
                    { "type": "message", "content": [
                        { "type": "output_text", "text": "[" },
                        { "type": "output_text", "text": "]" }
                    ] }
                ]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&config_for(&server), "sk-test".into()).unwrap();
        let completion = client.complete("x").await.unwrap();
        assert_eq!(completion.text, "[]");
        assert_eq!(completion.output_tokens, 0);
    }
}
