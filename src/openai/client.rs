use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ApiError, ChatMessage, ChatRequest, ChatResponse, Completion};
use crate::config::{AzureConfig, Secret};

pub const MAX_OUTPUT_TOKENS: u32 = 4096;
pub const TEMPERATURE: f32 = 0.3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=');

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion rate limit exceeded")]
    RateLimited,

    #[error("completion request rejected: {0}")]
    Unauthorized(String),

    #[error("completion API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("completion endpoint unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("completion response contained no text")]
    EmptyResponse,
}

/// Single-turn completion seam.
/// Implemented by `AzureOpenAiClient` for production; mock implementations used in tests.
pub trait CompletionClient {
    /// Deployment (model) the prompts are sent to.
    fn deployment(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<Completion, CompletionError>;
}

#[derive(Clone)]
pub struct AzureOpenAiClient {
    http: Client,
    endpoint: String,
    api_key: Secret,
    deployment: String,
    api_version: String,
}

impl AzureOpenAiClient {
    pub fn new(http: Client, config: &AzureConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: Secret::new("test-key"),
            deployment: "test-deployment".to_string(),
            api_version: crate::config::DEFAULT_API_VERSION.to_string(),
        }
    }

    async fn chat(&self, prompt: &str) -> Result<ChatResponse, CompletionError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint,
            utf8_percent_encode(&self.deployment, SEGMENT_ENCODE_SET),
            utf8_percent_encode(&self.api_version, SEGMENT_ENCODE_SET),
        );
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(&url)
            .header("api-key", self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("completion API rate limited");
            return Err(CompletionError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<ChatResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(status.as_u16(), err);
                warn!(error = %classified, "completion API error");
                return Err(classified);
            }
            let snippet: String = text.chars().take(200).collect();
            warn!(status = %status, "completion API error (no structured body)");
            return Err(CompletionError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let body: ChatResponse = response.json().await?;
        debug!(deployment = %self.deployment, "completion received");

        if let Some(err) = &body.error {
            let classified = classify_api_error(status.as_u16(), err);
            warn!(error = %classified, "completion API error in 200 response");
            return Err(classified);
        }

        Ok(body)
    }
}

impl CompletionClient for AzureOpenAiClient {
    fn deployment(&self) -> &str {
        &self.deployment
    }

    async fn complete(&self, prompt: &str) -> Result<Completion, CompletionError> {
        let body = self.chat(prompt).await?;

        let choice = body.choices.as_ref().and_then(|c| c.first());
        if let Some(reason) = choice.and_then(|c| c.finish_reason.as_deref())
            && reason == "content_filter"
        {
            warn!("completion truncated by content filter");
        }
        let text = choice
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .ok_or(CompletionError::EmptyResponse)?;

        Ok(Completion {
            text,
            usage: body.usage.unwrap_or_default(),
        })
    }
}

/// Uses the body's code when it is numeric, otherwise the HTTP status.
fn classify_api_error(status: u16, err: &ApiError) -> CompletionError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    let code = match &err.code {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|c| u16::try_from(c).ok()),
        Some(serde_json::Value::String(s)) => s.parse::<u16>().ok(),
        _ => None,
    }
    .unwrap_or(status);

    match code {
        429 => CompletionError::RateLimited,
        401 | 403 => CompletionError::Unauthorized(message),
        code => CompletionError::Api { code, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: serde_json::Value, message: &str) -> ApiError {
        ApiError {
            code: Some(code),
            message: Some(message.into()),
        }
    }

    #[test]
    fn classify_string_429_as_rate_limited() {
        let err = api_error("429".into(), "Requests exceeded");
        assert!(matches!(
            classify_api_error(200, &err),
            CompletionError::RateLimited
        ));
    }

    #[test]
    fn classify_401_as_unauthorized() {
        let err = api_error("401".into(), "Access denied due to invalid subscription key");
        assert!(matches!(
            classify_api_error(401, &err),
            CompletionError::Unauthorized(_)
        ));
    }

    #[test]
    fn classify_named_code_falls_back_to_status() {
        let err = api_error("DeploymentNotFound".into(), "The API deployment does not exist");
        match classify_api_error(404, &err) {
            CompletionError::Api { code, message } => {
                assert_eq!(code, 404);
                assert!(message.contains("deployment"));
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use crate::config::DEFAULT_API_VERSION;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CHAT_PATH: &str = "/openai/deployments/test-deployment/chat/completions";

    #[tokio::test]
    async fn complete_success_returns_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .and(query_param("api-version", DEFAULT_API_VERSION))
            .and(header("api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "max_tokens": 4096,
                "temperature": 0.3,
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "  Hi there.\n"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150}
            })))
            .mount(&server)
            .await;

        let client = AzureOpenAiClient::with_base_url(Client::new(), &server.uri());
        let completion = client.complete("hello").await.unwrap();

        assert_eq!(completion.text, "  Hi there.\n");
        assert_eq!(completion.usage.prompt_tokens, 100);
        assert_eq!(completion.usage.completion_tokens, 50);
        assert_eq!(completion.usage.total_tokens, 150);
    }

    #[tokio::test]
    async fn complete_429_returns_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = AzureOpenAiClient::with_base_url(Client::new(), &server.uri());
        let result = client.complete("hello").await;
        assert!(matches!(result, Err(CompletionError::RateLimited)));
    }

    #[tokio::test]
    async fn complete_401_with_error_body_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"code": "401", "message": "Access denied due to invalid subscription key."}
            })))
            .mount(&server)
            .await;

        let client = AzureOpenAiClient::with_base_url(Client::new(), &server.uri());
        let result = client.complete("hello").await;
        match result {
            Err(CompletionError::Unauthorized(message)) => {
                assert!(message.contains("subscription key"));
            }
            other => panic!("expected Unauthorized, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_500_with_invalid_body_returns_generic_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let client = AzureOpenAiClient::with_base_url(Client::new(), &server.uri());
        match client.complete("hello").await {
            Err(CompletionError::Api { code: 500, message }) => {
                assert!(message.contains("upstream exploded"), "got: {message}");
            }
            other => panic!("expected Api(500), got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_without_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = AzureOpenAiClient::with_base_url(Client::new(), &server.uri());
        let result = client.complete("hello").await;
        assert!(matches!(result, Err(CompletionError::EmptyResponse)));
    }
}
