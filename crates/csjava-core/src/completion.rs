//! Text-completion service client
//!
//! The converter only needs `complete(system, user) -> text`. Any failure
//! is treated by callers as "no usable response".

use crate::config::CompletionConfig;
use crate::error::{CoreError, Result};
use crate::types::Provider;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// One chat-style completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Text-completion service
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion and return the reply text
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Send a fixed greeting and return the reply
pub async fn test_connection(client: &dyn CompletionClient) -> Result<String> {
    let request = CompletionRequest::new(
        "You are a helpful assistant.",
        "Hello! Please respond with 'Connection successful!'",
    )
    .with_max_tokens(50);
    client.complete(request).await
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn reply_text(response: ChatResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::Completion("Response contained no choices".to_string()))?;
    choice
        .message
        .content
        .filter(|content| !content.is_empty())
        .ok_or_else(|| CoreError::Completion("Response message was empty".to_string()))
}

fn error_message(body: &str) -> String {
    let error: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
    error["error"]["message"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Chat-completions client for Azure OpenAI and OpenAI-compatible services
pub struct HttpCompletionClient {
    http: ReqwestClient,
    config: CompletionConfig,
}

impl HttpCompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// Full chat-completions URL, without query parameters
    pub fn endpoint_url(&self) -> Result<String> {
        let base = self
            .config
            .resolved_endpoint()
            .ok_or_else(|| CoreError::Config("No completion endpoint configured".to_string()))?;

        match self.config.provider {
            Provider::Azure => {
                let deployment = self.config.deployment.as_deref().ok_or_else(|| {
                    CoreError::Config("No Azure deployment configured".to_string())
                })?;
                Ok(format!(
                    "{}/openai/deployments/{}/chat/completions",
                    base, deployment
                ))
            }
            Provider::OpenAI => Ok(format!("{}/chat/completions", base)),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let url = self.endpoint_url()?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| CoreError::Config("No API key configured".to_string()))?;

        let body = ChatRequest {
            model: match self.config.provider {
                Provider::Azure => None,
                Provider::OpenAI => Some(self.config.model.as_str()),
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let builder = match self.config.provider {
            Provider::Azure => self
                .http
                .post(&url)
                .query(&[("api-version", self.config.api_version.as_str())])
                .header("api-key", api_key),
            Provider::OpenAI => self.http.post(&url).bearer_auth(api_key),
        };

        debug!(
            "Sending completion request to {} (max_tokens={})",
            url, request.max_tokens
        );
        let response = builder.json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(CoreError::Completion(format!(
                "{}: {}",
                status,
                error_message(&text)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        reply_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn azure_config() -> CompletionConfig {
        CompletionConfig {
            endpoint: Some("https://res.openai.azure.com/".to_string()),
            deployment: Some("gpt41".to_string()),
            api_key: Some("key".to_string()),
            ..CompletionConfig::default()
        }
    }

    #[test]
    fn test_azure_url() {
        let client = HttpCompletionClient::new(azure_config()).unwrap();
        assert_eq!(
            client.endpoint_url().unwrap(),
            "https://res.openai.azure.com/openai/deployments/gpt41/chat/completions"
        );
    }

    #[test]
    fn test_openai_url_defaults_to_public_api() {
        let config = CompletionConfig {
            provider: Provider::OpenAI,
            ..CompletionConfig::default()
        };
        let client = HttpCompletionClient::new(config).unwrap();
        assert_eq!(
            client.endpoint_url().unwrap(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_azure_without_deployment_is_config_error() {
        let config = CompletionConfig {
            deployment: None,
            ..azure_config()
        };
        let client = HttpCompletionClient::new(config).unwrap();
        assert!(matches!(client.endpoint_url(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_reply_text() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(reply_text(response).unwrap(), "hi");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(reply_text(empty), Err(CoreError::Completion(_))));

        let null: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(reply_text(null).is_err());
    }

    #[test]
    fn test_error_message_prefers_api_error() {
        assert_eq!(
            error_message(r#"{"error":{"code":"401","message":"Access denied"}}"#),
            "Access denied"
        );
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: None,
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            max_tokens: 50,
            temperature: 0.1,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("model").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 50);
    }

    struct Recorder {
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionClient for Recorder {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request);
            Ok("Connection successful!".to_string())
        }
    }

    #[test]
    fn test_connection_uses_small_budget() {
        let recorder = Recorder {
            seen: Mutex::new(Vec::new()),
        };
        let reply = tokio_test::block_on(test_connection(&recorder)).unwrap();
        assert_eq!(reply, "Connection successful!");

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].max_tokens, 50);
        assert_eq!(seen[0].temperature, DEFAULT_TEMPERATURE);
    }
}
