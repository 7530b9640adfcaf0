use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use super::error::LlmError;
use super::types::{ChatRequest, ChatResponse};

/// The seam between the engine and the concrete LLM provider.
///
/// The engine only ever needs "given role-tagged messages, return generated
/// text", so tests substitute a mock sender and never touch the network.
pub trait ChatSender {
    fn send_chat(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send;
}

/// HTTP client for an OpenAI-compatible chat completion endpoint.
pub struct ChatClient {
    api_key: String,
    client: Client,
    endpoint: String,
}

impl ChatClient {
    /// Create a client for the given completion endpoint URL.
    ///
    /// The URL is the full path including any deployment segment and
    /// api-version query, so Azure and Gemini endpoints both work unchanged.
    pub fn new(api_key: String, endpoint: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            client,
            endpoint,
        }
    }
}

impl ChatSender for ChatClient {
    async fn send_chat(&self, req: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(req)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(LlmError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<ChatResponse>().await?;
        Ok(body)
    }
}
