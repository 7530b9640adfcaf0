//! Wire types for OpenAI-compatible chat completion endpoints.
//!
//! Both hosted providers the daemon supports (Azure-hosted GPT-4o and
//! Gemini's OpenAI-compatible surface) speak this request/response shape,
//! so a single set of structs covers the swappable backend.

use serde::{Deserialize, Serialize};

/// Request body for a chat completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model or deployment identifier (e.g. "gpt-4o").
    pub model: String,
    /// Ordered conversation: system instruction first, then the user turn.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature. The engine pins this low to favor
    /// deterministic, well-formed JSON output.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    pub top_p: f32,
}

/// A single role-tagged message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Response body returned by the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    /// Token accounting; some gateways omit it.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// The generated text of the first choice, trimmed.
    /// Empty string if the provider returned no choices.
    pub fn first_text(&self) -> String {
        self.choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default()
    }
}

/// One completion candidate. The daemon always requests a single choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub role: String,
    pub content: String,
}

/// Token usage statistics for a completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_roundtrip() {
        let req = ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![
                ChatMessage::system("Respond only with valid JSON."),
                ChatMessage::user("Classify this incident"),
            ],
            temperature: 0.2,
            max_tokens: 400,
            top_p: 1.0,
        };
        let json = serde_json::to_string(&req).unwrap();
        let parsed: ChatRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model, "gpt-4o");
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[0].role, "system");
        assert_eq!(parsed.messages[1].role, "user");
        assert_eq!(parsed.max_tokens, 400);
    }

    #[test]
    fn chat_response_deserialize_from_api_format() {
        let api_json = r#"{
            "choices": [{
                "message": {"role": "assistant", "content": "{\"category\": \"Network\"}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160}
        }"#;
        let resp: ChatResponse = serde_json::from_str(api_json).unwrap();
        assert_eq!(resp.first_text(), "{\"category\": \"Network\"}");
        assert_eq!(resp.usage.unwrap().total_tokens, 160);
    }

    #[test]
    fn chat_response_without_usage() {
        let json = r#"{"choices": [{"message": {"content": "hello"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_text(), "hello");
        assert!(resp.usage.is_none());
    }

    #[test]
    fn first_text_empty_choices() {
        let resp = ChatResponse {
            choices: vec![],
            usage: None,
        };
        assert_eq!(resp.first_text(), "");
    }

    #[test]
    fn first_text_trims_whitespace() {
        let json = r#"{"choices": [{"message": {"content": "  {\"a\":1}\n "}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_text(), "{\"a\":1}");
    }
}
