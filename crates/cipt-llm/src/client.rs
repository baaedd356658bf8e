//! Chat completion client.
//!
//! `RemoteChatModel` talks to an OpenAI-compatible `/chat/completions`
//! endpoint; `MockChatModel` replays scripted replies for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use cipt_core::error::CiptError;
use cipt_core::types::ChatMessage;

/// Service that turns a message list into one assistant reply.
pub trait ChatModel: Send + Sync {
    /// Run a chat completion and return the assistant's reply text.
    fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> impl std::future::Future<Output = Result<String, CiptError>> + Send;
}

/// Object-safe version of [`ChatModel`] for dynamic dispatch.
pub trait DynChatModel: Send + Sync {
    fn complete_boxed<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<String, CiptError>> + Send + 'a>>;
}

impl<T: ChatModel> DynChatModel for T {
    fn complete_boxed<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<String, CiptError>> + Send + 'a>>
    {
        Box::pin(self.complete(messages, temperature, max_tokens))
    }
}

// ---------------------------------------------------------------------------
// RemoteChatModel - OpenAI-compatible HTTP backend
// ---------------------------------------------------------------------------

/// HTTP client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct RemoteChatModel {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl RemoteChatModel {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

impl ChatModel for RemoteChatModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, CiptError> {
        let url = format!("{}/chat/completions", self.api_base);
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CiptError::Completion(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CiptError::Completion(format!(
                "Chat API error {}: {}",
                status, body
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CiptError::Completion(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| CiptError::Completion("Empty completion response".to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockChatModel - scripted replies for tests
// ---------------------------------------------------------------------------

/// Test double that pops scripted replies in order and records every request.
#[derive(Default)]
pub struct MockChatModel {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatModel {
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Message lists of every completion requested so far.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

impl ChatModel for MockChatModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, CiptError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CiptError::Completion("No scripted reply left".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_pops_replies_in_order() {
        let model = MockChatModel::with_replies(["primeira", "segunda"]);
        let messages = [ChatMessage::user("oi")];
        assert_eq!(model.complete(&messages, 0.0, 10).await.unwrap(), "primeira");
        assert_eq!(model.complete(&messages, 0.0, 10).await.unwrap(), "segunda");
        assert!(model.complete(&messages, 0.0, 10).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let model = MockChatModel::with_replies(["ok"]);
        let messages = [ChatMessage::system("persona"), ChatMessage::user("oi")];
        model.complete(&messages, 0.2, 700).await.unwrap();
        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[0][1].content, "oi");
    }

    #[tokio::test]
    async fn test_dyn_dispatch() {
        let boxed: Box<dyn DynChatModel> = Box::new(MockChatModel::with_replies(["resposta"]));
        let messages = [ChatMessage::user("pergunta")];
        let reply = boxed.complete_boxed(&messages, 0.0, 5).await.unwrap();
        assert_eq!(reply, "resposta");
    }

    #[test]
    fn test_remote_model_trims_base_url() {
        let model = RemoteChatModel::new("https://api.example.com/v1/", "k", "gpt-4o-mini");
        assert_eq!(model.api_base, "https://api.example.com/v1");
    }

    #[test]
    fn test_completion_request_serializes_roles_lowercase() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let request = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.2,
            max_tokens: 700,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 700);
    }
}
