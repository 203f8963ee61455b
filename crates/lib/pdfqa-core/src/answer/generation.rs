//! Language-model backed answering.
//!
//! [`GenerationStrategy`] hands the whole document text to a
//! [`GenerationClient`]. [`ChatCompletionsClient`] is the HTTP client for
//! OpenAI-compatible `/chat/completions` endpoints.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::heuristic::EMPTY_CONTEXT_ANSWER;
use super::{AnswerError, AnswerFuture, AnswerRequest, AnsweringStrategy};

pub type GenerationFuture<'a> = AnswerFuture<'a>;

const SYSTEM_INSTRUCTION: &str = "Answer questions based on the provided context.";
const CHAT_COMPLETIONS_BACKEND: &str = "chat_completions";

/// Prompt sent to a generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    pub system: String,
    pub user: String,
}

impl GenerationPrompt {
    #[must_use]
    pub fn for_context(question: &str, context: &str) -> Self {
        Self {
            system: SYSTEM_INSTRUCTION.to_string(),
            user: format!("Context: {context}\n\nQuestion: {question}"),
        }
    }
}

/// Completes a prompt with a text generation backend.
pub trait GenerationClient: Send + Sync {
    fn complete(&self, prompt: GenerationPrompt) -> GenerationFuture<'_>;
}

/// Strategy that asks a generation backend using the full document text.
#[derive(Clone)]
pub struct GenerationStrategy {
    client: Arc<dyn GenerationClient>,
}

impl GenerationStrategy {
    #[must_use]
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self { client }
    }
}

impl AnsweringStrategy for GenerationStrategy {
    fn name(&self) -> &'static str {
        "generation"
    }

    fn answer<'a>(&'a self, request: AnswerRequest<'a>) -> AnswerFuture<'a> {
        if request.context.trim().is_empty() {
            return Box::pin(std::future::ready(Ok(EMPTY_CONTEXT_ANSWER.to_string())));
        }
        let prompt = GenerationPrompt::for_context(request.question, request.context);
        self.client.complete(prompt)
    }
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatCompletionsClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn send(&self, prompt: GenerationPrompt) -> Result<String, AnswerError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| unavailable(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("endpoint returned {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| unavailable(format!("malformed response: {err}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| unavailable("response contained no answer"))?;

        debug!(model = %self.model, chars = content.len(), "chat completion received");
        Ok(content)
    }
}

impl GenerationClient for ChatCompletionsClient {
    fn complete(&self, prompt: GenerationPrompt) -> GenerationFuture<'_> {
        Box::pin(self.send(prompt))
    }
}

fn unavailable(reason: impl Into<String>) -> AnswerError {
    AnswerError::backend_unavailable(CHAT_COMPLETIONS_BACKEND, reason)
}

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
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Default)]
    struct RecordingClient {
        prompts: Mutex<Vec<GenerationPrompt>>,
    }

    impl GenerationClient for RecordingClient {
        fn complete(&self, prompt: GenerationPrompt) -> GenerationFuture<'_> {
            self.prompts.lock().expect("prompt log").push(prompt);
            Box::pin(async { Ok("generated".to_string()) })
        }
    }

    /// Serves exactly one canned HTTP response and returns the base url.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0_u8; 64 * 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/v1/")
    }

    #[test]
    fn prompt_embeds_context_then_question() {
        let prompt = GenerationPrompt::for_context("Why?", "Because.");
        assert_eq!(prompt.system, SYSTEM_INSTRUCTION);
        assert_eq!(prompt.user, "Context: Because.\n\nQuestion: Why?");
    }

    #[tokio::test]
    async fn strategy_sends_full_context() {
        let client = Arc::new(RecordingClient::default());
        let strategy = GenerationStrategy::new(client.clone());
        let request = AnswerRequest {
            question: "What grew?",
            context: "Revenue grew.",
            document_id: "doc",
        };

        let answer = strategy.answer(request).await.expect("answer");

        assert_eq!(answer, "generated");
        let prompts = client.prompts.lock().expect("prompt log");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.contains("Revenue grew."));
    }

    #[tokio::test]
    async fn strategy_skips_backend_for_blank_context() {
        let client = Arc::new(RecordingClient::default());
        let strategy = GenerationStrategy::new(client.clone());
        let request = AnswerRequest {
            question: "What grew?",
            context: "   ",
            document_id: "doc",
        };

        let answer = strategy.answer(request).await.expect("answer");

        assert_eq!(answer, EMPTY_CONTEXT_ANSWER);
        assert!(client.prompts.lock().expect("prompt log").is_empty());
    }

    #[tokio::test]
    async fn chat_client_reads_first_choice() {
        let base_url = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"  Paris.  "}}]}"#,
        )
        .await;
        let client = ChatCompletionsClient::new("key", "test-model").with_base_url(&base_url);

        let answer = client
            .complete(GenerationPrompt::for_context("Capital?", "Paris is the capital."))
            .await
            .expect("completion should succeed");

        assert_eq!(answer, "Paris.");
    }

    #[tokio::test]
    async fn chat_client_maps_error_status_to_unavailable() {
        let base_url = serve_once("HTTP/1.1 503 Service Unavailable", "{}").await;
        let client = ChatCompletionsClient::new("key", "test-model").with_base_url(&base_url);

        let err = client
            .complete(GenerationPrompt::for_context("Capital?", "Paris."))
            .await
            .expect_err("error status should fail");

        assert!(matches!(err, AnswerError::BackendUnavailable { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn chat_client_rejects_empty_choices() {
        let base_url = serve_once("HTTP/1.1 200 OK", r#"{"choices":[]}"#).await;
        let client = ChatCompletionsClient::new("key", "test-model").with_base_url(&base_url);

        let err = client
            .complete(GenerationPrompt::for_context("Capital?", "Paris."))
            .await
            .expect_err("empty choices should fail");

        assert!(err.to_string().contains("no answer"));
    }
}
