//! LLM API interaction.
//!
//! This module talks to an OpenAI-compatible chat completion endpoint
//! (DeepSeek by default). Every call is made exactly once; a failure is
//! returned to the caller, which decides whether it is fatal.
//!
//! # Architecture
//!
//! - [`AskAsync`]: capability trait for one completion call, so stages can be
//!   driven by deterministic fakes in tests
//! - [`ChatClient`]: the reqwest-backed implementation
//! - [`ask_timed`]: logs elapsed time and outcome around any [`AskAsync`]

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::config::ModelSettings;
use crate::utils::truncate_for_log;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request to language model failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("language model returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("language model response could not be decoded: {0}")]
    Decode(String),
    #[error("language model returned an empty completion")]
    Empty,
}

/// One chat completion call: a system prompt and a user prompt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(settings: &ModelSettings, system_prompt: &str, user_prompt: String) -> Self {
        Self {
            model: settings.model.clone(),
            system_prompt: system_prompt.to_string(),
            user_prompt,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: settings.timeout(),
        }
    }
}

/// Trait for async LLM interaction.
///
/// Implementors send a [`CompletionRequest`] and return the text of the
/// first completion choice.
pub trait AskAsync {
    async fn ask(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion client for an OpenAI-compatible API.
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ChatClient {
    /// Create a client for `{base_url}/chat/completions`.
    pub fn new(base_url: &str, api_key: String) -> Result<Self, CompletionError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: completions_endpoint(base_url),
            api_key,
        })
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Pull the first choice's content out of a chat completion body.
fn first_choice_content(body: &str) -> Result<String, CompletionError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Decode(e.to_string()))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        Err(CompletionError::Empty)
    } else {
        Ok(content)
    }
}

impl AskAsync for ChatClient {
    #[instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn ask(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(CompletionError::Status {
                status,
                body: truncate_for_log(&text, 300),
            });
        }

        first_choice_content(&text)
    }
}

/// Run one completion and log how long it took.
///
/// No retry is attempted; the error is handed back unchanged.
#[instrument(level = "info", skip_all, fields(model = %request.model))]
pub async fn ask_timed<A: AskAsync>(
    api: &A,
    request: &CompletionRequest,
) -> Result<String, CompletionError> {
    let t0 = Instant::now();
    let res = api.ask(request).await;
    let dt = t0.elapsed();

    match &res {
        Ok(text) => info!(
            elapsed_ms = dt.as_millis() as u64,
            chars = text.chars().count(),
            "Completion succeeded"
        ),
        Err(CompletionError::Transport(e)) if e.is_timeout() => warn!(
            elapsed_ms = dt.as_millis() as u64,
            timeout_secs = request.timeout.as_secs(),
            "Completion timed out"
        ),
        Err(e) => error!(elapsed_ms = dt.as_millis() as u64, error = %e, "Completion failed"),
    }
    res
}

#[cfg(test)]
pub(crate) mod fake {
    //! Deterministic [`AskAsync`] implementation for tests.

    use super::*;
    use std::sync::Mutex;

    /// Answers each request with the first reply whose key is contained in
    /// the request's system prompt. Records every request it sees.
    #[derive(Default)]
    pub struct FakeLlm {
        replies: Vec<(String, Result<String, String>)>,
        pub seen: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeLlm {
        pub fn reply(mut self, system_contains: &str, text: &str) -> Self {
            self.replies
                .push((system_contains.to_string(), Ok(text.to_string())));
            self
        }

        pub fn fail(mut self, system_contains: &str, reason: &str) -> Self {
            self.replies
                .push((system_contains.to_string(), Err(reason.to_string())));
            self
        }

        pub fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl AskAsync for FakeLlm {
        async fn ask(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.seen.lock().unwrap().push(request.clone());
            match self
                .replies
                .iter()
                .find(|(key, _)| request.system_prompt.contains(key.as_str()))
            {
                Some((_, Ok(text))) if text.is_empty() => Err(CompletionError::Empty),
                Some((_, Ok(text))) => Ok(text.clone()),
                Some((_, Err(reason))) => Err(CompletionError::Decode(reason.clone())),
                None => Err(CompletionError::Empty),
            }
        }
    }
}
