use crate::config::CompletionConfig;
use crate::error::{Error, Result};
use crate::models::quiz_question::QuizQuestion;
use crate::services::quiz_extractor::{
    extract_from_completion, generate_fallback_questions, DEFAULT_QUESTION_COUNT,
};
use anyhow::Context as _;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Hard cap on the source text sent to the completion endpoint.
pub const MAX_PROMPT_CHARS: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub questions: Vec<QuizQuestion>,
    pub source: QuizSource,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Clone)]
pub struct CompletionService {
    client: Client,
    config: CompletionConfig,
}

impl CompletionService {
    pub fn new(config: CompletionConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// One AI-generated card for `text`, or heuristic cards when the
    /// endpoint is unconfigured or fails. Never returns an error.
    pub async fn generate_quiz(&self, text: &str) -> GenerationOutput {
        let mut rng = StdRng::from_entropy();
        self.generate_quiz_with_rng(text, &mut rng).await
    }

    pub async fn generate_quiz_with_rng<R: Rng + Send>(
        &self,
        text: &str,
        rng: &mut R,
    ) -> GenerationOutput {
        if !self.is_enabled() {
            tracing::warn!("Completion API key not set. Using fallback question generation.");
            return Self::fallback(text, rng);
        }

        match self.chat_completion(text).await {
            Ok(content) => {
                tracing::debug!(%content, "AI response");
                GenerationOutput {
                    questions: vec![extract_from_completion(&content)],
                    source: QuizSource::Ai,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Error generating quiz with completion API");
                tracing::warn!("Using fallback question generation due to API error.");
                Self::fallback(text, rng)
            }
        }
    }

    fn fallback<R: Rng>(text: &str, rng: &mut R) -> GenerationOutput {
        GenerationOutput {
            questions: generate_fallback_questions(text, DEFAULT_QUESTION_COUNT, rng),
            source: QuizSource::Fallback,
        }
    }

    /// Sends a single request and returns `choices[0].message.content`.
    /// No retries.
    pub async fn chat_completion(&self, text: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("Completion API key is not set".to_string()))?;

        let payload = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.config.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Generate a quiz based on this content: {}",
                        truncate_chars(text, MAX_PROMPT_CHARS)
                    ),
                },
            ],
        };

        let res = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .context("completion request failed")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "API request failed with status {}: {}",
                status.as_u16(),
                body
            )
            .into());
        }

        let body: JsonValue = res.json().await.context("completion response is not JSON")?;
        parse_completion_content(&body)
    }
}

/// Pulls the first choice's message content; any other shape is an error.
pub fn parse_completion_content(body: &JsonValue) -> Result<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid completion response format").into())
}

/// First `max` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
