//! Minimal OpenAI client for our use-cases.
//!
//! We call chat.completions for clue generation and /embeddings for the
//! retrieval pipeline. Calls are instrumented and log model names, latencies,
//! and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{instrument, info};

use crate::config::Prompts;
use crate::error::{GameError, GameResult};
use crate::util::fill_template;

/// Sampling temperature for clue generation: moderate randomness so repeated
/// rounds over the same document phrase clues differently.
const CLUE_TEMPERATURE: f32 = 0.7;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
  pub embed_model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());
    let embed_model =
      std::env::var("OPENAI_EMBED_MODEL").unwrap_or_else(|_| "text-embedding-3-small".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model, embed_model })
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_plain(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "wordl-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.get(0)
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    Ok(text)
  }

  /// Embed one non-empty text. The model's vector dimension is fixed per
  /// configured model (1536 for text-embedding-3-small).
  #[instrument(level = "info", skip(self, text), fields(model = %self.embed_model, text_len = text.len()))]
  pub async fn embed(&self, text: &str) -> GameResult<Vec<f32>> {
    let text = text.trim();
    if text.is_empty() {
      return Err(GameError::IndexUnavailable("cannot embed empty text".into()));
    }

    let url = format!("{}/embeddings", self.base_url);
    let req = EmbeddingRequest { model: self.embed_model.clone(), input: text.to_string() };

    let res = self.client.post(&url)
      .header(USER_AGENT, "wordl-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| GameError::IndexUnavailable(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| body);
      return Err(GameError::IndexUnavailable(format!("OpenAI HTTP {}: {}", status, msg)));
    }

    let body: EmbeddingResponse = res.json().await
      .map_err(|e| GameError::IndexUnavailable(e.to_string()))?;
    body.data.into_iter().next()
      .map(|d| d.embedding)
      .ok_or_else(|| GameError::IndexUnavailable("embedding response contained no vectors".into()))
  }

  /// Generate a 1–2 sentence clue for `word`, grounded in `context_chunks`.
  ///
  /// Grounding is a prompt-level instruction only: the context is embedded
  /// verbatim and the model is told to use nothing else, but we do not verify
  /// the returned clue post-hoc. An empty context still issues the request;
  /// clue quality degrades rather than the round failing.
  #[instrument(level = "info", skip(self, prompts, context_chunks), fields(model = %self.strong_model, context_chunks = context_chunks.len()))]
  pub async fn generate_clue(
    &self,
    prompts: &Prompts,
    word: &str,
    context_chunks: &[String],
  ) -> GameResult<String> {
    let context = context_chunks.join("\n");
    let user = fill_template(
      &prompts.clue_user_template,
      &[("context", context.as_str()), ("word", word)],
    );

    let start = std::time::Instant::now();
    let result = self
      .chat_plain(&self.strong_model, &prompts.clue_system, &user, CLUE_TEMPERATURE)
      .await;
    let elapsed = start.elapsed();

    match result {
      Ok(text) => {
        info!(target: "game", ?elapsed, clue_len = text.len(), "Clue generated");
        Ok(text)
      }
      Err(e) => Err(GameError::Generation(format!("clue generation failed after {elapsed:?}: {e}"))),
    }
  }
}

// --- DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

#[derive(Serialize)]
struct EmbeddingRequest {
  model: String,
  input: String,
}
#[derive(Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingDatum>,
}
#[derive(Deserialize)]
struct EmbeddingDatum {
  embedding: Vec<f32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
