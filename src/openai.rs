//! Minimal OpenAI-compatible client used as the test generation backend.
//!
//! We only call chat.completions and request a strict JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key or the uploaded material.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::{GenerationSettings, Prompts};
use crate::domain::TestConfiguration;
use crate::error::GenerationError;
use crate::generation::{build_request, parse_reply, Generated, TestGenerator};
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub prompts: Prompts,
  pub settings: GenerationSettings,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  /// A client that cannot be built is logged and also yields None.
  pub fn from_env(prompts: Prompts, settings: GenerationSettings) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = match reqwest::Client::builder()
      .timeout(Duration::from_secs(settings.timeout_secs))
      .build()
    {
      Ok(c) => c,
      Err(e) => {
        error!(target: "edtest_backend", error = %e, "Failed to build HTTP client; OpenAI disabled");
        return None;
      }
    };

    Some(Self { client, api_key, base_url, model, prompts, settings })
  }

  /// JSON-object chat completion. Returns the raw message text; parsing is the caller's job.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model, user_len = user.len()))]
  async fn chat_json_raw(&self, system: &str, user: &str) -> Result<String, GenerationError> {
    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature: self.settings.temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "edtest-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return Err(GenerationError::Backend { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    Ok(body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default())
  }
}

#[async_trait]
impl TestGenerator for OpenAI {
  #[instrument(level = "info", skip(self, material, config), fields(material_len = material.len(), model = %self.model))]
  async fn generate(
    &self,
    material: &str,
    config: &TestConfiguration,
  ) -> Result<Generated, GenerationError> {
    let request = build_request(&self.prompts, &self.settings, material, config);
    let limit = Duration::from_secs(self.settings.timeout_secs);
    let start = Instant::now();

    let raw = match tokio::time::timeout(limit, self.chat_json_raw(&request.system, &request.user)).await {
      Ok(Ok(text)) => text,
      Ok(Err(GenerationError::Transport(e))) if e.is_timeout() => {
        error!(target: "generation", elapsed = ?start.elapsed(), "Transport timeout during test generation");
        return Err(GenerationError::Timeout(self.settings.timeout_secs));
      }
      Ok(Err(e)) => {
        error!(target: "generation", elapsed = ?start.elapsed(), error = %e, "Model call failed during test generation");
        return Err(e);
      }
      Err(_) => {
        error!(target: "generation", elapsed = ?start.elapsed(), "Model call exceeded the generation timeout");
        return Err(GenerationError::Timeout(self.settings.timeout_secs));
      }
    };
    info!(target: "generation", elapsed = ?start.elapsed(), reply_bytes = raw.len(), "Model response received");

    let validated = parse_reply(&raw, self.settings.policy).map_err(|e| {
      error!(target: "generation", error = %e, reply_preview = %trunc_for_log(&raw, 200), "Reply rejected");
      e
    })?;

    info!(
      target: "generation",
      title = %validated.test.test_title,
      questions = validated.test.question_count(),
      warnings = validated.warnings.len(),
      "Test successfully generated"
    );
    Ok(Generated { validated, truncated: request.truncated })
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

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
