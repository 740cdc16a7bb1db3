//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs sizes and outcomes, never payload contents.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::header,
  response::{Html, IntoResponse, Response},
  Json,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::domain::{GeneratedTest, SavedTestRecord, TestConfiguration};
use crate::error::ApiError;
use crate::export;
use crate::protocol::*;
use crate::schema;
use crate::state::AppState;

/// Decode a client-supplied test with the configured policy.
fn accept_test(state: &AppState, value: Value) -> Result<GeneratedTest, ApiError> {
  Ok(schema::validate(value, state.policy)?.test)
}

fn attachment(body: Vec<u8>, content_type: &'static str, file_name: &'static str) -> Response {
  (
    [
      (header::CONTENT_TYPE, content_type.to_string()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
    ],
    body,
  )
    .into_response()
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, generation_enabled: state.generator.is_some() })
}

#[instrument(level = "info", skip(state, body), fields(material_len = body.material.len()))]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<GenerateOut>, ApiError> {
  let generator = state.generator.as_ref().ok_or(ApiError::GenerationDisabled)?;
  if body.material.trim().is_empty() {
    return Err(ApiError::BadRequest("material must not be empty".into()));
  }
  let generated = generator.generate(&body.material, &body.config).await?;
  info!(
    target: "generation",
    questions = generated.validated.test.question_count(),
    warnings = generated.validated.warnings.len(),
    truncated = generated.truncated,
    "HTTP generate served"
  );
  Ok(Json(GenerateOut {
    test: generated.validated.test,
    warnings: generated.validated.warnings,
    truncated: generated.truncated,
  }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_validate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<Value>,
) -> Result<Json<ValidateOut>, ApiError> {
  let validated = schema::validate(body, state.policy)?;
  Ok(Json(ValidateOut { test: validated.test, warnings: validated.warnings }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_saved(
  State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SavedTestRecord>>, ApiError> {
  Ok(Json(state.store.list().await?))
}

#[instrument(level = "info", skip(state, body), fields(name_len = body.name.len()))]
pub async fn http_post_saved(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SaveIn>,
) -> Result<Json<SavedTestRecord>, ApiError> {
  let test = accept_test(&state, body.test)?;
  let config = body.config.unwrap_or_else(TestConfiguration::unknown);
  let record = state.store.save(&body.name, test, config).await?;
  Ok(Json(record))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_saved(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SavedTestRecord>, ApiError> {
  state
    .store
    .get(&id)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("no saved test with id {id}")))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_saved(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<SavedTestRecord>>, ApiError> {
  Ok(Json(state.store.delete(&id).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_export_docx(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExportIn>,
) -> Result<Response, ApiError> {
  let test = accept_test(&state, body.test)?;
  let bytes = export::docx::render(&test)?;
  info!(target: "export", format = "docx", bytes = bytes.len(), "HTTP export served");
  Ok(attachment(bytes, export::docx::CONTENT_TYPE, export::docx::FILE_NAME))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_export_pdf(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExportIn>,
) -> Result<Response, ApiError> {
  let test = accept_test(&state, body.test)?;
  let bytes = state.pdf.render(&test).await?;
  info!(target: "export", format = "pdf", bytes = bytes.len(), "HTTP export served");
  Ok(attachment(bytes, export::pdf::CONTENT_TYPE, export::pdf::FILE_NAME))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_export_json(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExportIn>,
) -> Result<Response, ApiError> {
  let test = accept_test(&state, body.test)?;
  let bytes = export::json::render(&test)?;
  Ok(attachment(bytes, export::json::CONTENT_TYPE, export::json::FILE_NAME))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_export_html(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExportIn>,
) -> Result<Html<String>, ApiError> {
  let test = accept_test(&state, body.test)?;
  Ok(Html(export::html::render(&test)))
}
