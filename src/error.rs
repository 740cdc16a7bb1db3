//! Error types for each component plus the HTTP-facing `ApiError`.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

/// Message shown to the user for any generation failure; details stay in the logs.
pub const GENERATION_FAILED_MESSAGE: &str =
  "Failed to generate test. Please try again or reduce input size.";

/// A JSON value that does not satisfy the generated-test contract.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
  #[error("expected a JSON object at the root, found {0}")]
  NotAnObject(&'static str),

  #[error("schema mismatch at `{path}`: {message}")]
  Shape { path: String, message: String },

  #[error("matrixReport.totalQuestions is missing")]
  MissingTotal,

  #[error("matrixReport.totalQuestions is {reported} but the test contains {counted} questions")]
  TotalMismatch { reported: u32, counted: u32 },

  #[error("question {id}: correct answer {answer:?} is not one of its options")]
  AnswerNotInOptions { id: u32, answer: String },
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
  #[error("generation backend returned an empty reply")]
  EmptyReply,

  #[error("generation reply is not valid JSON: {0}")]
  MalformedJson(#[source] serde_json::Error),

  #[error("generation reply does not match the test schema: {0}")]
  Schema(#[from] SchemaError),

  #[error("generation request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("generation backend HTTP {status}: {message}")]
  Backend { status: u16, message: String },

  #[error("generation timed out after {0}s")]
  Timeout(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("record name must not be empty")]
  EmptyName,

  #[error("storage IO error on {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to serialize saved tests: {0}")]
  Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
  #[error("DOCX packing failed: {0}")]
  Docx(String),

  #[error("browser error: {0}")]
  Browser(String),

  #[error("JSON export failed: {0}")]
  Json(#[from] serde_json::Error),
}

impl ExportError {
  /// Short user-facing message per export format.
  fn user_message(&self) -> &'static str {
    match self {
      ExportError::Docx(_) => "Error creating DOCX",
      ExportError::Browser(_) => "Error creating PDF",
      ExportError::Json(_) => "Error creating JSON",
    }
  }
}

impl From<chromiumoxide::error::CdpError> for ExportError {
  fn from(err: chromiumoxide::error::CdpError) -> Self {
    ExportError::Browser(err.to_string())
  }
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("generation backend is not configured (set OPENAI_API_KEY)")]
  GenerationDisabled,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Schema(#[from] SchemaError),

  #[error(transparent)]
  Generation(#[from] GenerationError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Export(#[from] ExportError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::GenerationDisabled => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
      ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
      ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
      ApiError::Schema(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
      ApiError::Generation(e) => {
        error!(target: "generation", error = %e, "Test generation failed");
        let status = match e {
          GenerationError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
          _ => StatusCode::BAD_GATEWAY,
        };
        (status, GENERATION_FAILED_MESSAGE.to_string())
      }
      ApiError::Store(StoreError::EmptyName) => (StatusCode::BAD_REQUEST, StoreError::EmptyName.to_string()),
      ApiError::Store(e) => {
        error!(target: "store", error = %e, "Store operation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to access saved tests".to_string())
      }
      ApiError::Export(e) => {
        error!(target: "export", error = %e, "Export failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.user_message().to_string())
      }
    };

    (status, Json(json!({ "error": message }))).into_response()
  }
}
