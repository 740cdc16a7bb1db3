//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Bodies that carry a test take it as raw JSON so it goes through the same
//! validator as generated output before anything is saved or exported.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{GeneratedTest, TestConfiguration};
use crate::schema::ValidationWarning;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
  pub ok: bool,
  pub generation_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
  pub material: String,
  #[serde(default)]
  pub config: TestConfiguration,
}

#[derive(Debug, Serialize)]
pub struct GenerateOut {
  pub test: GeneratedTest,
  pub warnings: Vec<ValidationWarning>,
  pub truncated: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidateOut {
  pub test: GeneratedTest,
  pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Deserialize)]
pub struct SaveIn {
  pub name: String,
  pub test: Value,
  #[serde(default)]
  pub config: Option<TestConfiguration>,
}

#[derive(Debug, Deserialize)]
pub struct ExportIn {
  pub test: Value,
}
