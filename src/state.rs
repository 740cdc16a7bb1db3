//! Application state: generation backend, validation policy, record store and PDF renderer.
//!
//! The generation backend is optional; without OPENAI_API_KEY the generate
//! endpoint answers 503 while storage and export keep working.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{load_agent_config_from_env, ServerSettings};
use crate::export::pdf::PdfRenderer;
use crate::generation::TestGenerator;
use crate::openai::OpenAI;
use crate::schema::ValidationPolicy;
use crate::store::{FileSlot, TestStore};

#[derive(Clone)]
pub struct AppState {
  pub generator: Option<Arc<dyn TestGenerator>>,
  pub policy: ValidationPolicy,
  pub store: TestStore,
  pub pdf: PdfRenderer,
}

impl AppState {
  /// Build state from env: load config, open the store file, init OpenAI.
  #[instrument(level = "info", skip_all)]
  pub fn from_env(settings: &ServerSettings) -> Self {
    let cfg = load_agent_config_from_env().unwrap_or_default();
    let policy = cfg.generation.policy;

    let generator: Option<Arc<dyn TestGenerator>> =
      match OpenAI::from_env(cfg.prompts, cfg.generation.clone()) {
        Some(oa) => {
          info!(target: "edtest_backend", base_url = %oa.base_url, model = %oa.model, timeout_secs = cfg.generation.timeout_secs, "OpenAI enabled.");
          Some(Arc::new(oa))
        }
        None => {
          warn!(target: "edtest_backend", key_present = std::env::var_os("OPENAI_API_KEY").is_some(), "OpenAI disabled. Test generation is unavailable.");
          None
        }
      };

    info!(target: "store", path = %settings.store_path.display(), "Saved tests file");
    Self {
      generator,
      policy,
      store: TestStore::new(FileSlot::new(&settings.store_path)),
      pdf: PdfRenderer::new(settings.chrome_executable.clone()),
    }
  }
}
