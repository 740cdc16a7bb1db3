//! EdTest · English test generator backend
//!
//! - Axum HTTP API: generate, validate, saved tests, DOCX/PDF/JSON/HTML export
//! - Optional OpenAI-compatible generation backend (via environment variables)
//! - Static SPA fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   OPENAI_API_KEY     : enables test generation if present
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_MODEL       : default "gpt-4o"
//!   AGENT_CONFIG_PATH  : path to TOML config (prompts + generation settings)
//!   STORE_PATH         : saved tests file (default "data/saved_tests.json")
//!   STATIC_DIR         : front-end files (default "./static")
//!   CHROME_EXECUTABLE  : browser used for PDF export (auto-detected if unset)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod config;
mod domain;
mod error;
mod export;
mod generation;
mod openai;
mod protocol;
mod routes;
mod schema;
mod state;
mod store;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerSettings;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = ServerSettings::from_env();
  let state = Arc::new(AppState::from_env(&settings));
  let app = build_router(state, &settings.static_dir);

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "edtest_backend", %addr, static_dir = %settings.static_dir.display(), "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "edtest_backend", "Server stopped");
  Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      warn!(target: "edtest_backend", error = %e, "Ctrl-C handler unavailable");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        warn!(target: "edtest_backend", error = %e, "SIGTERM handler unavailable");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!(target: "edtest_backend", "Shutdown signal received");
}
