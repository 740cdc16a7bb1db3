//! PDF export through headless Chromium: load the HTML page and print it to A4.
//!
//! One short-lived browser per render; it is closed whether printing succeeds or not.

use std::path::PathBuf;
use std::time::Instant;

use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use super::html;
use crate::domain::GeneratedTest;
use crate::error::ExportError;

pub const FILE_NAME: &str = "generated_test_full.pdf";
pub const CONTENT_TYPE: &str = "application/pdf";

// A4 in inches.
const A4_WIDTH: f64 = 8.27;
const A4_HEIGHT: f64 = 11.69;

#[derive(Clone, Debug, Default)]
pub struct PdfRenderer {
  chrome_executable: Option<PathBuf>,
}

impl PdfRenderer {
  pub fn new(chrome_executable: Option<PathBuf>) -> Self {
    Self { chrome_executable }
  }

  fn browser_config(&self) -> Result<BrowserConfig, ExportError> {
    let mut builder = BrowserConfig::builder()
      .new_headless_mode()
      .window_size(800, 1200)
      .args(vec!["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"]);
    if let Some(path) = &self.chrome_executable {
      builder = builder.chrome_executable(path);
    }
    builder.build().map_err(ExportError::Browser)
  }

  #[instrument(level = "info", skip_all, fields(title = %test.test_title))]
  pub async fn render(&self, test: &GeneratedTest) -> Result<Vec<u8>, ExportError> {
    let start = Instant::now();
    let page_html = html::render(test);

    let (mut browser, mut handler) = Browser::launch(self.browser_config()?).await?;
    let events = tokio::spawn(async move {
      while let Some(h) = handler.next().await {
        if h.is_err() {
          break;
        }
      }
    });
    debug!(target: "export", "Headless browser launched");

    let printed = print(&browser, &page_html).await;

    if let Err(e) = browser.close().await {
      warn!(target: "export", error = %e, "Browser did not close cleanly");
    }
    let _ = browser.wait().await;
    events.abort();

    let bytes = printed?;
    info!(target: "export", bytes = bytes.len(), elapsed = ?start.elapsed(), "PDF printed");
    Ok(bytes)
  }
}

async fn print(browser: &Browser, page_html: &str) -> Result<Vec<u8>, ExportError> {
  let page = browser.new_page("about:blank").await?;
  page.set_content(page_html).await?;
  let params = PrintToPdfParams {
    scale: Some(0.8),
    paper_width: Some(A4_WIDTH),
    paper_height: Some(A4_HEIGHT),
    print_background: Some(true),
    ..Default::default()
  };
  Ok(page.pdf(params).await?)
}
