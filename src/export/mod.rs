//! Export pipeline: one logical layout, several output formats.
//!
//! - `docx`: Word document (paper, answer key, scripts, matrix)
//! - `html`: printable page, also the PDF source
//! - `pdf`: headless Chromium print of the HTML page
//! - `json`: the test structure itself, pretty-printed

pub mod docx;
pub mod html;
pub mod layout;
pub mod pdf;

/// Plain JSON download of the test structure.
pub mod json {
  use tracing::debug;

  use crate::domain::GeneratedTest;
  use crate::error::ExportError;

  pub const FILE_NAME: &str = "generated-test.json";
  pub const CONTENT_TYPE: &str = "application/json";

  pub fn render(test: &GeneratedTest) -> Result<Vec<u8>, ExportError> {
    let bytes = serde_json::to_vec_pretty(test)?;
    debug!(target: "export", bytes = bytes.len(), "JSON export serialized");
    Ok(bytes)
  }

  #[cfg(test)]
  mod tests {
    use super::*;
    use crate::domain::fixtures::sample_test;

    #[test]
    fn reparses_to_the_same_test() {
      let test = sample_test();
      let bytes = render(&test).unwrap();
      let back: GeneratedTest = serde_json::from_slice(&bytes).unwrap();
      assert_eq!(back, test);
      assert!(std::str::from_utf8(&bytes).unwrap().contains("\n  \"testTitle\""));
    }
  }
}
