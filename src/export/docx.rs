//! Word export. Sizes are in half-points (24 = 12pt).

use std::io::Cursor;

use docx_rs::{BreakType, Docx, LineSpacing, Paragraph, Run};
use tracing::{debug, instrument};

use super::layout::{build_document, Block};
use crate::domain::GeneratedTest;
use crate::error::ExportError;

pub const FILE_NAME: &str = "generated_test_full.docx";
pub const CONTENT_TYPE: &str =
  "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const BODY: usize = 24;

fn heading(text: &str, size: usize, style: &str) -> Paragraph {
  Paragraph::new()
    .style(style)
    .line_spacing(LineSpacing::new().before(200).after(100))
    .add_run(Run::new().add_text(text).bold().size(size))
}

fn text(run: Run, after: u32) -> Paragraph {
  Paragraph::new()
    .line_spacing(LineSpacing::new().after(after))
    .add_run(run.size(BODY))
}

fn paragraphs(block: &Block) -> Vec<Paragraph> {
  match block {
    Block::Title(t) => vec![heading(t, 28, "Heading1")],
    Block::Heading(t) => vec![heading(t, BODY, "Heading2")],
    Block::Label(t) => vec![text(Run::new().add_text(t).bold(), 100)],
    Block::Text(t) => vec![text(Run::new().add_text(t), 100)],
    Block::Italic(t) => vec![text(Run::new().add_text(t).italic(), 100)],
    Block::Question { id, prompt, answer_line } => vec![
      Paragraph::new()
        .line_spacing(LineSpacing::new().before(100).after(100))
        .add_run(Run::new().add_text(format!("Question {id}: ")).bold().size(BODY))
        .add_run(Run::new().add_text(prompt).size(BODY)),
      text(Run::new().add_text(answer_line), 200),
    ],
    Block::PageBreak => vec![Paragraph::new().add_run(Run::new().add_break(BreakType::Page))],
  }
}

/// Render the full document (paper, key, scripts, matrix) as a .docx archive.
#[instrument(level = "debug", skip_all, fields(title = %test.test_title))]
pub fn render(test: &GeneratedTest) -> Result<Vec<u8>, ExportError> {
  let blocks = build_document(test);
  let doc = blocks
    .iter()
    .flat_map(paragraphs)
    .fold(Docx::new(), |doc, p| doc.add_paragraph(p));

  let mut buf = Cursor::new(Vec::new());
  doc.build().pack(&mut buf).map_err(|e| ExportError::Docx(e.to_string()))?;
  let bytes = buf.into_inner();
  debug!(target: "export", blocks = blocks.len(), bytes = bytes.len(), "DOCX packed");
  Ok(bytes)
}
