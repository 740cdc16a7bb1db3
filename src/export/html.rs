//! Printable HTML page. Used as the preview response and as the PDF source.

use maud::{html, Markup, DOCTYPE};

use super::layout::{build_document, Block};
use crate::domain::GeneratedTest;

pub const CONTENT_TYPE: &str = "text/html; charset=utf-8";

const STYLE: &str = r#"
body { margin: 0; background: #fff; color: #000; font-family: "Times New Roman", serif; font-size: 12pt; }
.sheet { width: 800px; margin: 0 auto; padding: 40px; box-sizing: border-box; }
h1 { font-size: 14pt; margin: 10px 0 5px; }
h2 { font-size: 12pt; margin: 10px 0 5px; }
p { margin: 0 0 5px; white-space: pre-wrap; }
.label { font-weight: bold; }
.italic { font-style: italic; }
.question { break-inside: avoid; page-break-inside: avoid; margin: 5px 0 10px; }
.page-break { break-after: page; page-break-after: always; height: 0; }
"#;

fn block(b: &Block) -> Markup {
  html! {
    @match b {
      Block::Title(t) => { h1 { (t) } },
      Block::Heading(t) => { h2 { (t) } },
      Block::Label(t) => { p.label { (t) } },
      Block::Text(t) => { p { (t) } },
      Block::Italic(t) => { p.italic { (t) } },
      Block::Question { id, prompt, answer_line } => {
        div.question {
          p { strong { "Question " (id) ": " } (prompt) }
          p { (answer_line) }
        }
      },
      Block::PageBreak => { div."page-break" {} },
    }
  }
}

pub fn page(test: &GeneratedTest) -> Markup {
  let blocks = build_document(test);
  html! {
    (DOCTYPE)
    html lang="en" {
      head {
        meta charset="utf-8";
        title { (test.test_title) }
        style { (maud::PreEscaped(STYLE)) }
      }
      body {
        div.sheet {
          @for b in &blocks {
            (block(b))
          }
        }
      }
    }
  }
}

pub fn render(test: &GeneratedTest) -> String {
  page(test).into_string()
}
