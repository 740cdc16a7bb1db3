//! Logical document shared by the page-oriented exports (DOCX, HTML/PDF).
//!
//! Order: test paper (parts A-D), answer key, listening scripts, matrix report,
//! each starting on a new page.

use crate::domain::{GeneratedTest, Question};

/// Blank line printed under open-ended questions.
pub const ANSWER_BLANK: &str = "   __________________________________________";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
  /// Page-level heading (test title, ANSWER KEY, ...).
  Title(String),
  /// Part heading.
  Heading(String),
  /// Bold one-line label (section names, key groups).
  Label(String),
  Text(String),
  Italic(String),
  /// Bold `Question N:` lead, prompt, and options or answer blank on the line below.
  Question { id: u32, prompt: String, answer_line: String },
  PageBreak,
}

/// `A`..`Z`, then `27`, `28`, ... for unusually long option lists.
fn option_label(index: usize) -> String {
  match u8::try_from(index) {
    Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
    _ => (index + 1).to_string(),
  }
}

/// ` A. opt ` items joined by four spaces, or the blank line when there are no options.
pub fn answer_line(q: &Question) -> String {
  let opts = q.option_list();
  if opts.is_empty() {
    return ANSWER_BLANK.to_string();
  }
  opts
    .iter()
    .enumerate()
    .map(|(i, opt)| format!(" {}. {opt} ", option_label(i)))
    .collect::<Vec<_>>()
    .join("    ")
}

fn question(q: &Question) -> Block {
  Block::Question { id: q.id, prompt: q.question_text.clone(), answer_line: answer_line(q) }
}

fn section(out: &mut Vec<Block>, label: &str, questions: &[Question]) {
  out.push(Block::Label(label.into()));
  out.extend(questions.iter().map(question));
}

fn key_line(questions: &[Question]) -> String {
  questions
    .iter()
    .map(|q| format!("Q{}: {}", q.id, q.correct_answer))
    .collect::<Vec<_>>()
    .join(" | ")
}

fn key(out: &mut Vec<Block>, label: &str, questions: &[Question]) {
  out.push(Block::Label(label.into()));
  out.push(Block::Text(key_line(questions)));
}

pub fn build_document(test: &GeneratedTest) -> Vec<Block> {
  let mut out = Vec::new();
  let title = if test.test_title.trim().is_empty() { "GENERATED TEST" } else { test.test_title.as_str() };
  out.push(Block::Title(title.into()));

  let a = &test.part_a;
  out.push(Block::Heading(a.title.clone()));
  section(&mut out, "TASK 1", &a.task1.questions);
  section(&mut out, "TASK 2", &a.task2.questions);

  let b = &test.part_b;
  out.push(Block::Heading(b.title.clone()));
  section(&mut out, "I. Multiple Choice", &b.section1_mcq);
  section(&mut out, "II. Error Identification", &b.section2_error);
  section(&mut out, "III. Verb Forms", &b.section3_verbs);

  let c = &test.part_c;
  out.push(Block::Heading(c.title.clone()));
  section(&mut out, "I. Sign/Picture", std::slice::from_ref(&c.sign_question));
  out.push(Block::Label("II. Cloze Test".into()));
  out.push(Block::Italic(c.cloze_passage.text.clone()));
  out.extend(c.cloze_passage.questions.iter().map(question));
  out.push(Block::Label("III. Reading Comprehension".into()));
  out.push(Block::Text(c.comprehension_passage.text.clone()));
  out.extend(c.comprehension_passage.questions.iter().map(question));

  let d = &test.part_d;
  out.push(Block::Heading(d.title.clone()));
  section(&mut out, "I. Reordering", &d.reordering);
  section(&mut out, "II. Rewriting", &d.rewriting);
  out.push(Block::Label("III. Paragraph Writing".into()));
  out.push(Block::Label(d.paragraph.prompt.clone()));

  out.push(Block::PageBreak);
  out.push(Block::Title("ANSWER KEY".into()));
  out.push(Block::Heading("Part A: Listening".into()));
  key(&mut out, "Task 1", &a.task1.questions);
  key(&mut out, "Task 2", &a.task2.questions);
  out.push(Block::Heading("Part B: Language Focus".into()));
  key(&mut out, "Multiple Choice", &b.section1_mcq);
  key(&mut out, "Error ID", &b.section2_error);
  key(&mut out, "Verbs", &b.section3_verbs);
  out.push(Block::Heading("Part C: Reading".into()));
  out.push(Block::Text(format!("Sign: {}", c.sign_question.correct_answer)));
  key(&mut out, "Cloze", &c.cloze_passage.questions);
  key(&mut out, "Comprehension", &c.comprehension_passage.questions);
  out.push(Block::Heading("Part D: Writing".into()));
  key(&mut out, "Reordering", &d.reordering);
  key(&mut out, "Rewriting", &d.rewriting);
  out.push(Block::Label("Sample Paragraph:".into()));
  out.push(Block::Italic(d.paragraph.sample_answer.clone()));

  out.push(Block::PageBreak);
  out.push(Block::Title("LISTENING SCRIPTS".into()));
  out.push(Block::Heading("Task 1".into()));
  out.push(Block::Text(a.task1.script.clone()));
  out.push(Block::Heading("Task 2".into()));
  out.push(Block::Text(a.task2.script.clone()));

  let m = &test.matrix_report;
  out.push(Block::PageBreak);
  out.push(Block::Title("MATRIX REPORT".into()));
  out.push(Block::Text(format!("Recognition: {}", m.recognition_count)));
  out.push(Block::Text(format!("Comprehension: {}", m.comprehension_count)));
  out.push(Block::Text(format!("Application: {}", m.application_count)));
  out.push(Block::Text(format!("Compliance Note: {}", m.compliance_note)));

  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::fixtures::{question as fixture_question, sample_test};
  use crate::domain::{CognitiveLevel, QuestionType};

  #[test]
  fn choice_questions_list_lettered_options() {
    let q = fixture_question(1, QuestionType::Mcq, CognitiveLevel::Recognition);
    assert_eq!(answer_line(&q), [" A. cat ", " B. dog ", " C. bird "].join("    "));
    let open = fixture_question(2, QuestionType::Rewrite, CognitiveLevel::Application);
    assert_eq!(answer_line(&open), ANSWER_BLANK);
  }

  #[test]
  fn long_option_lists_keep_every_option() {
    let mut q = fixture_question(1, QuestionType::Mcq, CognitiveLevel::Recognition);
    q.options = Some((1..=28).map(|n| format!("opt{n}")).collect());
    let line = answer_line(&q);
    assert!(line.starts_with(" A. opt1 "));
    assert!(line.contains(" Z. opt26 "));
    assert!(line.ends_with(" 28. opt28 "));
    assert_eq!(line.matches("opt").count(), 28);
  }

  #[test]
  fn sections_appear_in_order_with_page_breaks() {
    let doc = build_document(&sample_test());
    let titles: Vec<&str> = doc
      .iter()
      .filter_map(|b| match b {
        Block::Title(t) => Some(t.as_str()),
        _ => None,
      })
      .collect();
    assert_eq!(titles, ["Unit 3 Review", "ANSWER KEY", "LISTENING SCRIPTS", "MATRIX REPORT"]);
    assert_eq!(doc.iter().filter(|b| **b == Block::PageBreak).count(), 3);
    let questions = doc.iter().filter(|b| matches!(b, Block::Question { .. })).count();
    assert_eq!(questions, 45);
  }

  #[test]
  fn empty_comprehension_keeps_its_header() {
    let mut test = sample_test();
    test.part_c.comprehension_passage.questions.clear();
    let doc = build_document(&test);
    let at = doc
      .iter()
      .position(|b| *b == Block::Label("III. Reading Comprehension".into()))
      .unwrap();
    assert_eq!(doc[at + 1], Block::Text("Lan lives in Hanoi.".into()));
    assert_eq!(doc[at + 2], Block::Heading(test.part_d.title.clone()));
  }

  #[test]
  fn answer_key_joins_pairs() {
    let doc = build_document(&sample_test());
    let at = doc.iter().position(|b| *b == Block::Label("Error ID".into())).unwrap();
    assert_eq!(doc[at + 1], Block::Text("Q21: answer 21 | Q22: answer 22".into()));
    assert!(doc.contains(&Block::Text("Sign: dog".into())));
  }

  #[test]
  fn blank_title_falls_back() {
    let mut test = sample_test();
    test.test_title = "  ".into();
    assert_eq!(build_document(&test)[0], Block::Title("GENERATED TEST".into()));
  }
}
