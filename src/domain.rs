//! Domain models: generated test tree, question tags, topic configuration, saved records.
//!
//! Field names follow the camelCase JSON contract shared with the generation
//! backend and the browser front-end.

use serde::{Deserialize, Serialize};

/// Four free-text topics picked before generation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfiguration {
  pub listening_topic1: String,
  pub listening_topic2: String,
  pub reading_topic: String,
  pub writing_topic: String,
}

impl TestConfiguration {
  /// Placeholder recorded when a save request carries no configuration.
  pub fn unknown() -> Self {
    Self {
      listening_topic1: "Unknown".into(),
      listening_topic2: "Unknown".into(),
      reading_topic: "Unknown".into(),
      writing_topic: "Unknown".into(),
    }
  }
}

/// Question format tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
  Mcq,
  TrueFalse,
  GapFill,
  ErrorId,
  Reorder,
  Rewrite,
  Essay,
}

impl QuestionType {
  /// Choice-like items are rendered with their option list and keyed by option value.
  pub fn is_choice(self) -> bool {
    matches!(self, QuestionType::Mcq | QuestionType::TrueFalse)
  }
}

/// Cognitive level used by the matrix report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CognitiveLevel {
  Recognition,
  Comprehension,
  Application,
  #[serde(rename = "High Application")]
  HighApplication,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: u32,
  pub question_text: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  pub correct_answer: String,
  #[serde(rename = "type")]
  pub kind: QuestionType,
  pub level: CognitiveLevel,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
}

impl Question {
  /// Options as a slice; empty when the backend sent none.
  pub fn option_list(&self) -> &[String] {
    self.options.as_deref().unwrap_or(&[])
  }
}

/// One listening task: the transcript read aloud plus its questions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptedTask {
  pub script: String,
  pub questions: Vec<Question>,
}

/// A reading text paired with the questions asked about it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Passage {
  pub text: String,
  pub questions: Vec<Question>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphTask {
  pub prompt: String,
  pub sample_answer: String,
}

pub const PART_A_TITLE: &str = "PART A – LISTENING";
pub const PART_B_TITLE: &str = "PART B – LANGUAGE FOCUS";
pub const PART_C_TITLE: &str = "PART C – READING";
pub const PART_D_TITLE: &str = "PART D – WRITING";

fn part_a_title() -> String { PART_A_TITLE.into() }
fn part_b_title() -> String { PART_B_TITLE.into() }
fn part_c_title() -> String { PART_C_TITLE.into() }
fn part_d_title() -> String { PART_D_TITLE.into() }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListeningPart {
  #[serde(default = "part_a_title")]
  pub title: String,
  pub task1: ScriptedTask,
  pub task2: ScriptedTask,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LanguageFocusPart {
  #[serde(default = "part_b_title")]
  pub title: String,
  pub section1_mcq: Vec<Question>,
  pub section2_error: Vec<Question>,
  pub section3_verbs: Vec<Question>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPart {
  #[serde(default = "part_c_title")]
  pub title: String,
  pub sign_question: Question,
  pub cloze_passage: Passage,
  pub comprehension_passage: Passage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WritingPart {
  #[serde(default = "part_d_title")]
  pub title: String,
  pub reordering: Vec<Question>,
  pub rewriting: Vec<Question>,
  pub paragraph: ParagraphTask,
}

/// Compliance summary as reported by the generation backend.
///
/// `total_questions` defaults to zero when absent so the validator can decide
/// whether to repair or reject; see `schema::validate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixReport {
  pub recognition_count: u32,
  pub comprehension_count: u32,
  pub application_count: u32,
  #[serde(default)]
  pub total_questions: u32,
  pub compliance_note: String,
}

impl MatrixReport {
  /// Widened so arbitrary backend counts cannot overflow.
  pub fn level_sum(&self) -> u64 {
    u64::from(self.recognition_count)
      + u64::from(self.comprehension_count)
      + u64::from(self.application_count)
  }
}

/// Root aggregate returned by the generation backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTest {
  pub test_title: String,
  pub part_a: ListeningPart,
  pub part_b: LanguageFocusPart,
  pub part_c: ReadingPart,
  pub part_d: WritingPart,
  pub matrix_report: MatrixReport,
}

impl GeneratedTest {
  /// Every question in document order (A task1, A task2, B 1-3, C sign, cloze, comprehension, D).
  pub fn questions(&self) -> impl Iterator<Item = &Question> {
    self.part_a.task1.questions.iter()
      .chain(&self.part_a.task2.questions)
      .chain(&self.part_b.section1_mcq)
      .chain(&self.part_b.section2_error)
      .chain(&self.part_b.section3_verbs)
      .chain(std::iter::once(&self.part_c.sign_question))
      .chain(&self.part_c.cloze_passage.questions)
      .chain(&self.part_c.comprehension_passage.questions)
      .chain(&self.part_d.reordering)
      .chain(&self.part_d.rewriting)
  }

  pub fn question_count(&self) -> usize {
    self.questions().count()
  }
}

/// Named snapshot persisted by the record store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedTestRecord {
  pub id: String,
  pub name: String,
  /// Creation time, epoch milliseconds.
  pub timestamp: i64,
  pub data: GeneratedTest,
  pub config: TestConfiguration,
}

#[cfg(test)]
pub(crate) mod fixtures {
  //! Canonical well-formed test used across module tests.

  use super::*;

  pub fn question(id: u32, kind: QuestionType, level: CognitiveLevel) -> Question {
    let (options, answer) = match kind {
      QuestionType::Mcq => (Some(vec!["cat".to_string(), "dog".into(), "bird".into()]), "dog".to_string()),
      QuestionType::TrueFalse => (Some(vec!["True".to_string(), "False".into()]), "True".to_string()),
      _ => (None, format!("answer {id}")),
    };
    Question {
      id,
      question_text: format!("Prompt for question {id}"),
      options,
      correct_answer: answer,
      kind,
      level,
      explanation: None,
    }
  }

  fn run(start: &mut u32, n: u32, kind: QuestionType, level: CognitiveLevel) -> Vec<Question> {
    (0..n)
      .map(|_| {
        let q = question(*start, kind, level);
        *start += 1;
        q
      })
      .collect()
  }

  /// A test with the nominal cardinalities (A:5+5, B:10+2+3, C:1+5+6, D:3+5 = 45).
  pub fn sample_test() -> GeneratedTest {
    use CognitiveLevel::*;
    use QuestionType::*;
    let mut next = 1;
    let task1 = run(&mut next, 5, Mcq, Recognition);
    let task2 = run(&mut next, 5, TrueFalse, Comprehension);
    let mcq = run(&mut next, 10, Mcq, Recognition);
    let err = run(&mut next, 2, ErrorId, Comprehension);
    let verbs = run(&mut next, 3, GapFill, Recognition);
    let sign = question(next, Mcq, Comprehension);
    next += 1;
    let cloze = run(&mut next, 5, Mcq, Comprehension);
    let comp = run(&mut next, 6, Mcq, Comprehension);
    let reorder = run(&mut next, 3, Reorder, Application);
    let rewrite = run(&mut next, 5, Rewrite, HighApplication);

    // 5 + 10 + 3 = 18 recognition, 5 + 2 + 1 + 5 + 6 = 19 comprehension, 8 application.
    GeneratedTest {
      test_title: "Unit 3 Review".into(),
      part_a: ListeningPart {
        title: PART_A_TITLE.into(),
        task1: ScriptedTask { script: "Speaker A: Hello.".into(), questions: task1 },
        task2: ScriptedTask { script: "Speaker B: Goodbye.".into(), questions: task2 },
      },
      part_b: LanguageFocusPart {
        title: PART_B_TITLE.into(),
        section1_mcq: mcq,
        section2_error: err,
        section3_verbs: verbs,
      },
      part_c: ReadingPart {
        title: PART_C_TITLE.into(),
        sign_question: sign,
        cloze_passage: Passage { text: "I [1] to school every day.".into(), questions: cloze },
        comprehension_passage: Passage { text: "Lan lives in Hanoi.".into(), questions: comp },
      },
      part_d: WritingPart {
        title: PART_D_TITLE.into(),
        reordering: reorder,
        rewriting: rewrite,
        paragraph: ParagraphTask {
          prompt: "Write about your hobby (80-100 words).".into(),
          sample_answer: "My hobby is reading.".into(),
        },
      },
      matrix_report: MatrixReport {
        recognition_count: 18,
        comprehension_count: 19,
        application_count: 8,
        total_questions: 45,
        compliance_note: "Matches the 40/45/15 target.".into(),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn question_tags_use_wire_names() {
    let json = serde_json::to_value(fixtures::question(7, QuestionType::TrueFalse, CognitiveLevel::HighApplication)).unwrap();
    assert_eq!(json["type"], "TRUE_FALSE");
    assert_eq!(json["level"], "High Application");
    assert_eq!(json["questionText"], "Prompt for question 7");
    assert!(json.get("explanation").is_none());
  }

  #[test]
  fn question_count_enumerates_all_parts() {
    let t = fixtures::sample_test();
    assert_eq!(t.question_count(), 45);
    let ids: Vec<u32> = t.questions().map(|q| q.id).collect();
    assert_eq!(ids, (1..=45).collect::<Vec<_>>());
  }

  #[test]
  fn missing_part_title_gets_canonical_default() {
    let mut v = serde_json::to_value(fixtures::sample_test()).unwrap();
    v["partC"].as_object_mut().unwrap().remove("title");
    let t: GeneratedTest = serde_json::from_value(v).unwrap();
    assert_eq!(t.part_c.title, PART_C_TITLE);
  }
}
