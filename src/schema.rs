//! Structural validation of generated tests.
//!
//! Flow:
//! 1) Check that every required object/array/scalar exists with the right JSON type.
//! 2) Decode each question individually so a bad tag is reported with its exact path.
//! 3) Decode the whole tree into `GeneratedTest`.
//! 4) Check the matrix invariants and choice questions; repair or reject per policy.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{GeneratedTest, Question};
use crate::error::SchemaError;

/// How far the validator goes to accept imperfect backend output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
  /// Fill recoverable gaps and report inconsistencies as warnings.
  #[default]
  Repair,
  /// Reject missing totals, total mismatches and answers outside their options.
  Strict,
}

/// Non-fatal inconsistency found in an accepted test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationWarning {
  TotalRepaired { counted: u32 },
  TotalMismatch { reported: u32, counted: u32 },
  LevelSumMismatch { levels: u64, total: u32 },
  SectionCount { section: &'static str, expected: usize, found: usize },
  MissingOptions { id: u32 },
  AnswerNotInOptions { id: u32, answer: String },
  DuplicateId { id: u32 },
  IdOutOfOrder { id: u32, previous: u32 },
}

impl fmt::Display for ValidationWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::TotalRepaired { counted } => write!(f, "totalQuestions was missing; set to {counted}"),
      Self::TotalMismatch { reported, counted } => {
        write!(f, "totalQuestions is {reported} but {counted} questions were found")
      }
      Self::LevelSumMismatch { levels, total } => {
        write!(f, "level counts add up to {levels}, totalQuestions is {total}")
      }
      Self::SectionCount { section, expected, found } => {
        write!(f, "{section} has {found} questions, expected {expected}")
      }
      Self::MissingOptions { id } => write!(f, "question {id} is a choice item without options"),
      Self::AnswerNotInOptions { id, answer } => {
        write!(f, "question {id}: answer {answer:?} is not one of its options")
      }
      Self::DuplicateId { id } => write!(f, "question id {id} appears more than once"),
      Self::IdOutOfOrder { id, previous } => write!(f, "question id {id} follows {previous}"),
    }
  }
}

/// A test that passed validation, plus whatever was tolerated along the way.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidatedTest {
  pub test: GeneratedTest,
  pub warnings: Vec<ValidationWarning>,
}

#[derive(Clone, Copy)]
enum Kind {
  Object,
  Array,
  String,
  Number,
}

impl Kind {
  fn matches(self, v: &Value) -> bool {
    match self {
      Kind::Object => v.is_object(),
      Kind::Array => v.is_array(),
      Kind::String => v.is_string(),
      Kind::Number => v.is_number(),
    }
  }

  fn name(self) -> &'static str {
    match self {
      Kind::Object => "an object",
      Kind::Array => "an array",
      Kind::String => "a string",
      Kind::Number => "a number",
    }
  }
}

/// Required nodes, parents before children.
const REQUIRED: &[(&str, Kind)] = &[
  ("/testTitle", Kind::String),
  ("/partA", Kind::Object),
  ("/partA/task1", Kind::Object),
  ("/partA/task1/script", Kind::String),
  ("/partA/task1/questions", Kind::Array),
  ("/partA/task2", Kind::Object),
  ("/partA/task2/script", Kind::String),
  ("/partA/task2/questions", Kind::Array),
  ("/partB", Kind::Object),
  ("/partB/section1_mcq", Kind::Array),
  ("/partB/section2_error", Kind::Array),
  ("/partB/section3_verbs", Kind::Array),
  ("/partC", Kind::Object),
  ("/partC/signQuestion", Kind::Object),
  ("/partC/clozePassage", Kind::Object),
  ("/partC/clozePassage/text", Kind::String),
  ("/partC/clozePassage/questions", Kind::Array),
  ("/partC/comprehensionPassage", Kind::Object),
  ("/partC/comprehensionPassage/text", Kind::String),
  ("/partC/comprehensionPassage/questions", Kind::Array),
  ("/partD", Kind::Object),
  ("/partD/reordering", Kind::Array),
  ("/partD/rewriting", Kind::Array),
  ("/partD/paragraph", Kind::Object),
  ("/partD/paragraph/prompt", Kind::String),
  ("/partD/paragraph/sampleAnswer", Kind::String),
  ("/matrixReport", Kind::Object),
  ("/matrixReport/recognitionCount", Kind::Number),
  ("/matrixReport/comprehensionCount", Kind::Number),
  ("/matrixReport/applicationCount", Kind::Number),
  ("/matrixReport/complianceNote", Kind::String),
];

/// Question lists with the cardinality the instruction set asks for.
const SECTIONS: &[(&str, &str, usize)] = &[
  ("/partA/task1/questions", "Part A task 1", 5),
  ("/partA/task2/questions", "Part A task 2", 5),
  ("/partB/section1_mcq", "Part B multiple choice", 10),
  ("/partB/section2_error", "Part B error identification", 2),
  ("/partB/section3_verbs", "Part B verb forms", 3),
  ("/partC/clozePassage/questions", "Part C cloze", 5),
  ("/partC/comprehensionPassage/questions", "Part C comprehension", 6),
  ("/partD/reordering", "Part D reordering", 3),
  ("/partD/rewriting", "Part D rewriting", 5),
];

fn json_kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

fn shape(path: impl Into<String>, message: impl Into<String>) -> SchemaError {
  SchemaError::Shape { path: path.into(), message: message.into() }
}

fn check_required(root: &Value) -> Result<(), SchemaError> {
  for (ptr, kind) in REQUIRED {
    match root.pointer(ptr) {
      None | Some(Value::Null) => return Err(shape(*ptr, format!("required {} is missing", kind.name()))),
      Some(v) if !kind.matches(v) => {
        return Err(shape(*ptr, format!("expected {}, found {}", kind.name(), json_kind(v))))
      }
      Some(_) => {}
    }
  }
  Ok(())
}

fn check_questions(root: &Value) -> Result<(), SchemaError> {
  let sign = "/partC/signQuestion";
  if let Some(v) = root.pointer(sign) {
    Question::deserialize(v).map_err(|e| shape(sign, e.to_string()))?;
  }
  for (ptr, _, _) in SECTIONS {
    let Some(items) = root.pointer(ptr).and_then(Value::as_array) else { continue };
    for (i, item) in items.iter().enumerate() {
      Question::deserialize(item).map_err(|e| shape(format!("{ptr}/{i}"), e.to_string()))?;
    }
  }
  Ok(())
}

fn answer_in_options(q: &Question) -> bool {
  let answer = q.correct_answer.trim();
  q.option_list().iter().any(|o| o.trim().eq_ignore_ascii_case(answer))
}

fn section_lists(t: &GeneratedTest) -> [&[Question]; 9] {
  [
    &t.part_a.task1.questions,
    &t.part_a.task2.questions,
    &t.part_b.section1_mcq,
    &t.part_b.section2_error,
    &t.part_b.section3_verbs,
    &t.part_c.cloze_passage.questions,
    &t.part_c.comprehension_passage.questions,
    &t.part_d.reordering,
    &t.part_d.rewriting,
  ]
}

/// Validate a parsed JSON value against the generated-test contract.
pub fn validate(value: Value, policy: ValidationPolicy) -> Result<ValidatedTest, SchemaError> {
  if !value.is_object() {
    return Err(SchemaError::NotAnObject(json_kind(&value)));
  }
  check_required(&value)?;
  check_questions(&value)?;

  let total_present = value
    .pointer("/matrixReport/totalQuestions")
    .map_or(false, |v| !v.is_null());

  let mut test: GeneratedTest = serde_json::from_value(value).map_err(|e| shape("$", e.to_string()))?;
  let mut warnings = Vec::new();
  let counted = test.question_count() as u32;

  if !total_present {
    if policy == ValidationPolicy::Strict {
      return Err(SchemaError::MissingTotal);
    }
    test.matrix_report.total_questions = counted;
    warnings.push(ValidationWarning::TotalRepaired { counted });
  } else if test.matrix_report.total_questions != counted {
    let reported = test.matrix_report.total_questions;
    if policy == ValidationPolicy::Strict {
      return Err(SchemaError::TotalMismatch { reported, counted });
    }
    warnings.push(ValidationWarning::TotalMismatch { reported, counted });
  }

  let levels = test.matrix_report.level_sum();
  if levels != u64::from(test.matrix_report.total_questions) {
    warnings.push(ValidationWarning::LevelSumMismatch { levels, total: test.matrix_report.total_questions });
  }

  for ((_, section, expected), list) in SECTIONS.iter().zip(section_lists(&test)) {
    if list.len() != *expected {
      warnings.push(ValidationWarning::SectionCount { section: *section, expected: *expected, found: list.len() });
    }
  }

  let mut seen = HashSet::new();
  let mut previous: Option<u32> = None;
  for q in test.questions() {
    if !seen.insert(q.id) {
      warnings.push(ValidationWarning::DuplicateId { id: q.id });
    } else if let Some(prev) = previous.filter(|p| q.id <= *p) {
      warnings.push(ValidationWarning::IdOutOfOrder { id: q.id, previous: prev });
    }
    previous = Some(q.id);

    if !q.kind.is_choice() {
      continue;
    }
    if q.option_list().is_empty() {
      warnings.push(ValidationWarning::MissingOptions { id: q.id });
    } else if !answer_in_options(q) {
      if policy == ValidationPolicy::Strict {
        return Err(SchemaError::AnswerNotInOptions { id: q.id, answer: q.correct_answer.clone() });
      }
      warnings.push(ValidationWarning::AnswerNotInOptions { id: q.id, answer: q.correct_answer.clone() });
    }
  }

  if warnings.is_empty() {
    debug!(target: "generation", questions = counted, "Test passed validation");
  } else {
    for w in &warnings {
      warn!(target: "generation", warning = %w, "Test accepted with inconsistency");
    }
  }

  Ok(ValidatedTest { test, warnings })
}
