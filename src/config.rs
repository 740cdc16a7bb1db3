//! Loading agent configuration (prompts + generation settings) from TOML,
//! and server settings from the environment.
//!
//! See `AgentConfig`, `Prompts` and `GenerationSettings` for the TOML schema.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::schema::ValidationPolicy;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub generation: GenerationSettings,
}

/// Prompts sent to the generation backend.
///
/// `test_user_template` placeholders: `{material}`, `{listening_topic_1}`,
/// `{listening_topic_2}`, `{reading_topic}`, `{writing_topic}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub test_system: String,
  pub test_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      test_system: TEST_SYSTEM.into(),
      test_user_template: TEST_USER_TEMPLATE.into(),
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
  /// Material beyond this many characters is dropped before the request.
  pub max_material_chars: usize,
  pub timeout_secs: u64,
  pub temperature: f32,
  pub policy: ValidationPolicy,
}

impl Default for GenerationSettings {
  fn default() -> Self {
    Self {
      max_material_chars: 30_000,
      timeout_secs: 120,
      temperature: 0.7,
      policy: ValidationPolicy::Repair,
    }
  }
}

/// Process-level settings read from env variables.
#[derive(Clone, Debug)]
pub struct ServerSettings {
  pub port: u16,
  pub store_path: PathBuf,
  pub static_dir: PathBuf,
  pub chrome_executable: Option<PathBuf>,
}

impl ServerSettings {
  pub fn from_env() -> Self {
    Self {
      port: std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000),
      store_path: std::env::var("STORE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/saved_tests.json")),
      static_dir: std::env::var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./static")),
      chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "edtest_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "edtest_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "edtest_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

const TEST_SYSTEM: &str = r#"
You are an expert Educational Assessment AI specializing in the Vietnamese MoET General Education Curriculum (Global Success textbook alignment) and Official Guideline CV 7991.
Your task is to generate a rigorous English test based on provided material.

STRICT MATRIX COMPLIANCE (DO NOT DEVIATE):

PART A – LISTENING (2.0 Points - 10 Questions)
- Generate 2 distinct listening scripts based on user topics.
- Task 1: 5 MCQ questions (A, B, C). (Script 1)
- Task 2: 5 True/False OR Gap Fill (1-2 words/number). (Script 2)
- Levels: Recognition, Comprehension.

PART B – LANGUAGE FOCUS (3.0 Points - 15 Questions)
- Section 1 (MCQ - 10 questions): 2 Pronunciation, 3 Vocabulary, 3 Grammar, 1 Communication Situation.
- Section 2 (Error ID - 2 questions): Identify incorrect part.
- Section 3 (Verb Forms - 3 questions): Tense/Pattern completion.
- Levels: Recognition, Comprehension.

PART C – READING (2.4 Points - 12 Questions)
- Q1: 1 Sign/Picture interpretation (Describe the sign in text for the question).
- Q2-Q6: 5 Cloze test questions (Gap fill MCQ).
- Q7-Q12: 6 Reading Comprehension questions (Read text, choose answer).
- Levels: Rec, Comp, Simple App.

PART D – WRITING (2.6 Points)
- 3 Sentence Reordering.
- 5 Sentence Rewriting (Transformation).
- 1 Paragraph Writing (80-100 words).
- Levels: Comp, App, High App.

COGNITIVE DISTRIBUTION:
~40% Recognition, ~45% Comprehension, ~15% Application.

OUTPUT FORMAT:
Return ONLY valid JSON matching the specified schema.
Ensure all strings are properly escaped.
For MCQ and TRUE_FALSE items, correctAnswer must repeat one of the options verbatim.
Do not wrap the output in markdown code blocks (e.g. ```json).
Just return the raw JSON string.
"#;

const TEST_USER_TEMPLATE: &str = r#"
MATERIAL TO ANALYZE:
{material}
(Note: If material is long, it has been truncated to fit context, focus on the essence).

USER CONFIGURATION:
- Listening Topic 1: {listening_topic_1}
- Listening Topic 2: {listening_topic_2}
- Reading Topic: {reading_topic}
- Writing Topic: {writing_topic}

Generate a full English test JSON object.

The JSON structure must match this shape exactly:
{
  "testTitle": "string",
  "partA": {
    "title": "PART A – LISTENING",
    "task1": { "script": "full transcript text", "questions": [ { "id": 1, "questionText": "...", "options": ["A","B","C"], "correctAnswer": "A", "type": "MCQ", "level": "Recognition" } ] },
    "task2": { "script": "full transcript text", "questions": [ { "id": 6, "questionText": "...", "options": ["True", "False"], "correctAnswer": "True", "type": "TRUE_FALSE", "level": "Comprehension" } ] }
  },
  "partB": {
    "title": "PART B – LANGUAGE FOCUS",
    "section1_mcq": [ ... 10 questions ... ],
    "section2_error": [ ... 2 questions ... ],
    "section3_verbs": [ ... 3 questions ... ]
  },
  "partC": {
    "title": "PART C – READING",
    "signQuestion": { ... 1 question ... },
    "clozePassage": { "text": "passage with blanks like [1], [2]...", "questions": [ ... 5 questions ... ] },
    "comprehensionPassage": { "text": "full passage", "questions": [ ... 6 questions ... ] }
  },
  "partD": {
    "title": "PART D – WRITING",
    "reordering": [ ... 3 questions ... ],
    "rewriting": [ ... 5 questions ... ],
    "paragraph": { "prompt": "...", "sampleAnswer": "..." }
  },
  "matrixReport": {
    "recognitionCount": number,
    "comprehensionCount": number,
    "applicationCount": number,
    "totalQuestions": number,
    "complianceNote": "Short analysis of how this matches CV 7991"
  }
}

Allowed "type" values: MCQ, TRUE_FALSE, GAP_FILL, ERROR_ID, REORDER, REWRITE, ESSAY.
Allowed "level" values: Recognition, Comprehension, Application, High Application.
Question ids run sequentially from Part A to Part D.
"#;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_defaults() {
    let cfg: AgentConfig = toml::from_str(
      r#"
      [generation]
      timeout_secs = 30
      policy = "strict"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.generation.timeout_secs, 30);
    assert_eq!(cfg.generation.policy, ValidationPolicy::Strict);
    assert_eq!(cfg.generation.max_material_chars, 30_000);
    assert!(cfg.prompts.test_user_template.contains("{material}"));
  }

  #[test]
  fn prompts_can_be_overridden() {
    let cfg: AgentConfig = toml::from_str(
      r#"
      [prompts]
      test_system = "Be brief."
      "#,
    )
    .unwrap();
    assert_eq!(cfg.prompts.test_system, "Be brief.");
    assert_eq!(cfg.prompts.test_user_template, TEST_USER_TEMPLATE);
  }
}
