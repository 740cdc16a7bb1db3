//! Generation boundary: the `TestGenerator` capability, prompt assembly and
//! reply parsing.
//!
//! A backend only has to turn (system, user) prompts into raw text; everything
//! that makes that text a trustworthy `GeneratedTest` lives here so that any
//! backend gets the same truncation, fence stripping and schema validation.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{GenerationSettings, Prompts};
use crate::domain::TestConfiguration;
use crate::error::GenerationError;
use crate::schema::{self, ValidatedTest, ValidationPolicy};
use crate::util::{fill_template, truncate_chars};

/// Result of one successful generation call.
#[derive(Clone, Debug)]
pub struct Generated {
  pub validated: ValidatedTest,
  /// Material was longer than the character budget and was cut.
  pub truncated: bool,
}

/// Produces a validated test from teaching material and topic choices.
#[async_trait]
pub trait TestGenerator: Send + Sync {
  async fn generate(
    &self,
    material: &str,
    config: &TestConfiguration,
  ) -> Result<Generated, GenerationError>;
}

/// Outbound request, ready for a concrete backend.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
  pub system: String,
  pub user: String,
  pub truncated: bool,
}

/// Build the prompts for one generation call, truncating the material to the budget.
#[instrument(level = "debug", skip_all, fields(material_len = material.chars().count(), max = settings.max_material_chars))]
pub fn build_request(
  prompts: &Prompts,
  settings: &GenerationSettings,
  material: &str,
  config: &TestConfiguration,
) -> GenerationRequest {
  let (kept, truncated) = truncate_chars(material, settings.max_material_chars);
  if truncated {
    warn!(
      target: "generation",
      original_chars = material.chars().count(),
      kept_chars = settings.max_material_chars,
      "Material exceeds the character budget; trailing content dropped"
    );
  }

  // Material goes last so topic text can't pick up a {material} placeholder from it.
  let user = fill_template(
    &prompts.test_user_template,
    &[
      ("listening_topic_1", config.listening_topic1.as_str()),
      ("listening_topic_2", config.listening_topic2.as_str()),
      ("reading_topic", config.reading_topic.as_str()),
      ("writing_topic", config.writing_topic.as_str()),
    ],
  );
  let user = fill_template(&user, &[("material", kept)]);

  GenerationRequest { system: prompts.test_system.clone(), user, truncated }
}

/// Remove a leading ```` ``` ```` / ```` ```json ```` fence and a trailing ```` ``` ```` fence.
///
/// Unfenced text is returned trimmed; applying it twice yields the same result.
pub fn strip_code_fences(raw: &str) -> &str {
  let mut s = raw.trim();
  if let Some(rest) = s.strip_prefix("```") {
    let rest = match rest.get(..4) {
      Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
      _ => rest,
    };
    s = rest.trim_start();
    if let Some(body) = s.strip_suffix("```") {
      s = body.trim_end();
    }
  }
  s
}

/// Turn a raw backend reply into a validated test.
pub fn parse_reply(raw: &str, policy: ValidationPolicy) -> Result<ValidatedTest, GenerationError> {
  if raw.trim().is_empty() {
    return Err(GenerationError::EmptyReply);
  }
  let body = strip_code_fences(raw);
  if body.is_empty() {
    return Err(GenerationError::EmptyReply);
  }
  let value: Value = serde_json::from_str(body).map_err(GenerationError::MalformedJson)?;
  debug!(target: "generation", reply_bytes = raw.len(), "Reply parsed as JSON");
  Ok(schema::validate(value, policy)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::fixtures::sample_test;

  fn topics() -> TestConfiguration {
    TestConfiguration {
      listening_topic1: "School trip".into(),
      listening_topic2: "Weekend plans".into(),
      reading_topic: "Tet holiday".into(),
      writing_topic: "My hobby".into(),
    }
  }

  #[test]
  fn long_material_is_cut_to_exactly_the_budget() {
    let material = format!("{}{}", "a".repeat(30_000), "ж".repeat(5_000));
    assert_eq!(material.chars().count(), 35_000);
    let req = build_request(&Prompts::default(), &GenerationSettings::default(), &material, &topics());
    assert!(req.truncated);
    assert!(req.user.contains(&"a".repeat(30_000)));
    assert!(!req.user.contains(&"a".repeat(30_001)));
    assert!(!req.user.contains('ж'));
  }

  #[test]
  fn short_material_is_embedded_whole() {
    let req = build_request(&Prompts::default(), &GenerationSettings::default(), "Unit 5: Food", &topics());
    assert!(!req.truncated);
    assert!(req.user.contains("Unit 5: Food"));
    assert!(req.user.contains("- Listening Topic 1: School trip"));
    assert!(req.user.contains("- Writing Topic: My hobby"));
    assert!(req.system.contains("STRICT MATRIX COMPLIANCE"));
  }

  #[test]
  fn material_placeholders_are_not_expanded() {
    let prompts = Prompts { test_system: String::new(), test_user_template: "{reading_topic}|{material}".into() };
    let req = build_request(&prompts, &GenerationSettings::default(), "see {reading_topic}", &topics());
    assert_eq!(req.user, "Tet holiday|see {reading_topic}");
  }

  #[test]
  fn fence_stripping_is_tolerant_and_idempotent() {
    let inner = r#"{"a": [1, 2]}"#;
    let variants = [
      format!("```json\n{inner}\n```"),
      format!("```JSON {inner}```"),
      format!("```\n{inner}\n```\n"),
      format!("  {inner}  "),
    ];
    for v in &variants {
      let once = strip_code_fences(v);
      assert_eq!(once, inner, "variant {v:?}");
      assert_eq!(strip_code_fences(once), once);
    }
  }

  #[test]
  fn fenced_and_bare_replies_parse_to_the_same_test() {
    let inner = serde_json::to_string(&sample_test()).unwrap();
    let bare = parse_reply(&inner, ValidationPolicy::Repair).unwrap();
    let fenced = parse_reply(&format!("```json\n{inner}\n```"), ValidationPolicy::Repair).unwrap();
    let plain_fence = parse_reply(&format!("```\n{inner}\n```"), ValidationPolicy::Repair).unwrap();
    assert_eq!(bare, fenced);
    assert_eq!(bare, plain_fence);
  }

  #[test]
  fn empty_reply_fails_before_parsing() {
    assert!(matches!(parse_reply("", ValidationPolicy::Repair), Err(GenerationError::EmptyReply)));
    assert!(matches!(parse_reply("  \n", ValidationPolicy::Repair), Err(GenerationError::EmptyReply)));
    assert!(matches!(parse_reply("```json\n```", ValidationPolicy::Repair), Err(GenerationError::EmptyReply)));
  }

  #[test]
  fn malformed_and_mismatched_replies_are_distinguished() {
    assert!(matches!(
      parse_reply("{not json", ValidationPolicy::Repair),
      Err(GenerationError::MalformedJson(_))
    ));
    assert!(matches!(
      parse_reply(r#"{"testTitle": "x"}"#, ValidationPolicy::Repair),
      Err(GenerationError::Schema(_))
    ));
  }
}
