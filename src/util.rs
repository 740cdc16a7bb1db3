//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Keep at most `max_chars` characters (Unicode scalar values).
/// Returns the kept prefix and whether anything was dropped.
pub fn truncate_chars(s: &str, max_chars: usize) -> (&str, bool) {
  match s.char_indices().nth(max_chars) {
    Some((byte_idx, _)) => (&s[..byte_idx], true),
    None => (s, false),
  }
}

/// Log-safe truncation for large strings.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  let (head, cut) = truncate_chars(s, max);
  if cut { format!("{}… ({} bytes total)", head, s.len()) } else { s.to_string() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_every_occurrence() {
    let out = fill_template("{a}-{b}-{a}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x-y-x");
  }

  #[test]
  fn truncate_counts_characters_not_bytes() {
    let s = "héllo wörld";
    assert_eq!(truncate_chars(s, 5), ("héllo", true));
    assert_eq!(truncate_chars(s, 11), (s, false));
    assert_eq!(truncate_chars(s, 50), (s, false));
  }

  #[test]
  fn trunc_for_log_keeps_short_strings() {
    assert_eq!(trunc_for_log("abc", 10), "abc");
    assert!(trunc_for_log("abcdefghijkl", 3).starts_with("abc…"));
  }
}
