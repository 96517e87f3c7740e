//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Uppercase a guess the way the evaluator expects it.
/// Comparison against the target is exact-string after this normalization.
pub fn normalize_guess(s: &str) -> String {
  s.trim().to_uppercase()
}
#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_fills_all_keys() {
    let out = fill_template("word={word} k={k}", &[("word", "ALLOY"), ("k", "3")]);
    assert_eq!(out, "word=ALLOY k=3");
  }

  #[test]
  fn normalize_trims_and_uppercases() {
    assert_eq!(normalize_guess("  zebra "), "ZEBRA");
  }
}
