//! Target-word extraction from document text.
//!
//! Documents mark their answers with lines like `A: apple`. We collect every
//! marked 5-letter alphabetic token, uppercase it, and draw the round's target
//! uniformly at random from the pool.
//!
//! The pool is deliberately NOT deduplicated: a word marked twice in the
//! document is twice as likely to be chosen.

use rand::seq::SliceRandom;
use regex::Regex;
use tracing::{info, instrument};

use crate::domain::WORD_LENGTH;
use crate::error::{GameError, GameResult};

/// Collect all marked 5-letter candidate answers, in document order, uppercased.
pub fn candidate_words(text: &str) -> Vec<String> {
  // The trailing \b stops longer tokens from matching partially.
  let re = Regex::new(&format!(r"A:\s*([a-zA-Z]{{{WORD_LENGTH}}})\b"))
    .expect("static answer-marker regex");
  re.captures_iter(text)
    .map(|cap| cap[1].to_uppercase())
    .collect()
}

/// Pick the round's target uniformly at random from the candidate pool.
/// An empty pool means the document cannot host a round.
#[instrument(level = "info", skip(text), fields(text_len = text.len()))]
pub fn select_target(text: &str) -> GameResult<String> {
  let pool = candidate_words(text);
  if pool.is_empty() {
    return Err(GameError::ContentExtraction(
      "no valid 5-letter answers found in the document".into(),
    ));
  }
  let word = pool
    .choose(&mut rand::thread_rng())
    .cloned()
    .expect("non-empty pool");
  info!(target: "game", pool_size = pool.len(), "Target word selected");
  Ok(word)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pool_keeps_only_five_letter_alphabetic_tokens() {
    let pool = candidate_words("A: apple\nA: Zebra\nA: tomato\nA: fig\n");
    // "tomato" (6 letters) and "fig" (3 letters) are excluded.
    assert_eq!(pool, vec!["APPLE".to_string(), "ZEBRA".to_string()]);
  }

  #[test]
  fn repeated_answers_stay_in_the_pool() {
    let pool = candidate_words("A: mango\nQ: what?\nA: mango\nA: grape\n");
    assert_eq!(pool.len(), 3);
    assert_eq!(pool.iter().filter(|w| *w == "MANGO").count(), 2);
  }

  #[test]
  fn marker_allows_flexible_spacing() {
    let pool = candidate_words("A:berry and A:   lemon end");
    assert_eq!(pool, vec!["BERRY".to_string(), "LEMON".to_string()]);
  }

  #[test]
  fn no_markers_is_a_content_extraction_error() {
    let err = select_target("Just prose, no answers here.").unwrap_err();
    assert!(matches!(err, GameError::ContentExtraction(_)));
  }

  #[test]
  fn selected_target_comes_from_the_pool() {
    for _ in 0..20 {
      let word = select_target("A: apple\nA: zebra\n").expect("target");
      assert!(word == "APPLE" || word == "ZEBRA");
    }
  }
}
