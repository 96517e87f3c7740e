//! Guess scoring: per-position Exact / Present / Absent marks.
//!
//! Note on duplicate letters: this evaluator intentionally uses the simple
//! two-pass rule. A guess letter found anywhere in the target (at another
//! position) is marked Present even when that letter's occurrences in the
//! target are already spoken for. The multiplicity-capped variant used by
//! standard Wordle would mark fewer Presents; we keep the simple rule so
//! existing scores and saved feedback rows stay comparable.

use crate::domain::LetterMark;

/// Score `guess` against `target`, producing one mark per target position.
///
/// Any guess length is accepted: extra guess letters are ignored, missing
/// positions are marked Absent. Both strings are expected to be uppercased by
/// the caller.
pub fn evaluate(guess: &str, target: &str) -> Vec<LetterMark> {
  let guess_chars: Vec<char> = guess.chars().collect();
  let target_chars: Vec<char> = target.chars().collect();

  target_chars
    .iter()
    .enumerate()
    .map(|(i, &t)| match guess_chars.get(i) {
      Some(&g) if g == t => LetterMark::Exact,
      Some(&g) if target_chars.contains(&g) => LetterMark::Present,
      Some(_) => LetterMark::Absent,
      None => LetterMark::Absent,
    })
    .collect()
}
