//! Domain models shared across the backend: feedback marks, attempts, chunks,
//! round outcomes, and leaderboard records.

use serde::{Deserialize, Serialize};

/// Number of letters in every target word.
pub const WORD_LENGTH: usize = 5;

/// Maximum guesses a player may submit per round.
pub const MAX_ATTEMPTS: usize = 6;

/// How many context chunks we retrieve when grounding a clue.
pub const CLUE_TOP_K: usize = 3;

/// Per-position classification of a guess letter against the target.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LetterMark {
  /// Right letter, right position.
  Exact,
  /// Letter occurs somewhere else in the target.
  Present,
  /// Letter not in the target at all.
  Absent,
}

/// One scored guess, appended to the session history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attempt {
  pub guess: String,
  pub feedback: Vec<LetterMark>,
}

/// Bounded-size fragment of the source document; the unit of retrieval.
/// Identity is its position in the segmenter's output sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
  pub id: usize,
  pub text: String,
}

/// How a finished round is recorded on the leaderboard.
/// `Pass` means the player revealed the answer (gave up).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoundOutcome {
  Win,
  Pass,
}

/// A single leaderboard entry, one JSON line in the ledger file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreRecord {
  pub name: String,
  pub score: i64,
  pub word: String,
  pub result: RoundOutcome,
}
