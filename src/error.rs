//! Error taxonomy for the game backend.
//!
//! Each variant maps to a distinct failure mode with its own recovery policy:
//! - `ContentExtraction` is fatal to starting a round (bad document).
//! - `IndexUnavailable` fails round setup fast; no half-indexed rounds.
//! - `Generation` never kills a session; callers substitute a fallback text.
//! - `Persistence` degrades to a warning; gameplay continues.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
  /// Document yields no text, no chunks, or no valid candidate answers.
  #[error("content extraction failed: {0}")]
  ContentExtraction(String),

  /// Embedding or similarity lookup unreachable/erroring.
  #[error("semantic index unavailable: {0}")]
  IndexUnavailable(String),

  /// Generative-text service failure during clue or bonus-hint creation.
  #[error("clue generation failed: {0}")]
  Generation(String),

  /// Score ledger read/write failure. Never fatal to gameplay.
  #[error("score ledger error: {0}")]
  Persistence(String),

  /// Action referenced a session id that does not exist.
  #[error("unknown session: {0}")]
  UnknownSession(String),

  /// A state-machine transition was rejected (e.g. guess after game over).
  /// The session is left unchanged.
  #[error("{0}")]
  InvalidAction(String),
}

pub type GameResult<T> = Result<T, GameError>;
