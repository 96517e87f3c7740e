//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting a round (ingest -> chunk -> index -> target -> grounded clue)
//!   - Submitting guesses and advancing the session state machine
//!   - Hint reveals, including the level-4 bonus clue via fresh retrieval
//!   - Give-up, score submission, leaderboard reads, and round reset
//!
//! Handlers stay thin; everything here works on the shared `AppState`.

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::answer::select_target;
use crate::domain::{Attempt, ScoreRecord};
use crate::error::{GameError, GameResult};
use crate::ingest::{decode_pdf_base64, extract_text_from_pdf, read_preset};
use crate::protocol::{to_view, SessionView};
use crate::segment::chunk_text;
use crate::session::HintContent;
use crate::state::AppState;

/// Start (or restart) a round for this session from a preset document name or
/// a base64 PDF upload. Any in-progress round is abandoned: the session is
/// reset and the semantic index moves to a fresh namespace, so embeddings
/// still in flight for the old round can never surface here.
#[instrument(level = "info", skip(state, pdf_base64), fields(%session_id, preset = preset.as_deref().unwrap_or("-")))]
pub async fn start_round(
  state: &AppState,
  session_id: &str,
  preset: Option<String>,
  pdf_base64: Option<String>,
) -> GameResult<SessionView> {
  let bytes = match (preset, pdf_base64) {
    (Some(name), _) => {
      let doc = state
        .documents
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| GameError::InvalidAction(format!("unknown preset document: {name}")))?;
      read_preset(&doc.path)?
    }
    (None, Some(b64)) => decode_pdf_base64(&b64)?,
    (None, None) => {
      return Err(GameError::InvalidAction(
        "provide a preset name or a pdfBase64 upload".into(),
      ))
    }
  };

  let text = extract_text_from_pdf(&bytes)?;
  start_round_from_text(state, session_id, &text).await
}

/// The document-independent part of round setup, starting from plain text.
pub async fn start_round_from_text(
  state: &AppState,
  session_id: &str,
  text: &str,
) -> GameResult<SessionView> {
  state.ensure_session(session_id).await;

  let chunks = chunk_text(text, state.gameplay.chunk_size);
  if chunks.is_empty() {
    return Err(GameError::ContentExtraction("no usable content in the document".into()));
  }

  // Cheap check before any network traffic: the document must actually
  // contain marked answers.
  let target = select_target(text)?;

  // Setup spans several awaits; hold the session's setup mutex the whole way
  // so a concurrent start or reset cannot leave the session pointing at a
  // namespace the index has already abandoned.
  let guard = state.round_setup_guard(session_id).await;
  let _setup = guard.lock().await;

  // Abandon whatever round was running and open a fresh namespace.
  let namespace = Uuid::new_v4().to_string();
  state.with_session(session_id, |s| s.reset()).await?;
  state.begin_round_index(session_id, &namespace).await;

  // Fail fast on embedding trouble: no half-indexed rounds.
  state.index_chunks(session_id, &namespace, &chunks).await?;

  let context = state.retrieve_context(session_id, &namespace, &target).await?;
  let clue = compose_clue(state, &target, &context).await;

  let view = state
    .with_session(session_id, |s| {
      s.start(target.clone(), clue.clone(), namespace.clone())
        .map(|_| to_view(s))
    })
    .await?
    .map_err(GameError::InvalidAction)?;

  info!(target: "game", %session_id, chunk_count = chunks.len(), "Round ready");
  Ok(view)
}

/// Generate the grounded clue, degrading to the configured fallback text when
/// generation fails or no generative service is configured. An empty context
/// still issues the request; clue quality degrades rather than the round
/// failing.
async fn compose_clue(state: &AppState, target: &str, context: &[String]) -> String {
  match &state.openai {
    Some(oa) => match oa.generate_clue(&state.prompts, target, context).await {
      Ok(clue) => clue,
      Err(e) => {
        error!(target: "game", error = %e, "Clue generation failed; using fallback clue");
        state.prompts.fallback_clue.clone()
      }
    },
    None => local_clue(target, context, &state.prompts.fallback_clue),
  }
}

/// Offline clue: quote the best-matching passage with the answer masked out.
fn local_clue(target: &str, context: &[String], fallback: &str) -> String {
  match context.first() {
    Some(chunk) => format!("From your document: {}", mask_word(chunk, target, 200)),
    None => fallback.to_string(),
  }
}

/// Case-insensitively replace `word` with underscores and truncate the
/// excerpt on a char boundary. Keeps offline hints from leaking the answer.
fn mask_word(text: &str, word: &str, max_chars: usize) -> String {
  if word.is_empty() {
    return truncate_chars(text, max_chars);
  }
  let lower_text = text.to_lowercase();
  let lower_word = word.to_lowercase();
  let mask = "_".repeat(word.chars().count());
  // Lowercasing can change byte offsets for some scripts; only walk the
  // original text when the offsets line up.
  if lower_text.len() != text.len() {
    let out = text.replace(&word.to_uppercase(), &mask).replace(&lower_word, &mask);
    return truncate_chars(&out, max_chars);
  }
  let mut out = String::with_capacity(text.len());
  let mut cursor = 0;
  while let Some(pos) = lower_text[cursor..].find(&lower_word) {
    let at = cursor + pos;
    out.push_str(&text[cursor..at]);
    out.push_str(&mask);
    cursor = at + lower_word.len();
  }
  out.push_str(&text[cursor..]);
  truncate_chars(&out, max_chars)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
  if s.chars().count() > max_chars {
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{truncated}…")
  } else {
    s.to_string()
  }
}

/// Score a guess. Rejections (wrong phase) leave the session untouched.
#[instrument(level = "info", skip(state, guess), fields(%session_id, guess_len = guess.len()))]
pub async fn submit_guess(
  state: &AppState,
  session_id: &str,
  guess: &str,
) -> GameResult<(Attempt, SessionView)> {
  let result = state
    .with_session(session_id, |s| -> Result<(Attempt, SessionView), String> {
      let attempt = s.submit_guess(guess)?.clone();
      Ok((attempt, to_view(s)))
    })
    .await?;
  let (attempt, view) = result.map_err(GameError::InvalidAction)?;
  info!(target: "game", %session_id, phase = ?view.phase, attempts = view.attempts.len(), "Guess evaluated");
  Ok((attempt, view))
}

/// Raise the hint level and return the hint text for the reached level.
/// Level 4 runs the retrieval pipeline once and caches the result.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn reveal_hint(state: &AppState, session_id: &str) -> GameResult<(u8, String)> {
  let (level, content, target, namespace, cached) = state
    .with_session(
      session_id,
      |s| -> Result<(u8, HintContent, String, String, Option<String>), String> {
        let (level, content) = s.reveal_hint()?;
        Ok((
          level,
          content,
          s.target().to_string(),
          s.round_namespace().to_string(),
          s.bonus_clue().map(str::to_string),
        ))
      },
    )
    .await?
    .map_err(GameError::InvalidAction)?;

  let text = match content {
    HintContent::FirstLetter(c) => format!("First letter: {c}"),
    HintContent::WordLength(n) => format!("Word length: {n}"),
    HintContent::LetterAt { position, letter } => format!("Letter {}: {}", position + 1, letter),
    HintContent::BonusClue => match cached {
      Some(text) => text,
      None => {
        let text = bonus_clue(state, session_id, &target, &namespace).await;
        state
          .with_session(session_id, |s| s.set_bonus_clue(text.clone()))
          .await?;
        text
      }
    },
  };
  info!(target: "game", %session_id, level, "Hint revealed");
  Ok((level, text))
}

/// Build the level-4 bonus clue via a fresh similarity lookup. Retrieval or
/// generation trouble degrades to a fallback string; the session state is
/// never affected.
async fn bonus_clue(state: &AppState, session_id: &str, target: &str, namespace: &str) -> String {
  let context = match state.retrieve_context(session_id, namespace, target).await {
    Ok(chunks) => chunks,
    Err(e) => {
      warn!(target: "game", %session_id, error = %e, "Bonus-hint retrieval failed; generating without context");
      Vec::new()
    }
  };
  compose_clue(state, target, &context).await
}

/// InProgress -> GaveUp; reveals the answer.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn give_up(state: &AppState, session_id: &str) -> GameResult<(String, SessionView)> {
  let result = state
    .with_session(session_id, |s| -> Result<(String, SessionView), String> {
      let word = s.give_up()?.to_string();
      Ok((word, to_view(s)))
    })
    .await?;
  result.map_err(GameError::InvalidAction)
}

/// Submit the score for a finished round. A ledger failure degrades to a
/// user-visible warning; it never un-finishes the round.
#[instrument(level = "info", skip(state, name), fields(%session_id))]
pub async fn submit_score(
  state: &AppState,
  session_id: &str,
  name: &str,
) -> GameResult<(SessionView, Option<String>)> {
  let name = name.trim();
  if name.is_empty() {
    return Err(GameError::InvalidAction("enter a name to save your score".into()));
  }

  let (record, view) = state
    .with_session(session_id, |s| {
      let record = s.submit_score(name);
      (record, to_view(s))
    })
    .await?;

  let record: ScoreRecord = record.ok_or_else(|| {
    GameError::InvalidAction("score can only be submitted once the round is over".into())
  })?;
  let warning = state.append_score(&record);
  info!(target: "game", %session_id, score = record.score, result = ?record.result, "Score submitted");
  Ok((view, warning))
}

/// Ranked leaderboard, best score first. An empty or missing ledger is an
/// empty board, not an error.
pub fn leaderboard(state: &AppState) -> Vec<ScoreRecord> {
  state.ledger.leaderboard()
}

/// Back to AwaitingTarget. The index moves to a fresh empty namespace so any
/// in-flight work for the abandoned round is discarded.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn reset_round(state: &AppState, session_id: &str) -> GameResult<SessionView> {
  state.ensure_session(session_id).await;
  let guard = state.round_setup_guard(session_id).await;
  let _setup = guard.lock().await;
  let view = state
    .with_session(session_id, |s| {
      s.reset();
      to_view(s)
    })
    .await?;
  state
    .begin_round_index(session_id, &Uuid::new_v4().to_string())
    .await;
  Ok(view)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{Gameplay, Prompts};
  use crate::index::SemanticIndex;
  use crate::ledger::ScoreLedger;
  use crate::session::GamePhase;
  use std::{collections::HashMap, sync::Arc};
  use tokio::sync::RwLock;

  // Offline state: no OpenAI client, temp ledger. Exercises the lexical
  // retrieval path and the stub clue.
  fn offline_state(dir: &tempfile::TempDir) -> AppState {
    let path = dir.path().join("scores.jsonl").to_string_lossy().into_owned();
    AppState {
      sessions: Arc::new(RwLock::new(HashMap::new())),
      indexes: Arc::new(RwLock::new(HashMap::<String, SemanticIndex>::new())),
      setup_locks: Arc::new(RwLock::new(HashMap::new())),
      ledger: ScoreLedger::new(path),
      openai: None,
      prompts: Prompts::default(),
      gameplay: Gameplay::default(),
      documents: Vec::new(),
    }
  }

  const DOC: &str = "The zebra grazes on the savanna at dawn. Its stripes confuse predators. \
                     Q: which striped animal is this? A: zebra\n More filler prose follows here.";

  #[tokio::test]
  async fn offline_round_starts_with_masked_local_clue() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(&dir);
    let view = start_round_from_text(&state, "s1", DOC).await.expect("round");
    assert_eq!(view.phase, GamePhase::InProgress);
    assert!(view.revealed_word.is_none());
    // The offline clue quotes the document but never the answer itself.
    assert!(!view.clue.to_lowercase().contains("zebra"), "clue leaked: {}", view.clue);
  }

  #[tokio::test]
  async fn full_round_win_and_score_flow() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(&dir);
    start_round_from_text(&state, "s1", DOC).await.expect("round");

    let (attempt, view) = submit_guess(&state, "s1", "zebra").await.expect("guess");
    assert_eq!(attempt.guess, "ZEBRA");
    assert_eq!(view.phase, GamePhase::Won);

    let (view, warning) = submit_score(&state, "s1", "ada").await.expect("score");
    assert!(view.score_submitted);
    assert!(warning.is_none());
    assert_eq!(leaderboard(&state).len(), 1);
    assert_eq!(leaderboard(&state)[0].score, 5);

    // Second submission is rejected, ledger unchanged.
    assert!(submit_score(&state, "s1", "ada").await.is_err());
    assert_eq!(leaderboard(&state).len(), 1);
  }

  #[tokio::test]
  async fn guesses_for_unknown_session_fail() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(&dir);
    assert!(matches!(
      submit_guess(&state, "ghost", "zebra").await.unwrap_err(),
      GameError::UnknownSession(_)
    ));
  }

  #[tokio::test]
  async fn document_without_answers_cannot_start() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(&dir);
    let err = start_round_from_text(&state, "s1", "Plain prose. No markers here.")
      .await
      .unwrap_err();
    assert!(matches!(err, GameError::ContentExtraction(_)));
  }

  #[tokio::test]
  async fn hint_ladder_reaches_cached_bonus_clue() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(&dir);
    start_round_from_text(&state, "s1", DOC).await.expect("round");

    let (l1, t1) = reveal_hint(&state, "s1").await.expect("hint 1");
    assert_eq!((l1, t1.as_str()), (1, "First letter: Z"));
    let (l2, t2) = reveal_hint(&state, "s1").await.expect("hint 2");
    assert_eq!((l2, t2.as_str()), (2, "Word length: 5"));
    let (l3, t3) = reveal_hint(&state, "s1").await.expect("hint 3");
    assert_eq!(l3, 3);
    assert!(t3.starts_with("Letter "));

    let (l4, bonus) = reveal_hint(&state, "s1").await.expect("hint 4");
    assert_eq!(l4, 4);
    assert!(!bonus.to_lowercase().contains("zebra"), "bonus leaked: {bonus}");
    // Capped: a fifth reveal repeats the cached bonus clue.
    let (l5, again) = reveal_hint(&state, "s1").await.expect("hint 5");
    assert_eq!(l5, 4);
    assert_eq!(again, bonus);
  }

  #[tokio::test]
  async fn give_up_reveals_word_and_restart_gets_fresh_round() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(&dir);
    start_round_from_text(&state, "s1", DOC).await.expect("round");

    let (word, view) = give_up(&state, "s1").await.expect("give up");
    assert_eq!(word, "ZEBRA");
    assert_eq!(view.phase, GamePhase::GaveUp);
    assert!(give_up(&state, "s1").await.is_err());

    // Starting over from a terminal phase works and yields a fresh round.
    let view = start_round_from_text(&state, "s1", DOC).await.expect("restart");
    assert_eq!(view.phase, GamePhase::InProgress);
    assert!(view.attempts.is_empty());
  }

  #[tokio::test]
  async fn racing_round_starts_leave_namespace_and_index_in_agreement() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(&dir);

    // Both starts run to completion; whichever finishes last must leave the
    // session's namespace as the one the index actually serves.
    let (a, b) = tokio::join!(
      start_round_from_text(&state, "s1", DOC),
      start_round_from_text(&state, "s1", DOC),
    );
    a.expect("first start");
    b.expect("second start");

    let session = state.get_session("s1").await.expect("session");
    let context = state
      .retrieve_context("s1", session.round_namespace(), session.target())
      .await
      .expect("retrieval");
    assert!(!context.is_empty(), "session left pointing at a stale namespace");
  }

  #[tokio::test]
  async fn reset_racing_a_start_never_strands_the_round() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(&dir);
    start_round_from_text(&state, "s1", DOC).await.expect("round");

    let (restart, _reset) = tokio::join!(
      start_round_from_text(&state, "s1", DOC),
      reset_round(&state, "s1"),
    );

    // Whichever order the two land in, a round that reports InProgress must
    // still be able to retrieve its own context.
    if restart.is_ok() {
      let session = state.get_session("s1").await.expect("session");
      if session.phase() == GamePhase::InProgress {
        let context = state
          .retrieve_context("s1", session.round_namespace(), session.target())
          .await
          .expect("retrieval");
        assert!(!context.is_empty(), "in-progress round cannot see its chunks");
      }
    }
  }

  #[tokio::test]
  async fn reset_returns_session_to_awaiting_target() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(&dir);
    start_round_from_text(&state, "s1", DOC).await.expect("round");
    let view = reset_round(&state, "s1").await.expect("reset");
    assert_eq!(view.phase, GamePhase::AwaitingTarget);
    assert!(submit_guess(&state, "s1", "zebra").await.is_err());
  }

  #[test]
  fn mask_word_hides_every_occurrence_case_insensitively() {
    let masked = mask_word("Zebra stripes; the ZEBRA runs.", "zebra", 200);
    assert_eq!(masked, "_____ stripes; the _____ runs.");
  }
}
