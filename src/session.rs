//! Per-player game session: the round state machine.
//!
//! A `GameSession` is an explicit value object owned by the state map, one per
//! connected player. All transitions happen through methods that reject
//! out-of-phase actions, so the invariants hold no matter what order the
//! HTTP/WS handlers fire in:
//!   - attempts never exceed `MAX_ATTEMPTS`
//!   - terminal phases reject further guesses
//!   - hint level only ever climbs, capped at 4
//!   - a score is submitted at most once, and only from a terminal phase

use rand::Rng;
use serde::Serialize;

use crate::domain::{Attempt, RoundOutcome, ScoreRecord, MAX_ATTEMPTS};
use crate::evaluator::evaluate;
use crate::util::normalize_guess;

/// Lifecycle phase of a round.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// No target chosen yet (fresh session, or after reset).
    AwaitingTarget,
    /// Accepting guesses.
    InProgress,
    Won,
    Lost,
    GaveUp,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost | GamePhase::GaveUp)
    }
}

/// What a hint reveal produced. `BonusClue` is resolved by the caller through
/// the retrieval pipeline; everything else is derived from the target locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HintContent {
    FirstLetter(char),
    WordLength(usize),
    LetterAt { position: usize, letter: char },
    BonusClue,
}

#[derive(Clone, Debug)]
pub struct GameSession {
    pub id: String,
    phase: GamePhase,
    target: String,
    clue: String,
    /// Namespace of the round's chunks in the semantic index.
    round_ns: String,
    attempts: Vec<Attempt>,
    hint_level: u8,
    revealed_answer: bool,
    score_submitted: bool,
    bonus_clue: Option<String>,
}

impl GameSession {
    pub fn new(id: String) -> Self {
        Self {
            id,
            phase: GamePhase::AwaitingTarget,
            target: String::new(),
            clue: String::new(),
            round_ns: String::new(),
            attempts: Vec::new(),
            hint_level: 0,
            revealed_answer: false,
            score_submitted: false,
            bonus_clue: None,
        }
    }

    // -- accessors used by the protocol layer --

    pub fn phase(&self) -> GamePhase { self.phase }
    pub fn clue(&self) -> &str { &self.clue }
    pub fn attempts(&self) -> &[Attempt] { &self.attempts }
    pub fn hint_level(&self) -> u8 { self.hint_level }
    pub fn round_namespace(&self) -> &str { &self.round_ns }
    pub fn score_submitted(&self) -> bool { self.score_submitted }

    /// The target word, disclosed only once the round is over.
    pub fn revealed_target(&self) -> Option<&str> {
        if self.phase.is_terminal() { Some(&self.target) } else { None }
    }

    /// The target word regardless of phase. For internal use (hints, bonus
    /// clue retrieval); never serialized to the client mid-round.
    pub fn target(&self) -> &str { &self.target }

    // -- transitions --

    /// AwaitingTarget -> InProgress. Clears all round-scoped state.
    pub fn start(&mut self, target: String, clue: String, round_ns: String) -> Result<(), String> {
        if self.phase != GamePhase::AwaitingTarget {
            return Err("round already in progress; reset first".into());
        }
        self.target = target;
        self.clue = clue;
        self.round_ns = round_ns;
        self.attempts.clear();
        self.hint_level = 0;
        self.revealed_answer = false;
        self.score_submitted = false;
        self.bonus_clue = None;
        self.phase = GamePhase::InProgress;
        Ok(())
    }

    /// Score a guess and advance the state machine. Rejected outside
    /// InProgress; the session is left untouched in that case.
    pub fn submit_guess(&mut self, guess: &str) -> Result<&Attempt, String> {
        if self.phase != GamePhase::InProgress {
            return Err("round is not accepting guesses".into());
        }
        let guess = normalize_guess(guess);
        let feedback = evaluate(&guess, &self.target);
        let won = guess == self.target;
        self.attempts.push(Attempt { guess, feedback });

        if won {
            self.phase = GamePhase::Won;
        } else if self.attempts.len() >= MAX_ATTEMPTS {
            self.phase = GamePhase::Lost;
        }
        Ok(self.attempts.last().expect("just pushed"))
    }

    /// InProgress -> GaveUp; the answer is revealed to the player.
    pub fn give_up(&mut self) -> Result<&str, String> {
        if self.phase != GamePhase::InProgress {
            return Err("round is not in progress".into());
        }
        self.revealed_answer = true;
        self.phase = GamePhase::GaveUp;
        Ok(&self.target)
    }

    /// Raise the hint level (capped at 4) and describe what to reveal.
    /// Once at the cap, repeated calls keep returning `BonusClue` so the UI
    /// can re-display the cached text.
    pub fn reveal_hint(&mut self) -> Result<(u8, HintContent), String> {
        if self.phase == GamePhase::AwaitingTarget {
            return Err("no round in progress".into());
        }
        if self.hint_level < 4 {
            self.hint_level += 1;
        }
        let len = self.target.chars().count();
        let content = match self.hint_level {
            1 => HintContent::FirstLetter(self.target.chars().next().unwrap_or('?')),
            2 => HintContent::WordLength(len),
            3 => {
                // Any position but the first; the first letter was hint 1.
                let position = rand::thread_rng().gen_range(1..len.max(2));
                let letter = self.target.chars().nth(position).unwrap_or('?');
                HintContent::LetterAt { position, letter }
            }
            _ => HintContent::BonusClue,
        };
        Ok((self.hint_level, content))
    }

    /// Cache the generated bonus clue so hint level 4 is produced once.
    pub fn bonus_clue(&self) -> Option<&str> {
        self.bonus_clue.as_deref()
    }

    pub fn set_bonus_clue(&mut self, text: String) {
        self.bonus_clue = Some(text);
    }

    /// Build the ledger record for this round. Only valid from a terminal
    /// phase and only once; later calls return None (idempotent no-op).
    pub fn submit_score(&mut self, name: &str) -> Option<ScoreRecord> {
        if !self.phase.is_terminal() || self.score_submitted {
            return None;
        }
        self.score_submitted = true;
        Some(ScoreRecord {
            name: name.to_string(),
            score: (MAX_ATTEMPTS - self.attempts.len()) as i64,
            word: self.target.clone(),
            result: if self.revealed_answer { RoundOutcome::Pass } else { RoundOutcome::Win },
        })
    }

    /// Back to AwaitingTarget, dropping every piece of round-scoped state.
    pub fn reset(&mut self) {
        let id = std::mem::take(&mut self.id);
        *self = GameSession::new(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LetterMark::Exact;

    fn started() -> GameSession {
        let mut s = GameSession::new("s1".into());
        s.start("ZEBRA".into(), "A striped clue".into(), "round-1".into())
            .expect("start");
        s
    }

    #[test]
    fn start_is_only_valid_from_awaiting_target() {
        let mut s = started();
        assert!(s.start("OTHER".into(), String::new(), String::new()).is_err());
        s.reset();
        assert!(s.start("OTHER".into(), String::new(), String::new()).is_ok());
    }

    #[test]
    fn winning_guess_terminates_with_all_exact_feedback() {
        let mut s = started();
        let attempt = s.submit_guess("zebra").expect("guess").clone();
        assert_eq!(attempt.feedback, vec![Exact; 5]);
        assert_eq!(s.phase(), GamePhase::Won);
        assert_eq!(s.revealed_target(), Some("ZEBRA"));
    }

    #[test]
    fn six_wrong_guesses_lose_and_block_further_guesses() {
        let mut s = started();
        for _ in 0..MAX_ATTEMPTS {
            s.submit_guess("WRONG").expect("in progress");
        }
        assert_eq!(s.phase(), GamePhase::Lost);
        assert_eq!(s.attempts().len(), MAX_ATTEMPTS);

        let before = s.attempts().len();
        assert!(s.submit_guess("ZEBRA").is_err());
        assert_eq!(s.attempts().len(), before);
        assert_eq!(s.phase(), GamePhase::Lost);
    }

    #[test]
    fn guess_after_win_is_rejected_without_state_change() {
        let mut s = started();
        s.submit_guess("ZEBRA").expect("win");
        assert!(s.submit_guess("ZEBRA").is_err());
        assert_eq!(s.attempts().len(), 1);
    }

    #[test]
    fn give_up_reveals_answer_and_scores_as_pass() {
        let mut s = started();
        s.submit_guess("WRONG").expect("guess");
        let word = s.give_up().expect("give up").to_string();
        assert_eq!(word, "ZEBRA");
        assert_eq!(s.phase(), GamePhase::GaveUp);

        let record = s.submit_score("ada").expect("first submission");
        assert_eq!(record.result, RoundOutcome::Pass);
        assert_eq!(record.score, (MAX_ATTEMPTS - 1) as i64);
        assert_eq!(record.word, "ZEBRA");
    }

    #[test]
    fn hint_level_never_exceeds_four() {
        let mut s = started();
        for _ in 0..10 {
            let (level, _) = s.reveal_hint().expect("hint");
            assert!(level <= 4);
        }
        assert_eq!(s.hint_level(), 4);
    }

    #[test]
    fn hint_sequence_matches_levels() {
        let mut s = started();
        assert_eq!(s.reveal_hint().unwrap(), (1, HintContent::FirstLetter('Z')));
        assert_eq!(s.reveal_hint().unwrap(), (2, HintContent::WordLength(5)));
        match s.reveal_hint().unwrap() {
            (3, HintContent::LetterAt { position, letter }) => {
                assert!((1..5).contains(&position));
                assert_eq!(letter, "ZEBRA".chars().nth(position).unwrap());
            }
            other => panic!("unexpected hint: {other:?}"),
        }
        assert_eq!(s.reveal_hint().unwrap(), (4, HintContent::BonusClue));
        // At the cap the reveal keeps pointing at the bonus clue.
        assert_eq!(s.reveal_hint().unwrap(), (4, HintContent::BonusClue));
    }

    #[test]
    fn score_submission_requires_terminal_phase_and_is_once_only() {
        let mut s = started();
        assert!(s.submit_score("ada").is_none());

        s.submit_guess("ZEBRA").expect("win");
        let record = s.submit_score("ada").expect("first submission");
        assert_eq!(record.result, RoundOutcome::Win);
        assert_eq!(record.score, (MAX_ATTEMPTS - 1) as i64);
        assert!(s.submit_score("ada").is_none());
        assert!(s.score_submitted());
    }

    #[test]
    fn reset_returns_to_awaiting_target_and_clears_history() {
        let mut s = started();
        s.submit_guess("WRONG").expect("guess");
        s.reveal_hint().expect("hint");
        s.reset();
        assert_eq!(s.phase(), GamePhase::AwaitingTarget);
        assert!(s.attempts().is_empty());
        assert_eq!(s.hint_level(), 0);
        assert_eq!(s.id, "s1");
        assert!(s.revealed_target().is_none());
    }

    #[test]
    fn hints_are_rejected_before_a_round_starts() {
        let mut s = GameSession::new("s2".into());
        assert!(s.reveal_hint().is_err());
    }
}
