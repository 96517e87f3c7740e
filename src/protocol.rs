//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Attempt, ScoreRecord};
use crate::session::{GamePhase, GameSession};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartRound {
        #[serde(rename = "sessionId")]
        session_id: String,
        /// Name of a preset document configured on the server...
        #[serde(default)]
        preset: Option<String>,
        /// ...or a base64-encoded PDF upload. Exactly one should be set.
        #[serde(default, rename = "pdfBase64")]
        pdf_base64: Option<String>,
    },
    SubmitGuess {
        #[serde(rename = "sessionId")]
        session_id: String,
        guess: String,
    },
    RevealHint {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    GiveUp {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    SubmitScore {
        #[serde(rename = "sessionId")]
        session_id: String,
        name: String,
    },
    Leaderboard,
    ResetRound {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Round {
        session: SessionView,
    },
    GuessResult {
        attempt: Attempt,
        session: SessionView,
    },
    Hint {
        level: u8,
        text: String,
    },
    GaveUp {
        word: String,
        session: SessionView,
    },
    ScoreSaved {
        session: SessionView,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    Leaderboard {
        records: Vec<ScoreRecord>,
    },
    Error {
        message: String,
    },
}

/// Client-facing snapshot of a session. The target word is only included once
/// the round is over; nothing here can leak it mid-round.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub phase: GamePhase,
    pub clue: String,
    pub attempts: Vec<Attempt>,
    #[serde(rename = "hintLevel")]
    pub hint_level: u8,
    #[serde(rename = "word", skip_serializing_if = "Option::is_none")]
    pub revealed_word: Option<String>,
    #[serde(rename = "scoreSubmitted")]
    pub score_submitted: bool,
}

/// Convert the internal `GameSession` to the public DTO.
pub fn to_view(s: &GameSession) -> SessionView {
    SessionView {
        session_id: s.id.clone(),
        phase: s.phase(),
        clue: s.clue().to_string(),
        attempts: s.attempts().to_vec(),
        hint_level: s.hint_level(),
        revealed_word: s.revealed_target().map(str::to_string),
        score_submitted: s.score_submitted(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartRoundIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default, rename = "pdfBase64")]
    pub pdf_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuessIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub guess: String,
}
#[derive(Serialize)]
pub struct GuessOut {
    pub attempt: Attempt,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct SessionIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Serialize)]
pub struct HintOut {
    pub level: u8,
    pub text: String,
}

#[derive(Serialize)]
pub struct GiveUpOut {
    pub word: String,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct ScoreIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub name: String,
}
#[derive(Serialize)]
pub struct ScoreOut {
    pub session: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Serialize)]
pub struct LeaderboardOut {
    pub records: Vec<ScoreRecord>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
