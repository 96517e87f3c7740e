//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::error::GameError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

/// Map the error taxonomy onto HTTP statuses.
fn error_response(e: GameError) -> (StatusCode, Json<ErrorOut>) {
  let status = match &e {
    GameError::ContentExtraction(_) | GameError::InvalidAction(_) => StatusCode::UNPROCESSABLE_ENTITY,
    GameError::UnknownSession(_) => StatusCode::NOT_FOUND,
    GameError::IndexUnavailable(_) | GameError::Generation(_) => StatusCode::BAD_GATEWAY,
    GameError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
  };
  (status, Json(ErrorOut { message: e.to_string() }))
}

type HttpResult<T> = Result<Json<T>, (StatusCode, Json<ErrorOut>)>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// Names of the preset documents a round can start from.
#[instrument(level = "info", skip(state))]
pub async fn http_get_documents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let names: Vec<String> = state.documents.iter().map(|d| d.name.clone()).collect();
  Json(names)
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, has_upload = body.pdf_base64.is_some()))]
pub async fn http_post_start_round(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartRoundIn>,
) -> HttpResult<SessionView> {
  let view = start_round(&state, &body.session_id, body.preset, body.pdf_base64)
    .await
    .map_err(error_response)?;
  info!(target: "game", session = %body.session_id, "HTTP round started");
  Ok(Json(view))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, guess_len = body.guess.len()))]
pub async fn http_post_guess(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GuessIn>,
) -> HttpResult<GuessOut> {
  let (attempt, session) = submit_guess(&state, &body.session_id, &body.guess)
    .await
    .map_err(error_response)?;
  Ok(Json(GuessOut { attempt, session }))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_hint(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> HttpResult<HintOut> {
  let (level, text) = reveal_hint(&state, &body.session_id)
    .await
    .map_err(error_response)?;
  Ok(Json(HintOut { level, text }))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_give_up(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> HttpResult<GiveUpOut> {
  let (word, session) = give_up(&state, &body.session_id)
    .await
    .map_err(error_response)?;
  Ok(Json(GiveUpOut { word, session }))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_score(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ScoreIn>,
) -> HttpResult<ScoreOut> {
  let (session, warning) = submit_score(&state, &body.session_id, &body.name)
    .await
    .map_err(error_response)?;
  Ok(Json(ScoreOut { session, warning }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(LeaderboardOut { records: leaderboard(&state) })
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_reset(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> HttpResult<SessionView> {
  let view = reset_round(&state, &body.session_id)
    .await
    .map_err(error_response)?;
  Ok(Json(view))
}
