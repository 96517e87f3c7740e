//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "wordl_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "wordl_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target = "wordl_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "wordl_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "wordl_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state, msg))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartRound { session_id, preset, pdf_base64 } => {
      match start_round(state, &session_id, preset, pdf_base64).await {
        Ok(session) => {
          tracing::info!(target: "game", %session_id, "WS round started");
          ServerWsMessage::Round { session }
        }
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::SubmitGuess { session_id, guess } => {
      match submit_guess(state, &session_id, &guess).await {
        Ok((attempt, session)) => ServerWsMessage::GuessResult { attempt, session },
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::RevealHint { session_id } => {
      match reveal_hint(state, &session_id).await {
        Ok((level, text)) => ServerWsMessage::Hint { level, text },
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::GiveUp { session_id } => {
      match give_up(state, &session_id).await {
        Ok((word, session)) => ServerWsMessage::GaveUp { word, session },
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::SubmitScore { session_id, name } => {
      match submit_score(state, &session_id, &name).await {
        Ok((session, warning)) => ServerWsMessage::ScoreSaved { session, warning },
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::Leaderboard =>
      ServerWsMessage::Leaderboard { records: leaderboard(state) },

    ClientWsMessage::ResetRound { session_id } => {
      match reset_round(state, &session_id).await {
        Ok(session) => ServerWsMessage::Round { session },
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }
  }
}
