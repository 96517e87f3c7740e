//! Application state: per-session game map, per-session semantic indexes,
//! the score ledger, prompts, and the optional OpenAI client.
//!
//! This module owns:
//!   - the session store (one `GameSession` value object per player)
//!   - one `SemanticIndex` per session, namespaced by round
//!   - the embedding/retrieval glue between OpenAI and the index
//!
//! Sessions for different players are fully independent; the only shared
//! mutable resource is the append-only score ledger (which carries its own
//! write lock). Every mutation goes through the write lock of the relevant
//! map, and multi-step round setup holds a per-session mutex on top, so two
//! concurrent actions on the same session serialize.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

use crate::config::{load_game_config_from_env, Gameplay, PresetDocument, Prompts};
use crate::domain::{Chunk, CLUE_TOP_K};
use crate::error::{GameError, GameResult};
use crate::index::SemanticIndex;
use crate::ledger::ScoreLedger;
use crate::openai::OpenAI;
use crate::session::GameSession;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, GameSession>>>,
    pub indexes: Arc<RwLock<HashMap<String, SemanticIndex>>>,
    /// One mutex per session, held across multi-step round setup so two
    /// concurrent starts (or a start racing a reset) cannot interleave and
    /// leave the session pointing at a namespace the index no longer serves.
    pub setup_locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
    pub ledger: ScoreLedger,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
    pub gameplay: Gameplay,
    pub documents: Vec<PresetDocument>,
}

impl AppState {
    /// Build state from env: load config, init the ledger, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_game_config_from_env().unwrap_or_default();
        info!(target: "wordl_backend",
              chunk_size = cfg.gameplay.chunk_size,
              preset_documents = cfg.documents.len(),
              "Game config loaded");

        let ledger = ScoreLedger::from_env();

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "wordl_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, embed_model = %oa.embed_model, "OpenAI enabled.");
        } else {
            info!(target: "wordl_backend", "OpenAI disabled (no OPENAI_API_KEY). Using lexical retrieval and stub clues.");
        }

        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            indexes: Arc::new(RwLock::new(HashMap::new())),
            setup_locks: Arc::new(RwLock::new(HashMap::new())),
            ledger,
            openai,
            prompts: cfg.prompts,
            gameplay: cfg.gameplay,
            documents: cfg.documents,
        }
    }

    /// Make sure a session exists (fresh AwaitingTarget on first use).
    #[instrument(level = "debug", skip(self), fields(%session_id))]
    pub async fn ensure_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| GameSession::new(session_id.to_string()));
    }

    /// Handle to the session's setup mutex. Callers lock it for the duration
    /// of any sequence that must observe a stable round namespace (round
    /// start, reset). Lock order: setup mutex first, then sessions/indexes.
    pub async fn round_setup_guard(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.setup_locks.write().await;
        locks.entry(session_id.to_string()).or_default().clone()
    }

    /// Run a closure against a session under the write lock. All state
    /// transitions go through here, which is what serializes concurrent
    /// actions on the same session.
    pub async fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut GameSession) -> T,
    ) -> GameResult<T> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| GameError::UnknownSession(session_id.to_string()))?;
        Ok(f(session))
    }

    /// Read-only snapshot of a session (for views).
    pub async fn get_session(&self, session_id: &str) -> GameResult<GameSession> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| GameError::UnknownSession(session_id.to_string()))
    }

    /// Open a fresh round namespace for this session's index, dropping
    /// whatever the previous round had stored.
    pub async fn begin_round_index(&self, session_id: &str, namespace: &str) {
        let mut indexes = self.indexes.write().await;
        indexes
            .entry(session_id.to_string())
            .or_insert_with(SemanticIndex::new)
            .begin_round(namespace.to_string());
    }

    /// Embed and store every chunk for the round. With OpenAI configured, an
    /// embedding failure aborts the round (fail fast, no half-indexed rounds);
    /// without it, chunks are stored vectorless for lexical fallback lookup.
    ///
    /// Indexing completes before `retrieve_context` is ever called for this
    /// namespace: round start awaits this method.
    #[instrument(level = "info", skip(self, chunks), fields(%session_id, %namespace, chunk_count = chunks.len()))]
    pub async fn index_chunks(
        &self,
        session_id: &str,
        namespace: &str,
        chunks: &[Chunk],
    ) -> GameResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(chunks.len());
        if let Some(oa) = &self.openai {
            // Network calls happen outside the index lock.
            for chunk in chunks {
                vectors.push(Some(oa.embed(&chunk.text).await?));
            }
        } else {
            vectors.resize(chunks.len(), None);
        }

        let mut indexes = self.indexes.write().await;
        let index = indexes
            .entry(session_id.to_string())
            .or_insert_with(SemanticIndex::new);
        let mut stored = 0usize;
        for (chunk, vector) in chunks.iter().zip(vectors) {
            if index.upsert(namespace, chunk.clone(), vector) {
                stored += 1;
            }
        }
        if stored == 0 {
            // The round was abandoned while we were embedding.
            warn!(target: "game", %session_id, %namespace, "No chunks stored; round namespace went stale during indexing");
        } else {
            info!(target: "game", %session_id, %namespace, stored, "Chunks indexed");
        }
        Ok(())
    }

    /// Top-K chunks for grounding a clue about `text` (normally the target
    /// word). Vector search when OpenAI is available, lexical overlap
    /// otherwise. A stale namespace yields an empty context.
    #[instrument(level = "info", skip(self, text), fields(%session_id, %namespace))]
    pub async fn retrieve_context(
        &self,
        session_id: &str,
        namespace: &str,
        text: &str,
    ) -> GameResult<Vec<String>> {
        if text.trim().is_empty() {
            return Err(GameError::IndexUnavailable("cannot query with empty text".into()));
        }

        let vector = match &self.openai {
            Some(oa) => Some(oa.embed(text).await?),
            None => None,
        };

        let indexes = self.indexes.read().await;
        let Some(index) = indexes.get(session_id) else {
            return Ok(Vec::new());
        };
        let chunks = match vector {
            Some(v) => index.query_vector(namespace, &v, CLUE_TOP_K),
            None => index.query_lexical(namespace, text, CLUE_TOP_K),
        };
        Ok(chunks.into_iter().map(|c| c.text).collect())
    }

    /// Append a score, degrading to a logged warning on ledger failure.
    /// Persistence problems never break gameplay.
    pub fn append_score(&self, record: &crate::domain::ScoreRecord) -> Option<String> {
        match self.ledger.append(record) {
            Ok(()) => None,
            Err(e) => {
                error!(target: "game", error = %e, "Score ledger write failed; score not persisted");
                Some(format!("score could not be saved: {e}"))
            }
        }
    }
}
