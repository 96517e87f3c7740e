//! Loading game configuration (prompts + gameplay knobs + preset documents)
//! from TOML.
//!
//! See `GameConfig` and `Prompts` for the expected schema.

use serde::Deserialize;
use tracing::{info, error};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GameConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub gameplay: Gameplay,
  #[serde(default)]
  pub documents: Vec<PresetDocument>,
}

/// A bundled trivia PDF the player can start a round from without uploading.
#[derive(Clone, Debug, Deserialize)]
pub struct PresetDocument {
  pub name: String,
  pub path: String,
}

/// Gameplay knobs. Defaults match the classic rules (5 letters, 6 guesses).
#[derive(Clone, Debug, Deserialize)]
pub struct Gameplay {
  #[serde(default = "default_chunk_size")]
  pub chunk_size: usize,
}

fn default_chunk_size() -> usize { 300 }

impl Default for Gameplay {
  fn default() -> Self {
    Self { chunk_size: default_chunk_size() }
  }
}

/// Prompts used by the OpenAI client. Defaults produce grounded trivia clues.
/// You can override them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  /// System prompt for clue generation. Must insist on document-only facts.
  pub clue_system: String,
  /// User template for clue generation; `{context}` and `{word}` are filled in.
  pub clue_user_template: String,
  /// Shown when clue generation fails or no generative service is configured.
  pub fallback_clue: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      clue_system: "You are a trivia game master. Your job is to write a single, clever, trivia-style clue for a word, using ONLY the text below. Only use facts and context from this document. Do not add outside information.".into(),
      clue_user_template: "Document Excerpt:\n\"\"\"\n{context}\n\"\"\"\n\nTarget Word: {word}\n\nWrite a trivia clue (1-2 sentences), grounded only in the document text:".into(),
      fallback_clue: "No generated clue available. The word is hidden somewhere in your document — use the hints!".into(),
    }
  }
}

/// Attempt to load `GameConfig` from GAME_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_game_config_from_env() -> Option<GameConfig> {
  let path = std::env::var("GAME_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<GameConfig>(&s) {
      Ok(cfg) => {
        info!(target: "wordl_backend", %path, "Loaded game config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "wordl_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "wordl_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
