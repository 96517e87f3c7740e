//! Document ingestion: PDF bytes in, plain text out.
//!
//! Uploads arrive as base64 over JSON (same transport the API uses for any
//! binary payload); preset documents are read from disk. Either way the bytes
//! must parse as a PDF — corrupt or non-PDF input is a fatal
//! `ContentExtraction` error for the round, never silently swallowed.

use base64::Engine;
use tracing::{info, instrument};

use crate::error::{GameError, GameResult};

/// Extract the full plain text of a PDF held in memory.
#[instrument(level = "info", skip(bytes), fields(byte_len = bytes.len()))]
pub fn extract_text_from_pdf(bytes: &[u8]) -> GameResult<String> {
  let text = pdf_extract::extract_text_from_mem(bytes)
    .map_err(|e| GameError::ContentExtraction(format!("failed to read PDF: {e}")))?;
  if text.trim().is_empty() {
    return Err(GameError::ContentExtraction("PDF contains no extractable text".into()));
  }
  info!(target: "game", text_len = text.len(), "PDF text extracted");
  Ok(text)
}

/// Decode a base64-encoded PDF upload.
pub fn decode_pdf_base64(data: &str) -> GameResult<Vec<u8>> {
  base64::engine::general_purpose::STANDARD
    .decode(data.trim())
    .map_err(|e| GameError::ContentExtraction(format!("invalid base64 upload: {e}")))
}

/// Read a preset document from disk.
pub fn read_preset(path: &str) -> GameResult<Vec<u8>> {
  std::fs::read(path)
    .map_err(|e| GameError::ContentExtraction(format!("cannot read preset document {path}: {e}")))
}
