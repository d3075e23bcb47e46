// Gemini-backed AI surface: daily prop suggestions, parlay slip extraction,
// and grounded parlay prediction.

pub mod client;
pub mod prompt;
pub mod response;

use thiserror::Error;

pub use client::{AiClient, GeminiClient};
pub use response::{ParlayLeg, ParlayOutcome, ParlayPrediction, SlipExtraction, WebSource};

/// Errors from the AI surface.
///
/// Display strings matter here: the daily pipeline classifies failures by
/// message content, so status codes and the words "not JSON" must survive
/// into the rendered error.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI features are disabled: no API key configured")]
    Disabled,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("reply was not JSON: {detail}")]
    NotJson { detail: String },

    #[error("reply contained no text content")]
    EmptyReply,

    #[error("request timed out after {0} seconds")]
    Timeout(u64),
}
