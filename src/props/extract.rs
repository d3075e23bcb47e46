// Field extraction and validation of untrusted prop candidates.
//
// AI suggestions and provider payloads arrive with no schema guarantees:
// fields may be absent, misspelled, or strings where numbers are expected.
// `validate_candidate` is a total function from that mess to
// `Option<NormalizedProp>` — a malformed candidate is dropped silently and
// never fails the batch.

use serde::Deserialize;
use serde_json::Value;

use crate::props::line::normalize_line;
use crate::props::{NormalizedProp, Side, StatLabel};

/// Fallback reason shown when the upstream payload carries none.
pub const REASON_FALLBACK: &str =
    "Ranks near the top of today's available prop market data.";

/// Player-name sentinels that mark an upstream extraction failure rather
/// than a real player.
const INVALID_PLAYER_SENTINELS: [&str; 5] = ["unknown player", "over", "under", "yes", "no"];

// ---------------------------------------------------------------------------
// RawPropCandidate
// ---------------------------------------------------------------------------

/// One untrusted prop candidate as received from an AI suggestion or odds
/// payload. Every field is optional; `line` and `confidence` keep their raw
/// JSON value because upstream flips between strings and numbers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPropCandidate {
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default, alias = "stat")]
    pub stat_label: Option<String>,
    #[serde(default)]
    pub line: Option<Value>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub implied_probability: Option<Value>,
    #[serde(default)]
    pub matchup: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate one candidate into a `NormalizedProp`, or reject it.
///
/// `index` is the candidate's position in the incoming batch; it keeps
/// derived ids unique when the same market shows up twice before dedup.
/// Pure function; rejection is signalled by `None`, never by an error.
pub fn validate_candidate(candidate: &RawPropCandidate, index: usize) -> Option<NormalizedProp> {
    let player = candidate.player.as_deref().map(str::trim).unwrap_or("");
    if is_invalid_player_name(player) {
        return None;
    }

    let side = Side::from_text(candidate.side.as_deref()?)?;
    let stat = StatLabel::from_text(candidate.stat_label.as_deref()?)?;

    let line = normalize_line(&value_to_text(candidate.line.as_ref()?)?)?;
    if line == "0.0" {
        // A zero line is meaningless; treat it like a failed parse.
        return None;
    }

    let confidence = candidate
        .confidence
        .as_ref()
        .and_then(parse_probability)
        .map(|c| c.clamp(0.0, 1.0));

    let reason = candidate
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(REASON_FALLBACK)
        .to_string();

    Some(NormalizedProp {
        id: format!("{player}-{stat}-{line}-{index}"),
        player: player.to_string(),
        stat,
        line,
        side,
        confidence,
        matchup: candidate.matchup.clone().filter(|m| !m.trim().is_empty()),
        reason,
    })
}

/// A player name is invalid when it is empty, one of the known sentinel
/// strings, or carries the "scrambled" upstream-failure marker.
fn is_invalid_player_name(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    let normalized = value.trim().to_lowercase();
    INVALID_PLAYER_SENTINELS.contains(&normalized.as_str()) || normalized.contains("scrambled")
}

/// Render a JSON value as the text the line parser should see.
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a probability from a JSON number or numeric string.
fn parse_probability(value: &Value) -> Option<f64> {
    let num = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    num.is_finite().then_some(num)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
