// Parsing of Gemini response payloads into typed results.
//
// The model is asked for bare JSON but in practice replies arrive in three
// shapes: clean JSON, JSON wrapped in a markdown code fence, or prose that
// contains no JSON at all. Everything here tolerates the first two and
// reports the third as a "not JSON" error.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::ai::AiError;
use crate::props::extract::RawPropCandidate;

// ---------------------------------------------------------------------------
// Gemini envelope
// ---------------------------------------------------------------------------

/// Concatenated text of the first candidate's content parts.
///
/// Expected shape:
/// `{ "candidates": [ { "content": { "parts": [ { "text": "..." } ] } } ] }`
pub(crate) fn response_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let mut text = String::new();
    for part in parts {
        if let Some(t) = part.get("text").and_then(Value::as_str) {
            text.push_str(t);
        }
    }
    (!text.is_empty()).then_some(text)
}

/// Web sources the model grounded its answer on, if any.
///
/// Walks `candidates[0].groundingMetadata.groundingChunks`, keeping only
/// chunks with both a `web.uri` and a `web.title`.
pub(crate) fn grounding_sources(body: &Value) -> Vec<WebSource> {
    let Some(chunks) = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("groundingMetadata"))
        .and_then(|m| m.get("groundingChunks"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.get("web")?;
            let uri = web.get("uri")?.as_str()?;
            let title = web.get("title")?.as_str()?;
            Some(WebSource {
                uri: uri.to_string(),
                title: title.to_string(),
            })
        })
        .collect()
}

/// One web source from the model's grounding metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSource {
    pub uri: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// Code fence stripping
// ---------------------------------------------------------------------------

/// Strip a surrounding ```json markdown fence, when the whole reply is one
/// fenced block. Anything else passes through trimmed but untouched.
pub fn strip_code_fence(text: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```(\w*)?\s*\n?(.*?)\n?\s*```$").expect("fence regex is valid")
    });

    let trimmed = text.trim();
    match fence.captures(trimmed).and_then(|c| c.get(2)) {
        Some(inner) => inner.as_str().trim().to_string(),
        None => trimmed.to_string(),
    }
}

fn parse_json(text: &str) -> Result<Value, AiError> {
    let cleaned = strip_code_fence(text);
    serde_json::from_str(&cleaned).map_err(|e| AiError::NotJson {
        detail: format!("{e}; reply started with: {}", truncate(&cleaned, 200)),
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Daily prop suggestions
// ---------------------------------------------------------------------------

/// Parse a daily-suggestions reply into raw candidates.
///
/// Accepts either `{ "props": [...] }` or a bare top-level array. Candidates
/// that fail to deserialize individually are skipped rather than failing the
/// batch; only a reply with no recognizable array is an error.
pub fn parse_prop_candidates(text: &str) -> Result<Vec<RawPropCandidate>, AiError> {
    let value = parse_json(text)?;

    let array = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("props").and_then(Value::as_array) {
            Some(items) => items.as_slice(),
            None => {
                return Err(AiError::NotJson {
                    detail: "reply JSON has no `props` array".to_string(),
                })
            }
        },
        _ => {
            return Err(AiError::NotJson {
                detail: "reply JSON is neither an array nor an object".to_string(),
            })
        }
    };

    Ok(array
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect())
}

// ---------------------------------------------------------------------------
// Parlay slip extraction
// ---------------------------------------------------------------------------

/// One leg extracted from a parlay slip image, with placeholders filled in
/// for anything the model could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParlayLeg {
    pub id: String,
    pub player_team: String,
    pub stat: String,
    pub condition: String,
    pub value: String,
    /// True when the condition is an Over/Under the user may flip.
    pub is_editable_over_under: bool,
}

/// Outcome of extracting legs from a slip image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlipExtraction {
    /// The model's verbatim reply, kept for display and debugging.
    pub raw_output: String,
    pub legs: Vec<ParlayLeg>,
    /// Set when the model reported a problem or no legs were identified.
    pub error: Option<String>,
}

/// Parse a slip-extraction reply.
///
/// The expected shape is `{ "parlayLegs": [...] }`, optionally with an
/// `error_message` when the image was not a slip. Missing leg fields are
/// coerced to placeholders so a partially readable slip still renders.
pub fn parse_slip_extraction(text: &str) -> Result<SlipExtraction, AiError> {
    let raw_output = text.trim().to_string();
    let value = parse_json(text)?;

    if let Some(message) = value.get("error_message").and_then(Value::as_str) {
        return Ok(SlipExtraction {
            raw_output,
            legs: Vec::new(),
            error: Some(message.to_string()),
        });
    }

    let Some(items) = value.get("parlayLegs").and_then(Value::as_array) else {
        return Ok(SlipExtraction {
            raw_output,
            legs: Vec::new(),
            error: Some("AI response did not contain valid parlay legs.".to_string()),
        });
    };

    let legs: Vec<ParlayLeg> = items
        .iter()
        .enumerate()
        .map(|(index, leg)| coerce_leg(leg, index))
        .collect();

    let error = legs
        .is_empty()
        .then(|| "No parlay legs identified.".to_string());

    Ok(SlipExtraction {
        raw_output,
        legs,
        error,
    })
}

fn coerce_leg(leg: &Value, index: usize) -> ParlayLeg {
    let field = |name: &str, fallback: &str| {
        leg.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    let condition = field("condition", "N/A");
    let is_editable_over_under = matches!(condition.to_lowercase().as_str(), "over" | "under");

    ParlayLeg {
        id: field("id", &format!("leg{}", index + 1)),
        player_team: field("playerTeam", "N/A"),
        stat: field("stat", "N/A"),
        condition,
        value: field("value", ""),
        is_editable_over_under,
    }
}

// ---------------------------------------------------------------------------
// Parlay prediction
// ---------------------------------------------------------------------------

/// The model's verdict on a parlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParlayOutcome {
    Hit,
    Miss,
    Indeterminate,
    Error,
}

impl ParlayOutcome {
    fn from_text(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "HIT" => ParlayOutcome::Hit,
            "MISS" => ParlayOutcome::Miss,
            "ERROR" => ParlayOutcome::Error,
            _ => ParlayOutcome::Indeterminate,
        }
    }
}

/// A grounded parlay prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ParlayPrediction {
    pub outcome: ParlayOutcome,
    pub overall_summary: String,
    pub suggestions: String,
    pub contextual_data_used: String,
    pub sources: Vec<WebSource>,
}

/// Parse a prediction reply body. `sources` come from the envelope's
/// grounding metadata, not the reply text, so the caller passes them in.
pub fn parse_prediction(text: &str, sources: Vec<WebSource>) -> Result<ParlayPrediction, AiError> {
    let value = parse_json(text)?;

    let field = |name: &str, fallback: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    let outcome = value
        .get("prediction")
        .and_then(Value::as_str)
        .map(ParlayOutcome::from_text)
        .unwrap_or(ParlayOutcome::Indeterminate);

    Ok(ParlayPrediction {
        outcome,
        overall_summary: field("overall_summary", "No summary provided by AI."),
        suggestions: field("suggestions", "No suggestions provided by AI."),
        contextual_data_used: field("context_summary", "No context summary provided by AI."),
        sources,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- Envelope --

    #[test]
    fn response_text_concatenates_parts() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"props\":" }, { "text": "[]}" }] }
            }]
        });
        assert_eq!(response_text(&body).as_deref(), Some("{\"props\":[]}"));
    }

    #[test]
    fn response_text_empty_candidates_is_none() {
        assert!(response_text(&json!({ "candidates": [] })).is_none());
        assert!(response_text(&json!({})).is_none());
    }

    #[test]
    fn grounding_sources_require_uri_and_title() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "x" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://example.com/a", "title": "Injury report" } },
                        { "web": { "uri": "https://example.com/b" } },
                        { "retrievedContext": { "uri": "ignored" } }
                    ]
                }
            }]
        });
        let sources = grounding_sources(&body);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "Injury report");
    }

    #[test]
    fn grounding_sources_absent_is_empty() {
        assert!(grounding_sources(&json!({ "candidates": [{}] })).is_empty());
    }

    // -- Fence stripping --

    #[test]
    fn strips_json_fence() {
        let text = "```json\n{\"props\": []}\n```";
        assert_eq!(strip_code_fence(text), "{\"props\": []}");
    }

    #[test]
    fn strips_bare_fence() {
        let text = "```\n[1, 2]\n```";
        assert_eq!(strip_code_fence(text), "[1, 2]");
    }

    #[test]
    fn unfenced_text_passes_through_trimmed() {
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn fence_in_middle_of_prose_is_not_stripped() {
        let text = "Here you go: ```json\n{}\n``` enjoy";
        assert_eq!(strip_code_fence(text), text);
    }

    // -- Prop candidates --

    #[test]
    fn parses_props_object_wrapper() {
        let text = r#"{"props": [
            {"player": "LeBron James", "statLabel": "Points", "line": "27.5", "side": "Over", "confidence": 0.8}
        ]}"#;
        let candidates = parse_prop_candidates(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].player.as_deref(), Some("LeBron James"));
    }

    #[test]
    fn parses_bare_array() {
        let text = r#"[{"player": "A", "stat": "Rebounds", "line": 10, "side": "Under"}]"#;
        let candidates = parse_prop_candidates(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].stat_label.as_deref(), Some("Rebounds"));
    }

    #[test]
    fn parses_fenced_props() {
        let text = "```json\n{\"props\": [{\"player\": \"A\"}]}\n```";
        assert_eq!(parse_prop_candidates(text).unwrap().len(), 1);
    }

    #[test]
    fn prose_reply_is_not_json_error() {
        let err = parse_prop_candidates("I could not find any props today.").unwrap_err();
        assert!(err.to_string().to_lowercase().contains("not json"));
    }

    #[test]
    fn object_without_props_array_is_error() {
        let err = parse_prop_candidates(r#"{"suggestions": []}"#).unwrap_err();
        assert!(err.to_string().contains("props"));
    }

    #[test]
    fn malformed_candidates_are_skipped_not_fatal() {
        let text = r#"{"props": [
            {"player": "A", "stat": "Points", "line": "27.5", "side": "Over"},
            "just a string",
            42
        ]}"#;
        let candidates = parse_prop_candidates(text).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    // -- Slip extraction --

    #[test]
    fn parses_parlay_legs_with_coercion() {
        let text = r#"{"parlayLegs": [
            {"id": "leg1", "playerTeam": "LeBron James", "stat": "Points", "condition": "Over", "value": "27.5"},
            {"playerTeam": "Kansas City Chiefs", "stat": "Moneyline", "condition": "To Win"}
        ]}"#;
        let extraction = parse_slip_extraction(text).unwrap();
        assert!(extraction.error.is_none());
        assert_eq!(extraction.legs.len(), 2);

        assert_eq!(extraction.legs[0].id, "leg1");
        assert!(extraction.legs[0].is_editable_over_under);

        assert_eq!(extraction.legs[1].id, "leg2", "missing id falls back to position");
        assert_eq!(extraction.legs[1].value, "");
        assert!(!extraction.legs[1].is_editable_over_under);
    }

    #[test]
    fn missing_leg_fields_become_placeholders() {
        let extraction = parse_slip_extraction(r#"{"parlayLegs": [{}]}"#).unwrap();
        let leg = &extraction.legs[0];
        assert_eq!(leg.player_team, "N/A");
        assert_eq!(leg.stat, "N/A");
        assert_eq!(leg.condition, "N/A");
    }

    #[test]
    fn error_message_reply_surfaces_as_error() {
        let text = r#"{"parlayLegs": [], "error_message": "The uploaded image does not appear to be a parlay slip."}"#;
        let extraction = parse_slip_extraction(text).unwrap();
        assert!(extraction.legs.is_empty());
        assert_eq!(
            extraction.error.as_deref(),
            Some("The uploaded image does not appear to be a parlay slip.")
        );
    }

    #[test]
    fn empty_leg_array_reports_no_legs() {
        let extraction = parse_slip_extraction(r#"{"parlayLegs": []}"#).unwrap();
        assert_eq!(extraction.error.as_deref(), Some("No parlay legs identified."));
    }

    #[test]
    fn missing_parlay_legs_key_reports_invalid() {
        let extraction = parse_slip_extraction(r#"{"legs": []}"#).unwrap();
        assert_eq!(
            extraction.error.as_deref(),
            Some("AI response did not contain valid parlay legs.")
        );
    }

    #[test]
    fn under_condition_is_editable() {
        let text = r#"{"parlayLegs": [{"condition": "under", "value": "4.5"}]}"#;
        let extraction = parse_slip_extraction(text).unwrap();
        assert!(extraction.legs[0].is_editable_over_under);
    }

    // -- Prediction --

    #[test]
    fn parses_full_prediction() {
        let text = r#"{
            "prediction": "MISS",
            "overall_summary": "- Player X is questionable.\n",
            "suggestions": "- Flip the under.\n",
            "context_summary": "- Found: injury report.\n",
            "confidence_level": "Medium"
        }"#;
        let sources = vec![WebSource {
            uri: "https://example.com".into(),
            title: "Report".into(),
        }];
        let prediction = parse_prediction(text, sources.clone()).unwrap();
        assert_eq!(prediction.outcome, ParlayOutcome::Miss);
        assert_eq!(prediction.overall_summary, "- Player X is questionable.\n");
        assert_eq!(prediction.sources, sources);
    }

    #[test]
    fn unknown_prediction_value_is_indeterminate() {
        let text = r#"{"prediction": "COIN FLIP"}"#;
        let prediction = parse_prediction(text, Vec::new()).unwrap();
        assert_eq!(prediction.outcome, ParlayOutcome::Indeterminate);
        assert_eq!(prediction.overall_summary, "No summary provided by AI.");
        assert_eq!(prediction.suggestions, "No suggestions provided by AI.");
    }

    #[test]
    fn outcome_parsing_is_case_insensitive() {
        assert_eq!(ParlayOutcome::from_text("hit"), ParlayOutcome::Hit);
        assert_eq!(ParlayOutcome::from_text(" Miss "), ParlayOutcome::Miss);
        assert_eq!(ParlayOutcome::from_text("error"), ParlayOutcome::Error);
    }

    #[test]
    fn non_json_prediction_is_error() {
        let err = parse_prediction("Sorry, something went wrong.", Vec::new()).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("not json"));
    }
}
