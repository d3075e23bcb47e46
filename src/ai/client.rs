// Gemini generateContent client.
//
// One plain request/response call per operation; no streaming. Every call is
// bounded by the configured fetch timeout, and an expired timeout is
// reported as a fetch failure like any other transport error.

use std::time::Duration;

use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::ai::prompt;
use crate::ai::response::{
    self, ParlayPrediction, SlipExtraction,
};
use crate::ai::AiError;
use crate::config::Config;
use crate::props::RawPropCandidate;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Low-level Gemini API client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    text_model: String,
    vision_model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new client with the given API key and model identifiers.
    pub fn new(
        api_key: String,
        text_model: String,
        vision_model: String,
        timeout: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            text_model,
            vision_model,
            base_url: GEMINI_API_URL.to_string(),
            timeout,
        }
    }

    /// Point the client at a different API root. Used by tests to target a
    /// local mock server.
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Ask for a day's prop suggestions in one league. Returns the raw,
    /// unvalidated candidate batch.
    pub async fn daily_prop_suggestions(
        &self,
        date_label: &str,
        desired_count: u32,
        league_label: &str,
    ) -> Result<Vec<RawPropCandidate>, AiError> {
        let text = prompt::build_daily_suggestions_prompt(date_label, desired_count, league_label);
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let reply = self.generate(&self.text_model, body).await?;
        let text = response::response_text(&reply).ok_or(AiError::EmptyReply)?;
        let candidates = response::parse_prop_candidates(&text)?;
        debug!(count = candidates.len(), league_label, "received prop candidates");
        Ok(candidates)
    }

    /// Extract the legs of a parlay slip image.
    pub async fn extract_slip(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<SlipExtraction, AiError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": mime_type, "data": encoded } },
                    { "text": prompt::build_slip_extraction_prompt() }
                ]
            }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let reply = self.generate(&self.vision_model, body).await?;
        let text = response::response_text(&reply).ok_or(AiError::EmptyReply)?;
        response::parse_slip_extraction(&text)
    }

    /// Predict an assembled parlay with web grounding. `parlay_details` is
    /// the plain-text rendering of the legs.
    pub async fn predict_parlay(
        &self,
        parlay_details: &str,
    ) -> Result<ParlayPrediction, AiError> {
        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt::build_prediction_prompt(parlay_details) }]
            }],
            "tools": [{ "googleSearch": {} }]
        });

        let reply = self.generate(&self.text_model, body).await?;
        let sources = response::grounding_sources(&reply);
        let text = response::response_text(&reply).ok_or(AiError::EmptyReply)?;
        response::parse_prediction(&text, sources)
    }

    /// POST one generateContent request and return the parsed envelope.
    async fn generate(&self, model: &str, body: Value) -> Result<Value, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let request = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body);

        let send = async {
            let resp = request.send().await?;
            let status = resp.status();
            let text = resp.text().await?;

            if !status.is_success() {
                warn!(status = status.as_u16(), model, "generateContent failed");
                return Err(AiError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }

            serde_json::from_str(&text).map_err(|e| AiError::NotJson {
                detail: format!("envelope: {e}"),
            })
        };

        match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout(self.timeout.as_secs())),
        }
    }
}

// ---------------------------------------------------------------------------
// AiClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that is either an active Gemini client or disabled.
///
/// Callers get a typed `AiError::Disabled` rather than a panic or a silent
/// no-op, so the app keeps working without a key: cached boards still
/// render, only fresh AI calls refuse.
pub enum AiClient {
    Active(GeminiClient),
    /// AI functionality is disabled (no API key configured).
    Disabled,
}

impl AiClient {
    /// Build an `AiClient` from the application config. Returns `Active`
    /// only when a non-empty API key is present in credentials.
    pub fn from_config(config: &Config) -> Self {
        match &config.credentials.gemini_api_key {
            Some(key) if !key.is_empty() => AiClient::Active(GeminiClient::new(
                key.clone(),
                config.ai.text_model.clone(),
                config.ai.vision_model.clone(),
                Duration::from_secs(config.app.fetch_timeout_secs),
            )),
            _ => AiClient::Disabled,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AiClient::Active(_))
    }

    pub async fn daily_prop_suggestions(
        &self,
        date_label: &str,
        desired_count: u32,
        league_label: &str,
    ) -> Result<Vec<RawPropCandidate>, AiError> {
        match self {
            AiClient::Active(client) => {
                client
                    .daily_prop_suggestions(date_label, desired_count, league_label)
                    .await
            }
            AiClient::Disabled => Err(AiError::Disabled),
        }
    }

    pub async fn extract_slip(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<SlipExtraction, AiError> {
        match self {
            AiClient::Active(client) => client.extract_slip(image, mime_type).await,
            AiClient::Disabled => Err(AiError::Disabled),
        }
    }

    pub async fn predict_parlay(&self, parlay_details: &str) -> Result<ParlayPrediction, AiError> {
        match self {
            AiClient::Active(client) => client.predict_parlay(parlay_details).await,
            AiClient::Disabled => Err(AiError::Disabled),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ParlayOutcome;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn test_client(timeout_secs: u64) -> GeminiClient {
        GeminiClient::new(
            "test-key".to_string(),
            "gemini-2.5-flash".to_string(),
            "gemini-2.5-flash".to_string(),
            Duration::from_secs(timeout_secs),
        )
    }

    /// Serve one HTTP response on a fresh listener and return its base URL.
    async fn mock_server(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut buf = vec![0u8; 16384];
            let _ = socket.read(&mut buf).await;

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        });

        format!("http://{addr}")
    }

    fn envelope_with_text(text: &str) -> String {
        serde_json::to_string(&json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
        .unwrap()
    }

    // -- from_config --

    fn make_test_config(api_key: Option<String>) -> Config {
        use crate::config::*;

        Config {
            app: AppSettings {
                db_path: "test.db".to_string(),
                desired_count: 14,
                fetch_timeout_secs: 20,
            },
            ai: AiSettings {
                text_model: "gemini-2.5-flash".to_string(),
                vision_model: "gemini-2.5-flash".to_string(),
            },
            odds: OddsSettings::default(),
            leagues: vec![LeagueConfig {
                id: "nba".to_string(),
                label: "NBA".to_string(),
                enabled: true,
            }],
            credentials: CredentialsConfig {
                gemini_api_key: api_key,
                sportsdata_io_key: None,
            },
        }
    }

    #[test]
    fn from_config_with_api_key_returns_active() {
        let client = AiClient::from_config(&make_test_config(Some("key".to_string())));
        assert!(client.is_active());
    }

    #[test]
    fn from_config_without_api_key_returns_disabled() {
        let client = AiClient::from_config(&make_test_config(None));
        assert!(!client.is_active());
    }

    #[test]
    fn from_config_with_empty_api_key_returns_disabled() {
        let client = AiClient::from_config(&make_test_config(Some(String::new())));
        assert!(!client.is_active());
    }

    // -- Disabled paths --

    #[tokio::test]
    async fn disabled_client_refuses_suggestions() {
        let client = AiClient::Disabled;
        let err = client
            .daily_prop_suggestions("today", 14, "NBA")
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Disabled));
    }

    #[tokio::test]
    async fn disabled_client_refuses_slip_and_prediction() {
        let client = AiClient::Disabled;
        assert!(matches!(
            client.extract_slip(b"img", "image/png").await.unwrap_err(),
            AiError::Disabled
        ));
        assert!(matches!(
            client.predict_parlay("Leg 1: ...").await.unwrap_err(),
            AiError::Disabled
        ));
    }

    // -- Mock server round trips --

    #[tokio::test]
    async fn suggestions_round_trip_through_mock_server() {
        let reply = r#"{"props": [
            {"player": "LeBron James", "statLabel": "Points", "line": "27.5", "side": "Over", "confidence": 0.8},
            {"player": "Nikola Jokic", "statLabel": "PRA", "line": 45, "side": "Over", "confidence": "0.74"}
        ]}"#;
        let base = mock_server("HTTP/1.1 200 OK", envelope_with_text(reply)).await;
        let client = test_client(5).with_base_url(base);

        let candidates = client
            .daily_prop_suggestions("Saturday, August 22, 2026", 14, "NBA")
            .await
            .unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].player.as_deref(), Some("LeBron James"));
    }

    #[tokio::test]
    async fn fenced_reply_is_tolerated() {
        let reply = "```json\n{\"props\": [{\"player\": \"A\", \"statLabel\": \"Points\", \"line\": \"27.5\", \"side\": \"Over\"}]}\n```";
        let base = mock_server("HTTP/1.1 200 OK", envelope_with_text(reply)).await;
        let client = test_client(5).with_base_url(base);

        let candidates = client.daily_prop_suggestions("today", 14, "NBA").await.unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn quota_status_surfaces_in_error_message() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted (e.g. check quota)."}}"#;
        let base = mock_server("HTTP/1.1 429 Too Many Requests", body.to_string()).await;
        let client = test_client(5).with_base_url(base);

        let err = client.daily_prop_suggestions("today", 14, "NBA").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("quota"));
    }

    #[tokio::test]
    async fn prose_reply_is_not_json_error() {
        let base = mock_server(
            "HTTP/1.1 200 OK",
            envelope_with_text("No games are scheduled today, sorry."),
        )
        .await;
        let client = test_client(5).with_base_url(base);

        let err = client.daily_prop_suggestions("today", 14, "NBA").await.unwrap_err();
        assert!(err.to_string().to_lowercase().contains("not json"));
    }

    #[tokio::test]
    async fn empty_candidates_is_empty_reply_error() {
        let base = mock_server("HTTP/1.1 200 OK", r#"{"candidates": []}"#.to_string()).await;
        let client = test_client(5).with_base_url(base);

        let err = client.daily_prop_suggestions("today", 14, "NBA").await.unwrap_err();
        assert!(matches!(err, AiError::EmptyReply));
    }

    #[tokio::test]
    async fn prediction_round_trip_with_grounding() {
        let reply = r#"{
            "prediction": "MISS",
            "overall_summary": "- Player X is out.\n",
            "suggestions": "- Drop leg 2.\n",
            "context_summary": "- Found: injury news.\n"
        }"#;
        let body = serde_json::to_string(&json!({
            "candidates": [{
                "content": { "parts": [{ "text": reply }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://example.com/news", "title": "Injury news" } }
                    ]
                }
            }]
        }))
        .unwrap();
        let base = mock_server("HTTP/1.1 200 OK", body).await;
        let client = test_client(5).with_base_url(base);

        let prediction = client.predict_parlay("Leg 1: X Over 27.5 Points\n").await.unwrap();
        assert_eq!(prediction.outcome, ParlayOutcome::Miss);
        assert_eq!(prediction.sources.len(), 1);
        assert_eq!(prediction.sources[0].title, "Injury news");
    }

    #[tokio::test]
    async fn slip_extraction_round_trip() {
        let reply = r#"{"parlayLegs": [
            {"id": "leg1", "playerTeam": "LeBron James", "stat": "Points", "condition": "Over", "value": "27.5"}
        ]}"#;
        let base = mock_server("HTTP/1.1 200 OK", envelope_with_text(reply)).await;
        let client = test_client(5).with_base_url(base);

        let extraction = client.extract_slip(b"fake-image-bytes", "image/png").await.unwrap();
        assert_eq!(extraction.legs.len(), 1);
        assert!(extraction.legs[0].is_editable_over_under);
        assert!(extraction.error.is_none());
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept the connection but never respond.
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = test_client(1).with_base_url(format!("http://{addr}"));
        let err = client.daily_prop_suggestions("today", 14, "NBA").await.unwrap_err();
        assert!(matches!(err, AiError::Timeout(1)));
    }
}
