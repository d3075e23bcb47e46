// Relay client for the sportsdata.io odds and standings products.
//
// The subscription key never reaches the rendering layer: this module is the
// only place that attaches it, and every reply is re-wrapped together with
// the request parameter so callers can correlate responses without keeping
// request state around.

use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum OddsError {
    #[error("no sportsdata.io key configured")]
    MissingKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream reply was not JSON: {0}")]
    NotJson(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),
}

// ---------------------------------------------------------------------------
// Reply wrappers
// ---------------------------------------------------------------------------

/// Betting events for one date, echoing the requested date.
#[derive(Debug, Clone, Serialize)]
pub struct BettingEvents {
    pub date: String,
    pub data: Value,
}

/// Betting markets for one game, echoing the requested game id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BettingMarkets {
    pub game_id: i64,
    pub data: Value,
}

/// League standings for one season, echoing the resolved season.
#[derive(Debug, Clone, Serialize)]
pub struct Standings {
    pub season: String,
    pub data: Value,
}

/// The season identifier to use when the caller passes none: the regular
/// season whose start year is the current year from July onward, otherwise
/// the previous year.
pub fn default_season(now: DateTime<Utc>) -> String {
    let start_year = if now.month() >= 7 {
        now.year()
    } else {
        now.year() - 1
    };
    format!("{start_year}REG")
}

// ---------------------------------------------------------------------------
// OddsClient
// ---------------------------------------------------------------------------

/// Thin authenticated client for the odds relay.
pub struct OddsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl OddsClient {
    pub fn new(api_key: Option<String>, base_url: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            timeout,
        }
    }

    /// Build an `OddsClient` from the application config. The client is
    /// always constructed; a missing key only fails at call time.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.credentials.sportsdata_io_key.clone(),
            config.odds.base_url.clone(),
            Duration::from_secs(config.app.fetch_timeout_secs),
        )
    }

    /// Betting events scheduled on `date` (`YYYY-MM-DD`).
    pub async fn betting_events_by_date(&self, date: &str) -> Result<BettingEvents, OddsError> {
        let url = format!("{}/odds/json/BettingEventsByDate/{date}", self.base_url);
        let data = self.fetch(&url).await?;
        Ok(BettingEvents {
            date: date.to_string(),
            data,
        })
    }

    /// Betting markets for one game. `include` expands nested market data
    /// when set (e.g. "available").
    pub async fn betting_markets_by_game(
        &self,
        game_id: i64,
        include: Option<&str>,
    ) -> Result<BettingMarkets, OddsError> {
        let mut url = format!("{}/odds/json/BettingMarketsByGameID/{game_id}", self.base_url);
        if let Some(value) = include {
            url.push_str(&format!("?include={value}"));
        }
        let data = self.fetch(&url).await?;
        Ok(BettingMarkets { game_id, data })
    }

    /// League standings. Falls back to the current default season when
    /// `season` is `None`.
    pub async fn standings(&self, season: Option<&str>) -> Result<Standings, OddsError> {
        let season = match season {
            Some(s) => s.to_string(),
            None => default_season(Utc::now()),
        };
        let url = format!("{}/scores/json/Standings/{season}", self.base_url);
        let data = self.fetch(&url).await?;
        Ok(Standings { season, data })
    }

    async fn fetch(&self, url: &str) -> Result<Value, OddsError> {
        let Some(api_key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Err(OddsError::MissingKey);
        };

        let send = async {
            let resp = self
                .http
                .get(url)
                .header("Ocp-Apim-Subscription-Key", api_key)
                .send()
                .await?;

            let status = resp.status();
            let text = resp.text().await?;

            if !status.is_success() {
                warn!(status = status.as_u16(), "odds upstream request failed");
                return Err(OddsError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }

            serde_json::from_str(&text).map_err(|e| OddsError::NotJson(e.to_string()))
        };

        match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(OddsError::Timeout(self.timeout.as_secs())),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
