// Daily board orchestration: cache check, AI fetch, validation, ranking,
// cache write, and failure classification.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai::AiClient;
use crate::cache::{pacific_today, PropCache};
use crate::config::LeagueConfig;
use crate::props::{rank_props, validate_candidate, NormalizedProp};

/// Headline shown for quota, permission, and malformed-reply failures.
pub const TECHNICAL_MESSAGE: &str = "We're tuning today's prop feed.";

/// Shown when a board loads successfully but holds no props.
pub const EMPTY_BOARD_MESSAGE: &str = "No props available yet for today.";

// ---------------------------------------------------------------------------
// Board and error types
// ---------------------------------------------------------------------------

/// One league's ranked board for the current Pacific day.
#[derive(Debug, Clone)]
pub struct DailyBoard {
    pub league_id: String,
    pub league_label: String,
    /// Pacific calendar date the board belongs to.
    pub date: String,
    pub props: Vec<NormalizedProp>,
    pub from_cache: bool,
}

impl DailyBoard {
    /// The "updated" footer line: cached boards say so, fresh ones carry the
    /// feed's refresh time.
    pub fn last_updated(&self) -> String {
        if self.from_cache {
            format!("{} (cached)", self.date)
        } else {
            format!("{} (6:00 AM PST update)", self.date)
        }
    }
}

/// A board load failure, already classified for display.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Provider-side trouble the user cannot act on. The underlying detail
    /// is logged, not shown.
    #[error("{TECHNICAL_MESSAGE}")]
    Technical { detail: String },

    /// Anything else, shown verbatim.
    #[error("{0}")]
    Fetch(String),
}

/// Quota, permission, and parse failures are provider-side trouble; show
/// the friendly headline instead of the raw message.
fn is_technical(message: &str) -> bool {
    let lower = message.to_lowercase();
    message.contains("429")
        || message.contains("403")
        || lower.contains("quota")
        || lower.contains("not json")
        || lower.contains("permission")
        || lower.contains("suspended")
}

fn classify(message: String) -> FeedError {
    if is_technical(&message) {
        FeedError::Technical { detail: message }
    } else {
        FeedError::Fetch(message)
    }
}

// ---------------------------------------------------------------------------
// DailyBoardService
// ---------------------------------------------------------------------------

/// Loads one ranked board per league per Pacific day, going to the AI at
/// most once per (league, day).
pub struct DailyBoardService<'a> {
    ai: &'a AiClient,
    cache: &'a PropCache,
    desired_count: u32,
}

impl<'a> DailyBoardService<'a> {
    pub fn new(ai: &'a AiClient, cache: &'a PropCache, desired_count: u32) -> Self {
        Self {
            ai,
            cache,
            desired_count,
        }
    }

    /// Load the board for `league` on the current Pacific day.
    pub async fn load_board(&self, league: &LeagueConfig) -> Result<DailyBoard, FeedError> {
        self.load_board_for_date(league, &pacific_today()).await
    }

    /// Same as `load_board` with an explicit date, so tests and backfills
    /// can pin the day.
    pub async fn load_board_for_date(
        &self,
        league: &LeagueConfig,
        date: &str,
    ) -> Result<DailyBoard, FeedError> {
        if let Some(props) = self.read_cached(league, date) {
            debug!(league = %league.id, date, "daily board served from cache");
            return Ok(self.board(league, date, props, true));
        }

        let candidates = match self
            .ai
            .daily_prop_suggestions(date, self.desired_count, &league.label)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                // A concurrent load may have filled the cache while this
                // fetch was failing; prefer that over surfacing the error.
                if let Some(props) = self.read_cached(league, date) {
                    warn!(league = %league.id, error = %e, "AI fetch failed, serving cache");
                    return Ok(self.board(league, date, props, true));
                }
                warn!(league = %league.id, error = %e, "daily board fetch failed");
                return Err(classify(e.to_string()));
            }
        };

        // Invalid candidates are dropped one by one; a batch never fails
        // because of a single bad entry.
        let validated: Vec<NormalizedProp> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| validate_candidate(candidate, index))
            .collect();
        let dropped = candidates.len() - validated.len();
        if dropped > 0 {
            debug!(league = %league.id, dropped, "dropped invalid prop candidates");
        }

        let ranked = rank_props(validated);
        info!(league = %league.id, date, count = ranked.len(), "daily board ranked");

        // The board is already in hand; a failed cache write only costs a
        // refetch tomorrow.
        if let Err(e) = self.cache.write_daily(&league.id, date, &ranked) {
            warn!(league = %league.id, error = %e, "failed to cache daily board");
        }

        Ok(self.board(league, date, ranked, false))
    }

    /// A cached entry counts only when it holds props; an empty stored
    /// board is retried like a miss.
    fn read_cached(&self, league: &LeagueConfig, date: &str) -> Option<Vec<NormalizedProp>> {
        match self.cache.read_daily(&league.id, date) {
            Ok(Some(entry)) if !entry.props.is_empty() => Some(entry.props),
            Ok(_) => None,
            Err(e) => {
                warn!(league = %league.id, error = %e, "cache read failed");
                None
            }
        }
    }

    fn board(
        &self,
        league: &LeagueConfig,
        date: &str,
        props: Vec<NormalizedProp>,
        from_cache: bool,
    ) -> DailyBoard {
        DailyBoard {
            league_id: league.id.clone(),
            league_label: league.label.clone(),
            date: date.to_string(),
            props,
            from_cache,
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
