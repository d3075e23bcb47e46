// Daily prop domain types and the normalization/ranking pipeline.
//
// Raw AI or provider payloads enter as `RawPropCandidate` (untrusted, every
// field optional), pass through `extract::validate_candidate` into the
// canonical `NormalizedProp`, and are deduplicated and ranked by `rank`
// before display or parlay assembly.

pub mod extract;
pub mod line;
pub mod parlay;
pub mod rank;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use extract::{validate_candidate, RawPropCandidate};
pub use parlay::{assemble_parlay, ParlaySize};
pub use rank::rank_props;

// ---------------------------------------------------------------------------
// StatLabel
// ---------------------------------------------------------------------------

/// Closed vocabulary of stat categories a prop may be filed under.
///
/// Free-text stat descriptions are mapped into this set by the extractor's
/// substring rules; anything that does not map (or exactly match a canonical
/// label) is rejected upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatLabel {
    Points,
    Rebounds,
    Assists,
    /// Points + rebounds + assists.
    #[serde(rename = "PRA")]
    Pra,
    /// Points + rebounds.
    #[serde(rename = "PR")]
    Pr,
    /// Points + assists.
    #[serde(rename = "PA")]
    Pa,
    /// Rebounds + assists.
    #[serde(rename = "RA")]
    Ra,
    #[serde(rename = "3PT Made")]
    ThreePointMade,
    Turnovers,
    Blocks,
    Steals,
}

impl StatLabel {
    /// The canonical display label for this stat category.
    pub fn label(self) -> &'static str {
        match self {
            StatLabel::Points => "Points",
            StatLabel::Rebounds => "Rebounds",
            StatLabel::Assists => "Assists",
            StatLabel::Pra => "PRA",
            StatLabel::Pr => "PR",
            StatLabel::Pa => "PA",
            StatLabel::Ra => "RA",
            StatLabel::ThreePointMade => "3PT Made",
            StatLabel::Turnovers => "Turnovers",
            StatLabel::Blocks => "Blocks",
            StatLabel::Steals => "Steals",
        }
    }

    /// Map free-text stat descriptions into the closed vocabulary.
    ///
    /// Combination stats are checked most-specific-first so that
    /// "points + rebounds + assists" becomes PRA rather than PR or Points.
    /// Unmapped text is accepted only when it exactly equals a canonical
    /// label (so an already-clean "PRA" passes through).
    pub fn from_text(value: &str) -> Option<Self> {
        let normalized = value.to_lowercase();
        let has = |needle: &str| normalized.contains(needle);

        if has("points + rebounds + assists") || has("points+rebounds+assists") {
            return Some(StatLabel::Pra);
        }
        if has("points + rebounds") || has("points+rebounds") {
            return Some(StatLabel::Pr);
        }
        if has("points + assists") || has("points+assists") {
            return Some(StatLabel::Pa);
        }
        if has("rebounds + assists") || has("rebounds+assists") {
            return Some(StatLabel::Ra);
        }
        if has("3-point") || has("three point") {
            return Some(StatLabel::ThreePointMade);
        }
        if has("points") {
            return Some(StatLabel::Points);
        }
        if has("rebounds") {
            return Some(StatLabel::Rebounds);
        }
        if has("assists") {
            return Some(StatLabel::Assists);
        }
        if has("blocks") {
            return Some(StatLabel::Blocks);
        }
        if has("steals") {
            return Some(StatLabel::Steals);
        }
        if has("turnovers") {
            return Some(StatLabel::Turnovers);
        }

        // Exact canonical labels pass through unchanged.
        Self::all().into_iter().find(|s| s.label() == value)
    }

    fn all() -> [StatLabel; 11] {
        [
            StatLabel::Points,
            StatLabel::Rebounds,
            StatLabel::Assists,
            StatLabel::Pra,
            StatLabel::Pr,
            StatLabel::Pa,
            StatLabel::Ra,
            StatLabel::ThreePointMade,
            StatLabel::Turnovers,
            StatLabel::Blocks,
            StatLabel::Steals,
        ]
    }
}

impl fmt::Display for StatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Directional choice on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Over,
    Under,
    Yes,
    No,
}

impl Side {
    /// Normalize free-text side variants ("over", "Team X Over") by
    /// case-insensitive exact or word-substring match. Anything else is
    /// rejected.
    pub fn from_text(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        if normalized == "over" || normalized.contains(" over") {
            return Some(Side::Over);
        }
        if normalized == "under" || normalized.contains(" under") {
            return Some(Side::Under);
        }
        if normalized == "yes" || normalized.contains(" yes") {
            return Some(Side::Yes);
        }
        if normalized == "no" || normalized.contains(" no") {
            return Some(Side::No);
        }
        None
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Over => "Over",
            Side::Under => "Under",
            Side::Yes => "Yes",
            Side::No => "No",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// NormalizedProp
// ---------------------------------------------------------------------------

/// A validated, canonical prop line.
///
/// Only the extractor constructs these; every field has already passed the
/// rejection rules, so downstream code never re-validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProp {
    /// Composite key, unique within one ranking run.
    pub id: String,
    pub player: String,
    pub stat: StatLabel,
    /// Canonical half-point line string (e.g. "26.5").
    pub line: String,
    pub side: Side,
    /// Model- or provider-supplied likelihood in [0, 1]. Absent values rank
    /// as 0 but are not stored as 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matchup: Option<String>,
    pub reason: String,
}

impl NormalizedProp {
    /// Confidence used for ranking and dedup comparisons.
    pub fn ranking_score(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }

    /// Dedup key: side is deliberately NOT part of the key, so an Over and
    /// an Under on the same market compete for one slot and the stronger
    /// side wins.
    pub fn slot_key(&self) -> (String, StatLabel, String) {
        (self.player.clone(), self.stat, self.line.clone())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
