// Deduplication and ranking of validated props.
//
// Duplicate markets are collapsed to one slot per (player, stat, line),
// keeping the higher-confidence side, then everything is sorted by
// confidence with a quality gate and a hard top-10 cut.

use std::collections::HashMap;

use crate::props::NormalizedProp;

/// Minimum confidence for a prop to count as "strong".
const STRONG_CONFIDENCE: f64 = 0.6;

/// Strong props required before the quality gate filters out the rest.
const STRONG_GATE_COUNT: usize = 6;

/// Maximum number of props in a ranked set.
const MAX_RANKED: usize = 10;

/// Deduplicate, rank, gate, and truncate a batch of validated props.
///
/// Grouping is by `slot_key` (player, stat, line) — side is informative but
/// not part of the key, so the Over and Under of one market occupy a single
/// slot and the stronger-confidence side survives. Ties keep the first-seen
/// entry. Winners are sorted descending by confidence (absent sorts as 0,
/// stable for equal scores); when at least 6 entries reach 0.6 confidence
/// only those are kept, otherwise the full ranked list stands. The result
/// is cut to the first 10. Empty input produces an empty set, not an error.
pub fn rank_props(props: Vec<NormalizedProp>) -> Vec<NormalizedProp> {
    let mut slots: HashMap<(String, crate::props::StatLabel, String), NormalizedProp> =
        HashMap::new();
    // Insertion order of winning slots, for a stable sort over equal scores.
    let mut order: Vec<(String, crate::props::StatLabel, String)> = Vec::new();

    for prop in props {
        let key = prop.slot_key();
        match slots.get(&key) {
            Some(existing) if prop.ranking_score() <= existing.ranking_score() => {}
            Some(_) => {
                slots.insert(key, prop);
            }
            None => {
                order.push(key.clone());
                slots.insert(key, prop);
            }
        }
    }

    let mut ranked: Vec<NormalizedProp> = order
        .into_iter()
        .filter_map(|key| slots.remove(&key))
        .collect();
    ranked.sort_by(|a, b| {
        b.ranking_score()
            .partial_cmp(&a.ranking_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let strong: Vec<&NormalizedProp> = ranked
        .iter()
        .filter(|p| p.ranking_score() >= STRONG_CONFIDENCE)
        .collect();
    let mut gated: Vec<NormalizedProp> = if strong.len() >= STRONG_GATE_COUNT {
        strong.into_iter().cloned().collect()
    } else {
        ranked
    };

    gated.truncate(MAX_RANKED);
    gated
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
