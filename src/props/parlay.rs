// Parlay assembly from a ranked prop set.

use crate::props::NormalizedProp;

/// Supported parlay sizes, matching the preset buttons on the picks surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParlaySize {
    Two,
    Three,
    Four,
    Six,
}

impl ParlaySize {
    pub const ALL: [ParlaySize; 4] = [
        ParlaySize::Two,
        ParlaySize::Three,
        ParlaySize::Four,
        ParlaySize::Six,
    ];

    pub fn legs(self) -> usize {
        match self {
            ParlaySize::Two => 2,
            ParlaySize::Three => 3,
            ParlaySize::Four => 4,
            ParlaySize::Six => 6,
        }
    }
}

/// Slice the top-N ranked props into a parlay.
///
/// Returns the first `size.legs()` entries in ranked order. When the ranked
/// set holds fewer entries, whatever exists is returned — no padding and no
/// error; the caller decides whether a short set means "still loading".
pub fn assemble_parlay(ranked: &[NormalizedProp], size: ParlaySize) -> Vec<NormalizedProp> {
    ranked.iter().take(size.legs()).cloned().collect()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
