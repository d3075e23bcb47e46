// Betting-line normalization.
//
// Providers and AI suggestions express lines inconsistently ("27", "27.5",
// "Over 27.5 Pts", 27). Everything funnels through here into the canonical
// half-point string representation used across the pipeline and the cache.

use std::sync::OnceLock;

use regex::Regex;

/// Matches the first signed decimal number in a free-text line value.
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d+(\.\d+)?").expect("line pattern is valid"))
}

/// Extract the first signed decimal number from an arbitrary line value.
///
/// Returns `None` when the text contains no number or the number does not
/// parse to a finite float. Absence is absence, never zero.
pub fn parse_line(value: &str) -> Option<f64> {
    let m = line_pattern().find(value)?;
    let num: f64 = m.as_str().parse().ok()?;
    if num.is_finite() {
        Some(num)
    } else {
        None
    }
}

/// Format a numeric line as the conventional half-point string.
///
/// The value is rounded to the nearest 0.5. When rounding lands on a whole
/// number the line is pushed to `whole + 0.5`: sportsbook lines are
/// conventionally half-integers, so an integer line from a provider is
/// treated as ambiguous and biased to the half point. Downstream cache keys
/// and display strings depend on this exact rule.
pub fn format_line(value: f64) -> String {
    let rounded = (value * 2.0).round() / 2.0;
    let biased = if rounded.fract() == 0.0 {
        rounded + 0.5
    } else {
        rounded
    };
    format!("{biased:.1}")
}

/// Normalize a textual line value to its canonical half-point string, or
/// `None` when no number can be extracted.
pub fn normalize_line(value: &str) -> Option<String> {
    parse_line(value).map(format_line)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
