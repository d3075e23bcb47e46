// Prompt templates for the Gemini calls.
//
// Constructs compact, structured prompts for daily prop suggestions, slip
// image extraction, and grounded parlay prediction. Every prompt demands a
// single bare JSON object because downstream parsing tolerates a fence but
// nothing else.

use crate::props::NormalizedProp;

// ---------------------------------------------------------------------------
// Daily prop suggestions
// ---------------------------------------------------------------------------

/// Build the prompt for a day's prop suggestions in one league.
///
/// Asks for more candidates than the board shows because validation and
/// deduplication thin the batch considerably.
pub fn build_daily_suggestions_prompt(
    date_label: &str,
    desired_count: u32,
    league_label: &str,
) -> String {
    format!(
        "You are a sports betting analyst covering the {league_label}.\n\
         List the {desired_count} player prop bets for {league_label} games on {date_label} \
         that you consider most likely to hit, based on matchups, recent form, and usage.\n\
         \n\
         VERY IMPORTANT: Your entire response MUST be a single, valid JSON object. \
         Do NOT include any text, explanations, or markdown (like ```json) before or \
         after this JSON object.\n\
         \n\
         The JSON object should contain a single key \"props\" whose value is an array \
         of objects with this structure:\n\
         {{\n\
         \x20 \"player\": \"Player Name\",\n\
         \x20 \"statLabel\": \"Points\" | \"Rebounds\" | \"Assists\" | \"PRA\" | \"PR\" | \"PA\" | \"RA\" | \"3PT Made\" | \"Turnovers\" | \"Blocks\" | \"Steals\",\n\
         \x20 \"line\": 27.5,\n\
         \x20 \"side\": \"Over\" | \"Under\",\n\
         \x20 \"confidence\": 0.72,\n\
         \x20 \"matchup\": \"LAL @ BOS\",\n\
         \x20 \"reason\": \"One sentence on why this prop is likely to hit.\"\n\
         }}\n\
         \n\
         Rules:\n\
         - \"confidence\" is your probability estimate between 0 and 1.\n\
         - Use the player's full name; never output \"Unknown Player\" or a bet side \
         in place of a name.\n\
         - \"line\" is the numeric market line, as a number.\n\
         - Only include props for games actually scheduled on {date_label}.\n\
         - All string values must be properly JSON-escaped."
    )
}

// ---------------------------------------------------------------------------
// Slip image extraction
// ---------------------------------------------------------------------------

/// Prompt accompanying a parlay slip image.
pub fn build_slip_extraction_prompt() -> String {
    "Analyze the provided image, which is expected to be a sports betting parlay slip \
     or a list of sports bets. Extract the key details of each leg in the parlay.\n\
     \n\
     VERY IMPORTANT: Your entire response MUST be a single, valid JSON object. Do NOT \
     include any text, explanations, or markdown (like ```json) before or after this \
     JSON object.\n\
     \n\
     The JSON object should contain a single key \"parlayLegs\" whose value is an array \
     of objects, one per leg:\n\
     {\n\
     \x20 \"id\": \"legN\",\n\
     \x20 \"playerTeam\": \"Player Name or Team Name\",\n\
     \x20 \"stat\": \"Statistic type (e.g., Points, Rebounds, Moneyline, Spread)\",\n\
     \x20 \"condition\": \"Condition (e.g., Over, Under, To Win, or a spread like -2.5)\",\n\
     \x20 \"value\": \"Value (e.g., 27.5, +150, or empty if included in the condition)\"\n\
     }\n\
     \n\
     If a leg is an Over/Under bet on a player statistic, \"condition\" must be exactly \
     \"Over\" or \"Under\" and \"value\" must be the numeric threshold. Example: \
     \"LeBron James Over 27.5 Points\" becomes\n\
     { \"id\": \"leg1\", \"playerTeam\": \"LeBron James\", \"stat\": \"Points\", \
     \"condition\": \"Over\", \"value\": \"27.5\" }\n\
     \n\
     If a value is hard to read, note that in the field (e.g., \"value\": \"obscured\").\n\
     \n\
     If the image is unclear or not a parlay slip, return:\n\
     { \"parlayLegs\": [], \"error_message\": \"A short explanation.\" }\n\
     \n\
     All string values must be meticulously JSON-escaped: internal double quotes as \
     \\\", newlines as \\n, backslashes as \\\\."
        .to_string()
}

// ---------------------------------------------------------------------------
// Grounded parlay prediction
// ---------------------------------------------------------------------------

/// Build the prompt for a web-grounded prediction of an assembled parlay.
pub fn build_prediction_prompt(parlay_details: &str) -> String {
    format!(
        "You are an expert sports analyst AI. You have been provided with details of a \
         sports parlay. Your task is to:\n\
         1. USE YOUR WEB SEARCH CAPABILITIES (Google Search tool) to find relevant, \
         up-to-date context for each leg: injury reports, player status, recent form, \
         streaks, and head-to-head data.\n\
         2. Analyze the parlay in conjunction with what you find.\n\
         3. Predict the overall outcome of the parlay (HIT or MISS).\n\
         4. Provide a concise \"overall_summary\" of at most 3-4 short bullet points. \
         Each bullet MUST start with a hyphen (-) and end with a newline (\\n).\n\
         5. Provide actionable \"suggestions\" (2-3 bullets, same format) to improve the \
         parlay's chances, e.g. flipping a risky 'Over' to 'Under'. If the parlay is \
         truly elite and needs no changes, set \"suggestions\" to \"No suggestions.\" \
         (exact string).\n\
         6. Summarize the key contextual information you found (or could not find) in \
         \"context_summary\" (max 3-4 bullets, same format).\n\
         \n\
         PARLAY DETAILS:\n\
         {parlay_details}\n\
         \n\
         Respond in JSON with this structure. VERY IMPORTANT: your entire response MUST \
         be a single, valid JSON object with no text or markdown around it. All string \
         values must be properly escaped (internal quotes as \\\", newlines as \\n).\n\
         \n\
         {{\n\
         \x20 \"prediction\": \"HIT\" | \"MISS\" | \"INDETERMINATE\",\n\
         \x20 \"overall_summary\": \"- ...\\n\",\n\
         \x20 \"suggestions\": \"- ...\\n\",\n\
         \x20 \"context_summary\": \"- ...\\n\",\n\
         \x20 \"confidence_level\": \"High\" | \"Medium\" | \"Low\"\n\
         }}\n\
         \n\
         Be critical and insightful. Only output \"HIT\" when you are almost entirely \
         sure the parlay will hit AND there are no changes to be made. If you provide \
         any actionable suggestions, set prediction to \"MISS\". If the parlay details \
         are too vague or you lack sufficient data, set prediction to \"INDETERMINATE\"."
    )
}

/// Render an assembled parlay as the plain-text details block the prediction
/// prompt embeds.
pub fn format_parlay_details(legs: &[NormalizedProp], league_label: &str) -> String {
    let mut details = String::with_capacity(legs.len() * 64);
    for (index, leg) in legs.iter().enumerate() {
        details.push_str(&format!(
            "Leg {}: {} {} {} {} ({league_label}",
            index + 1,
            leg.player,
            leg.side.label(),
            leg.line,
            leg.stat.label(),
        ));
        if let Some(matchup) = &leg.matchup {
            details.push_str(&format!(", {matchup}"));
        }
        details.push_str(")\n");
    }
    details
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::{Side, StatLabel};

    #[test]
    fn daily_prompt_includes_count_date_and_league() {
        let prompt = build_daily_suggestions_prompt("Saturday, August 22, 2026", 14, "NBA");
        assert!(prompt.contains("14 player prop bets"));
        assert!(prompt.contains("Saturday, August 22, 2026"));
        assert!(prompt.contains("NBA"));
        assert!(prompt.contains("\"props\""));
        assert!(prompt.contains("single, valid JSON object"));
    }

    #[test]
    fn daily_prompt_names_the_canonical_stat_labels() {
        let prompt = build_daily_suggestions_prompt("today", 14, "NBA");
        for label in ["\"PRA\"", "\"3PT Made\"", "\"Points\"", "\"Steals\""] {
            assert!(prompt.contains(label), "prompt should offer {label}");
        }
    }

    #[test]
    fn slip_prompt_describes_leg_shape_and_error_path() {
        let prompt = build_slip_extraction_prompt();
        assert!(prompt.contains("\"parlayLegs\""));
        assert!(prompt.contains("\"playerTeam\""));
        assert!(prompt.contains("error_message"));
    }

    #[test]
    fn prediction_prompt_embeds_details_and_contract() {
        let prompt = build_prediction_prompt("Leg 1: LeBron James Over 27.5 Points (NBA)\n");
        assert!(prompt.contains("Leg 1: LeBron James Over 27.5 Points"));
        assert!(prompt.contains("\"INDETERMINATE\""));
        assert!(prompt.contains("Google Search tool"));
        assert!(prompt.contains("No suggestions."));
    }

    #[test]
    fn parlay_details_render_one_line_per_leg() {
        let legs = vec![
            NormalizedProp {
                id: "a".into(),
                player: "LeBron James".into(),
                stat: StatLabel::Points,
                line: "27.5".into(),
                side: Side::Over,
                confidence: Some(0.8),
                matchup: Some("LAL @ BOS".into()),
                reason: "r".into(),
            },
            NormalizedProp {
                id: "b".into(),
                player: "Nikola Jokic".into(),
                stat: StatLabel::Pra,
                line: "45.5".into(),
                side: Side::Under,
                confidence: None,
                matchup: None,
                reason: "r".into(),
            },
        ];
        let details = format_parlay_details(&legs, "NBA");
        assert!(details.contains("Leg 1: LeBron James Over 27.5 Points (NBA, LAL @ BOS)"));
        assert!(details.contains("Leg 2: Nikola Jokic Under 45.5 PRA (NBA)"));
    }
}
