// PickVision entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Ensure and load config
// 3. Open the daily prop cache
// 4. Build the AI client (active or disabled) from credentials
// 5. Load and render one board per enabled league, plus parlay presets

use pickvision::ai::AiClient;
use pickvision::cache::PropCache;
use pickvision::config;
use pickvision::daily::{
    DailyBoard, DailyBoardService, FeedError, EMPTY_BOARD_MESSAGE, TECHNICAL_MESSAGE,
};
use pickvision::props::{assemble_parlay, ParlaySize};

use anyhow::Context;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("PickVision starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        leagues = config.leagues.len(),
        enabled = config.enabled_leagues().count(),
        "config loaded"
    );

    let cache = PropCache::open(&config.app.db_path).context("failed to open prop cache")?;
    info!("prop cache opened at {}", config.app.db_path);

    let ai = AiClient::from_config(&config);
    match &ai {
        AiClient::Active(_) => info!("AI client initialized (API key configured)"),
        AiClient::Disabled => info!("AI client disabled (no API key)"),
    }

    let service = DailyBoardService::new(&ai, &cache, config.app.desired_count);

    for league in config.enabled_leagues() {
        match service.load_board(league).await {
            Ok(board) => {
                print!("{}", render_board(&board));
                print!("{}", render_parlays(&board));
            }
            Err(FeedError::Technical { detail }) => {
                warn!(league = %league.id, detail = %detail, "technical failure loading board");
                println!("== {} ==", league.label);
                println!("Technical Difficulties");
                println!("{TECHNICAL_MESSAGE}");
                println!("Please check back soon. Your data is safe.");
                println!();
            }
            Err(e) => {
                println!("== {} ==", league.label);
                println!("{e}");
                println!();
            }
        }
    }

    info!("PickVision finished");
    Ok(())
}

/// Render one league's ranked board.
fn render_board(board: &DailyBoard) -> String {
    let mut out = String::new();
    out.push_str(&format!("== Top 10 {} Props (Daily) ==\n", board.league_label));
    out.push_str(&format!("Updated daily: {}\n", board.last_updated()));

    if board.props.is_empty() {
        out.push_str(EMPTY_BOARD_MESSAGE);
        out.push_str("\n\n");
        return out;
    }

    for (index, prop) in board.props.iter().enumerate() {
        let confidence = match prop.confidence {
            Some(c) => format!("{}%", (c * 100.0).round() as i64),
            None => "n/a".to_string(),
        };
        out.push_str(&format!(
            "{:>2}. {} {} {} {}  [{}]",
            index + 1,
            prop.player,
            prop.side,
            prop.line,
            prop.stat,
            confidence,
        ));
        if let Some(matchup) = &prop.matchup {
            out.push_str(&format!("  {matchup}"));
        }
        out.push('\n');
        out.push_str(&format!("    {}\n", prop.reason));
    }
    out.push('\n');
    out
}

/// Render the parlay presets built from the top of the board.
fn render_parlays(board: &DailyBoard) -> String {
    if board.props.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("-- {} parlay presets --\n", board.league_label));
    for size in ParlaySize::ALL {
        let legs = assemble_parlay(&board.props, size);
        if legs.is_empty() {
            continue;
        }
        let summary: Vec<String> = legs
            .iter()
            .map(|leg| format!("{} {} {} {}", leg.player, leg.side, leg.line, leg.stat))
            .collect();
        out.push_str(&format!("{}-leg: {}\n", size.legs(), summary.join(" | ")));
    }
    out.push('\n');
    out
}

/// Initialize tracing to stderr, leaving stdout to the rendered boards.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pickvision=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
