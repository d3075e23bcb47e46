// Configuration loading and parsing (settings.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppSettings,
    pub ai: AiSettings,
    pub odds: OddsSettings,
    pub leagues: Vec<LeagueConfig>,
    pub credentials: CredentialsConfig,
}

impl Config {
    /// Leagues with an active prop feed.
    pub fn enabled_leagues(&self) -> impl Iterator<Item = &LeagueConfig> {
        self.leagues.iter().filter(|l| l.enabled)
    }
}

// ---------------------------------------------------------------------------
// settings.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire settings.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SettingsFile {
    app: AppSettings,
    ai: AiSettings,
    #[serde(default)]
    odds: OddsSettings,
    leagues: Vec<LeagueConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Path of the SQLite cache database.
    pub db_path: String,
    /// How many raw candidates to request from the AI per league per day.
    pub desired_count: u32,
    /// Bound on every outbound AI/odds call; expiry counts as a fetch
    /// failure.
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    pub text_model: String,
    pub vision_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OddsSettings {
    /// Upstream API root the odds relay forwards to. Both the odds and the
    /// scores products hang off this path.
    pub base_url: String,
}

impl Default for OddsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.sportsdata.io/v3/nba".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    /// Short identifier used in cache keys (e.g. "nba").
    pub id: String,
    /// Display label used in prompts and rendering (e.g. "NBA").
    pub label: String,
    #[serde(default)]
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub gemini_api_key: Option<String>,
    pub sportsdata_io_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/settings.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- settings.toml (required) ---
    let settings_path = config_dir.join("settings.toml");
    let settings_text = read_file(&settings_path)?;
    let settings: SettingsFile =
        toml::from_str(&settings_text).map_err(|e| ConfigError::ParseError {
            path: settings_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        app: settings.app,
        ai: settings.ai,
        odds: settings.odds,
        leagues: settings.leagues,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };

        // Skip .example template files
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // File already exists in config/, keep the user's copy.
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working
/// directory. Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.app.desired_count == 0 {
        return Err(ConfigError::ValidationError {
            field: "app.desired_count".into(),
            message: "must be greater than 0".into(),
        });
    }

    if !(1..=120).contains(&config.app.fetch_timeout_secs) {
        return Err(ConfigError::ValidationError {
            field: "app.fetch_timeout_secs".into(),
            message: format!(
                "must be between 1 and 120 seconds, got {}",
                config.app.fetch_timeout_secs
            ),
        });
    }

    if config.app.db_path.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "app.db_path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.leagues.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "leagues".into(),
            message: "at least one league must be configured".into(),
        });
    }

    for (i, league) in config.leagues.iter().enumerate() {
        if league.id.is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("leagues[{i}].id"),
                message: "must not be empty".into(),
            });
        }
        if league.label.is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("leagues[{i}].label"),
                message: "must not be empty".into(),
            });
        }
    }

    let mut ids: Vec<&str> = config.leagues.iter().map(|l| l.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != config.leagues.len() {
        return Err(ConfigError::ValidationError {
            field: "leagues".into(),
            message: "league ids must be unique".into(),
        });
    }

    if config.ai.text_model.is_empty() || config.ai.vision_model.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "ai.text_model".into(),
            message: "model identifiers must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
