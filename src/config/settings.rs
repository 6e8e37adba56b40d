//! Application settings loading from config.toml
//!
//! Settings cover how the commission report and network tree are displayed, the
//! display commission rate of each level, the members to seed the local network
//! with, and an optional commission-record snapshot to import on startup. Every
//! section is optional; a missing config.toml means defaults throughout.

use crate::{
    core::levels::{DEFAULT_LEVELS, LevelRates},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,
    /// Display commission rate per level
    #[serde(default = "default_rates")]
    pub rates: Vec<RateConfig>,
    /// Members to seed the network with
    #[serde(default)]
    pub members: Vec<MemberConfig>,
    /// JSON export of commission records to import on startup
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

/// How reports and trees are displayed
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Levels shown in the commission report
    #[serde(default = "default_levels")]
    pub levels: Vec<u32>,
    /// How long a node stays highlighted after its info panel is toggled
    #[serde(default = "default_highlight_ms")]
    pub highlight_ms: u64,
    /// Network depth fetched when a tree is first opened
    #[serde(default = "default_initial_levels")]
    pub initial_levels: u32,
    /// Size budget for a rendered tree message
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

/// Display rate for a single level
#[derive(Debug, Clone, Deserialize)]
pub struct RateConfig {
    /// Network level
    pub level: u32,
    /// Rate in `[0, 1]`
    pub percentage: f64,
}

/// A member to seed the local network with
#[derive(Debug, Clone, Deserialize)]
pub struct MemberConfig {
    /// Backend user id
    pub uid: String,
    /// Display name
    pub name: String,
    /// Uid of the referring member
    #[serde(default)]
    pub referrer: Option<String>,
}

fn default_levels() -> Vec<u32> {
    DEFAULT_LEVELS.to_vec()
}

const fn default_highlight_ms() -> u64 {
    1200
}

const fn default_initial_levels() -> u32 {
    1
}

const fn default_max_message_chars() -> usize {
    1900
}

fn default_rates() -> Vec<RateConfig> {
    vec![
        RateConfig {
            level: 1,
            percentage: 0.15,
        },
        RateConfig {
            level: 2,
            percentage: 0.05,
        },
        RateConfig {
            level: 3,
            percentage: 0.04,
        },
    ]
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            levels: default_levels(),
            highlight_ms: default_highlight_ms(),
            initial_levels: default_initial_levels(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            rates: default_rates(),
            members: Vec::new(),
            snapshot: None,
        }
    }
}

impl AppConfig {
    /// The configured rates as a lookup table.
    #[must_use]
    pub fn level_rates(&self) -> LevelRates {
        LevelRates::from_pairs(self.rates.iter().map(|r| (r.level, r.percentage)))
    }

    /// Highlight duration for toggled info panels.
    #[must_use]
    pub const fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.display.highlight_ms)
    }

    /// Checks values serde cannot check on its own.
    ///
    /// # Errors
    /// Returns an error if a rate is outside `[0, 1]`, no level is displayed, or the
    /// initial depth is zero.
    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self
            .rates
            .iter()
            .find(|r| !(0.0..=1.0).contains(&r.percentage))
        {
            return Err(Error::Config {
                message: format!(
                    "Rate for level {} must be between 0 and 1, got {}",
                    rate.level, rate.percentage
                ),
            });
        }
        if self.display.levels.is_empty() {
            return Err(Error::Config {
                message: "At least one level must be displayed".to_string(),
            });
        }
        if self.display.initial_levels == 0 {
            return Err(Error::Config {
                message: "initial_levels must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads and validates the configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value fails [`AppConfig::validate`]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    let config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration named by `CONFIG_PATH`, or ./config.toml.
///
/// A missing file is not an error: the defaults are used instead.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        info!("No configuration file at {}, using defaults", path);
        return Ok(AppConfig::default());
    }
    let config = load_config(&path)?;
    info!(
        "Loaded configuration from {} ({} seed members, {} rates)",
        path,
        config.members.len(),
        config.rates.len()
    );
    Ok(config)
}
