/// Engine configuration — persisted as `config.toml` in a caller-chosen directory.
///
/// Missing keys fall back to the defaults below, so an empty file is valid.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::status::{ObjectId, ENVIRONMENT_SOURCE};

// ---------------------------------------------------------------------------
// Rule thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// A debuff with more than this many seconds left is "fresh" and is not
    /// reapplied.
    #[serde(default = "default_refresh_window")]
    pub debuff_refresh_window: f32,

    /// Source id the game uses for environment-applied statuses.
    #[serde(default = "default_environment_source")]
    pub environment_source: ObjectId,
}

fn default_refresh_window() -> f32 { 3.0 }
fn default_environment_source() -> ObjectId { ENVIRONMENT_SOURCE }

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            debuff_refresh_window: default_refresh_window(),
            environment_source:    default_environment_source(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cooldown display options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStyle {
    /// Shaded overlay sweeping across the icon for the regenerating charge.
    #[default]
    Overlay,
    /// The game's own cooldown dial, filled by total progress.
    Original,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Non-ability actions with a recast under this many seconds are not
    /// visualized.
    #[serde(default = "default_skip_threshold")]
    pub skip_threshold: f32,

    /// Include GCD (non-ability) actions in the cooldown list.
    #[serde(default)]
    pub show_gcd_cooldown: bool,

    #[serde(default)]
    pub style: DisplayStyle,
}

fn default_skip_threshold() -> f32 { 3.0 }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            skip_threshold:    default_skip_threshold(),
            show_gcd_cooldown: false,
            style:             DisplayStyle::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rotation profile key used when a scenario names none.
    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default)]
    pub rules:   RuleConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_profile() -> String { "WHM".to_owned() }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            rules:   RuleConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

pub fn load_or_default(config_dir: &Path) -> Result<EngineConfig> {
    let path = config_dir.join("config.toml");
    if path.exists() {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg: EngineConfig = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Config parse error: {}", e))?;
        Ok(cfg)
    } else {
        tracing::debug!("No config at {:?}, using defaults", path);
        Ok(EngineConfig::default())
    }
}

pub fn save(config: &EngineConfig, config_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(config_dir)?;
    let raw = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("Config serialize error: {}", e))?;
    std::fs::write(config_dir.join("config.toml"), raw)?;
    Ok(())
}
