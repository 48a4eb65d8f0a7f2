/// Scenario files — a scripted sequence of frames replayed through the engine.
///
/// ```toml
/// profile = "BRD"            # embedded profile key
/// # profile_file = "my.toml" # or a profile file next to the scenario
///
/// [[frames]]
/// dt    = 0.0
/// level = 90
/// [frames.world.player]
/// object_id  = 1
/// current_mp = 10000
/// ```
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{engine::FrameUpdate, profiles, registry::ActionRegistry};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub profile:      String,
    /// Relative paths resolve against the scenario file's directory.
    #[serde(default)]
    pub profile_file: Option<PathBuf>,
    #[serde(default)]
    pub frames:       Vec<FrameUpdate>,
}

impl Scenario {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| anyhow::anyhow!("Scenario parse error: {}", e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let mut scenario = Self::parse(&raw)?;
        if let (Some(file), Some(dir)) = (scenario.profile_file.as_mut(), path.parent()) {
            if file.is_relative() {
                *file = dir.join(&*file);
            }
        }
        Ok(scenario)
    }

    /// Registry for this scenario. `profile_file` wins over `profile`;
    /// `fallback` is used when neither is set.
    pub fn registry(&self, fallback: &str) -> Result<ActionRegistry> {
        let profile = match &self.profile_file {
            Some(file) => {
                let raw = std::fs::read_to_string(file)
                    .with_context(|| format!("reading profile {}", file.display()))?;
                profiles::parse(&raw)?
            }
            None => {
                let key = if self.profile.is_empty() { fallback } else { self.profile.as_str() };
                profiles::load(key)?
            }
        };
        Ok(profile.into_registry()?)
    }
}
