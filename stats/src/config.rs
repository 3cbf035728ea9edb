use std::env;

use serde::Deserialize;
use thiserror::Error;

/// Frames an opponent may spend actionable before an open punish is
/// considered over.
pub const PUNISH_RESET_FRAMES: u32 = 45;

#[derive(Debug, Error)]
pub enum StatsConfigError {
    #[error("Failed to parse stats config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for the analytics passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsConfig {
    pub punish_reset_frames: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            punish_reset_frames: PUNISH_RESET_FRAMES,
        }
    }
}

/// A partially specified config, as read from a file or the environment.
/// Unset fields leave the base value alone when merged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StatsConfigOverrides {
    pub punish_reset_frames: Option<u32>,
}

impl StatsConfig {
    /// Merges `overrides` on top of this config. Values in `overrides` take precedence.
    pub fn merge(self, overrides: StatsConfigOverrides) -> Self {
        Self {
            punish_reset_frames: overrides.punish_reset_frames.unwrap_or(self.punish_reset_frames),
        }
    }

    /// Defaults, overridden by anything set in the `contents` TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, StatsConfigError> {
        let overrides: StatsConfigOverrides = toml::from_str(contents)?;
        Ok(Self::default().merge(overrides))
    }

    /// Defaults, overridden by `SLIPPI_PUNISH_RESET_FRAMES` when it's set to a
    /// valid number.
    pub fn from_env() -> Self {
        let punish_reset_frames = env::var("SLIPPI_PUNISH_RESET_FRAMES")
            .ok()
            .and_then(|value| value.trim().parse().ok());

        Self::default().merge(StatsConfigOverrides { punish_reset_frames })
    }
}
