//! Configuration types for animation playback.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_frame_rate() -> u16 {
    30
}

fn default_max_catch_up_ticks() -> u32 {
    8
}

/// Playback controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Frame rate used when a file declares 0 frames per second.
    #[serde(default = "default_frame_rate")]
    pub default_frame_rate: u16,
    /// Replaces the frame rate declared in the file.
    #[serde(default)]
    pub frame_rate_override: Option<u16>,
    /// Replaces the loop flag declared in the file.
    #[serde(default)]
    pub loop_override: Option<bool>,
    /// Maximum ticks run by a single `advance` call. Backlog past this is dropped.
    #[serde(default = "default_max_catch_up_ticks")]
    pub max_catch_up_ticks: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_frame_rate: default_frame_rate(),
            frame_rate_override: None,
            loop_override: None,
            max_catch_up_ticks: default_max_catch_up_ticks(),
        }
    }
}

impl PlayerConfig {
    /// Effective frame rate for a file declaring `declared` fps.
    pub fn frame_rate(&self, declared: u16) -> u16 {
        match self.frame_rate_override {
            Some(fps) => fps,
            None if declared == 0 => self.default_frame_rate,
            None => declared,
        }
    }

    /// Tick interval (`1000 / fps` milliseconds) for a file declaring `declared` fps.
    pub fn frame_interval(&self, declared: u16) -> Duration {
        Duration::from_secs(1) / u32::from(self.frame_rate(declared).max(1))
    }

    /// Effective loop flag for a file declaring `declared`.
    pub fn looping(&self, declared: bool) -> bool {
        self.loop_override.unwrap_or(declared)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_frame_rate == 0 {
            return Err(ConfigError::InvalidDefaultFrameRate);
        }
        if self.frame_rate_override == Some(0) {
            return Err(ConfigError::InvalidFrameRateOverride);
        }
        if self.max_catch_up_ticks == 0 {
            return Err(ConfigError::InvalidCatchUp);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Default frame rate must be non-zero")]
    InvalidDefaultFrameRate,
    #[error("Frame rate override must be non-zero")]
    InvalidFrameRateOverride,
    #[error("Catch-up tick limit must be non-zero")]
    InvalidCatchUp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(PlayerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_frame_interval() {
        let config = PlayerConfig::default();
        assert_eq!(config.frame_interval(10), Duration::from_millis(100));
        assert_eq!(config.frame_interval(4), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_frame_rate_falls_back() {
        let config = PlayerConfig::default();
        assert_eq!(config.frame_rate(0), 30);
        assert_eq!(config.frame_rate(12), 12);
    }

    #[test]
    fn test_overrides() {
        let config = PlayerConfig {
            frame_rate_override: Some(5),
            loop_override: Some(true),
            ..Default::default()
        };
        assert_eq!(config.frame_rate(60), 5);
        assert!(config.looping(false));
        assert!(!PlayerConfig::default().looping(false));
    }

    #[test]
    fn test_invalid_configs() {
        let config = PlayerConfig {
            max_catch_up_ticks: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidCatchUp)));

        let config = PlayerConfig {
            frame_rate_override: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFrameRateOverride)
        ));
    }

    #[test]
    fn test_serialization() {
        let parsed: PlayerConfig = serde_json::from_str(r#"{"loop_override": true}"#).unwrap();
        assert_eq!(parsed.default_frame_rate, 30);
        assert_eq!(parsed.loop_override, Some(true));
        assert_eq!(parsed.max_catch_up_ticks, 8);

        let json = serde_json::to_string(&PlayerConfig::default()).unwrap();
        let roundtrip: PlayerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, PlayerConfig::default());
    }
}
