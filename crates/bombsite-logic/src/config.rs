//! Host-tunable AI configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid config. Hosts typically load this once at startup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse AI config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid AI config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Maximum line-of-sight distance.
    pub sight_range: f32,
    /// Radius of a smoke volume for LOS purposes.
    pub smoke_radius: f32,
    /// Rounds between counter-strategy recomputations.
    pub analysis_interval: u32,
    /// When false every `track_*` call and pattern analysis is a no-op.
    pub learning_enabled: bool,
    /// Per-match reaction/accuracy jitter. Disable for deterministic tests.
    pub jitter_enabled: bool,
    /// Lower bound on the think interval regardless of profile.
    pub think_floor_ms: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            sight_range: 600.0,
            smoke_radius: 80.0,
            analysis_interval: 2,
            learning_enabled: true,
            jitter_enabled: true,
            think_floor_ms: 50.0,
        }
    }
}

impl AiConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AiConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sight_range > 0.0) {
            return Err(ConfigError::Invalid {
                field: "sight_range",
                reason: format!("must be positive, got {}", self.sight_range),
            });
        }
        if self.smoke_radius < 0.0 {
            return Err(ConfigError::Invalid {
                field: "smoke_radius",
                reason: format!("must be non-negative, got {}", self.smoke_radius),
            });
        }
        if self.analysis_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "analysis_interval",
                reason: "must be at least 1".into(),
            });
        }
        if self.think_floor_ms < 0.0 {
            return Err(ConfigError::Invalid {
                field: "think_floor_ms",
                reason: format!("must be non-negative, got {}", self.think_floor_ms),
            });
        }
        Ok(())
    }

    /// Deterministic variant used by tests and replays.
    pub fn deterministic() -> Self {
        Self {
            jitter_enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        let config = AiConfig::from_json("{}").unwrap();
        assert_eq!(config, AiConfig::default());
        assert_eq!(config.sight_range, 600.0);
        assert_eq!(config.analysis_interval, 2);
    }

    #[test]
    fn partial_json_overrides() {
        let config = AiConfig::from_json(r#"{"analysis_interval": 3, "jitter_enabled": false}"#)
            .unwrap();
        assert_eq!(config.analysis_interval, 3);
        assert!(!config.jitter_enabled);
        assert_eq!(config.smoke_radius, 80.0);
    }

    #[test]
    fn zero_interval_rejected() {
        let err = AiConfig::from_json(r#"{"analysis_interval": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "analysis_interval",
                ..
            }
        ));
    }

    #[test]
    fn negative_range_rejected() {
        let err = AiConfig::from_json(r#"{"sight_range": -1.0}"#).unwrap_err();
        assert!(err.to_string().contains("sight_range"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = AiConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
