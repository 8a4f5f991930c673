//! # Engine Configuration
//!
//! Timing windows, lookahead and scoring for a play session, loadable from YAML.
//!
//! Every field has a default, so a config file only needs the values it changes:
//!
//! ```rust
//! use tja::EngineConfig;
//!
//! let config = EngineConfig::from_yaml_str("lookahead-beats: 6\nwindows:\n  perfect: 0.05\n").unwrap();
//!
//! assert_eq!(config.lookahead_beats, 6.0);
//! assert_eq!(config.windows.perfect, 0.05);
//! assert_eq!(config.windows.good, 0.133); // default
//! ```
//!
//! ## Invariants
//! `0 < perfect < good < bad <= miss-window`. The miss window is wider than the
//! Bad window so late hits stay possible right up to the miss boundary.

use crate::error::TjaError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Judgment tolerances in seconds, tightest first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JudgmentWindows {
    pub perfect: f64,
    pub good: f64,
    pub bad: f64,
}

impl Default for JudgmentWindows {
    fn default() -> Self {
        Self {
            perfect: 0.067,
            good: 0.133,
            bad: 0.217,
        }
    }
}

/// Points per judgment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScoreTable {
    pub perfect: u64,
    pub good: u64,
    /// Applied to hits on notes inside a gogo section
    pub gogo_multiplier: f64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            perfect: 100,
            good: 50,
            gogo_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Beats before arrival at which a note becomes active
    pub lookahead_beats: f64,
    /// Seconds after arrival at which an unhit note becomes a Miss
    pub miss_window: f64,
    /// Seconds a Bad or missed note stays on screen after the miss boundary
    pub decay_seconds: f64,
    pub windows: JudgmentWindows,
    pub scoring: ScoreTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_beats: 4.0,
            miss_window: 0.25,
            decay_seconds: 0.3,
            windows: JudgmentWindows::default(),
            scoring: ScoreTable::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a YAML config
    pub fn from_yaml_str(content: &str) -> Result<Self, TjaError> {
        let config: EngineConfig = if content.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| TjaError::Config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TjaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TjaError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), TjaError> {
        let w = &self.windows;
        let all_finite = [w.perfect, w.good, w.bad, self.miss_window, self.lookahead_beats, self.decay_seconds]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(TjaError::Config("timing values must be finite".to_string()));
        }
        if !(0.0 < w.perfect && w.perfect < w.good && w.good < w.bad) {
            return Err(TjaError::Config(format!(
                "windows must satisfy 0 < perfect < good < bad (got {} / {} / {})",
                w.perfect, w.good, w.bad
            )));
        }
        if self.miss_window < w.bad {
            return Err(TjaError::Config(format!(
                "miss-window ({}) must not be tighter than the bad window ({})",
                self.miss_window, w.bad
            )));
        }
        if self.lookahead_beats <= 0.0 {
            return Err(TjaError::Config("lookahead-beats must be positive".to_string()));
        }
        if self.decay_seconds < 0.0 {
            return Err(TjaError::Config("decay-seconds must not be negative".to_string()));
        }
        if !(self.scoring.gogo_multiplier.is_finite() && self.scoring.gogo_multiplier >= 0.0) {
            return Err(TjaError::Config("gogo-multiplier must be a non-negative number".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.perfect, 100);
        assert_eq!(config.scoring.good, 50);
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        assert_eq!(EngineConfig::from_yaml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
miss-window: 0.3
scoring:
  gogo-multiplier: 1.2
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.miss_window, 0.3);
        assert_eq!(config.scoring.gogo_multiplier, 1.2);
        assert_eq!(config.scoring.perfect, 100);
        assert_eq!(config.lookahead_beats, 4.0);
    }

    #[test]
    fn test_malformed_yaml() {
        let result = EngineConfig::from_yaml_str("windows: [1, 2");
        assert!(matches!(result, Err(TjaError::Config(_))));
    }

    #[test]
    fn test_unordered_windows_rejected() {
        let result = EngineConfig::from_yaml_str("windows:\n  perfect: 0.2\n  good: 0.1\n");
        assert!(matches!(result, Err(TjaError::Config(_))));
    }

    #[test]
    fn test_miss_window_tighter_than_bad_rejected() {
        let result = EngineConfig::from_yaml_str("miss-window: 0.1");
        assert!(matches!(result, Err(TjaError::Config(_))));
    }

    #[test]
    fn test_non_positive_lookahead_rejected() {
        let result = EngineConfig::from_yaml_str("lookahead-beats: 0");
        assert!(matches!(result, Err(TjaError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::load("/nonexistent/engine.yaml");
        assert!(matches!(result, Err(TjaError::Io { .. })));
    }
}
