//! Monitoring configuration.
//!
//! Every threshold the core compares against lives here as a named,
//! overridable value. The defaults reproduce the behavior of the reference
//! deployment; none of them are derived quantities, so they are plain
//! constants rather than computed at startup.

use crate::error::{FairlensError, Result};
use serde::{Deserialize, Serialize};

/// Fairness pass/fail thresholds per metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessThresholds {
    /// Minimum Disparate Impact Ratio (EEOC four-fifths rule).
    pub dir: f64,
    /// Maximum absolute Statistical Parity Difference.
    pub spd: f64,
    /// Maximum absolute Equal Opportunity Difference.
    pub eod: f64,
    /// Maximum absolute Average Odds Difference.
    pub aod: f64,
    /// Maximum Theil index (entropy inequality cutoff).
    pub theil: f64,
}

impl Default for FairnessThresholds {
    fn default() -> Self {
        Self { dir: 0.8, spd: 0.1, eod: 0.1, aod: 0.1, theil: 0.15 }
    }
}

impl FairnessThresholds {
    /// Read thresholds from the environment, falling back to defaults.
    ///
    /// Variables: `FAIRLENS_DIR_THRESHOLD`, `FAIRLENS_SPD_THRESHOLD`,
    /// `FAIRLENS_EOD_THRESHOLD`, `FAIRLENS_AOD_THRESHOLD`,
    /// `FAIRLENS_THEIL_THRESHOLD`.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            dir: env_f64("FAIRLENS_DIR_THRESHOLD", d.dir),
            spd: env_f64("FAIRLENS_SPD_THRESHOLD", d.spd),
            eod: env_f64("FAIRLENS_EOD_THRESHOLD", d.eod),
            aod: env_f64("FAIRLENS_AOD_THRESHOLD", d.aod),
            theil: env_f64("FAIRLENS_THEIL_THRESHOLD", d.theil),
        }
    }

    /// Validate threshold ranges.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("dir", self.dir),
            ("spd", self.spd),
            ("eod", self.eod),
            ("aod", self.aod),
            ("theil", self.theil),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FairlensError::validation(
                    name,
                    format!("threshold must be a positive finite number, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Drift analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Number of recent checks a trend window spans.
    pub window_size: usize,
    /// Half-window mean difference below which a trend counts as stable.
    pub trend_sensitivity: f64,
    /// How far above the DIR threshold the moving average may sit while a
    /// declining trend still raises a pre-alert.
    pub pre_alert_margin: f64,
    /// Velocity below which retraining is recommended (DIR per check).
    pub velocity_threshold: f64,
    /// Acceleration below which retraining is recommended.
    pub acceleration_threshold: f64,
    /// Minimum half-slope difference that counts as acceleration.
    pub acceleration_epsilon: f64,
    /// Forecast horizon in checks.
    pub forecast_horizon: usize,
    /// z value for the confidence interval around the moving average.
    pub confidence_z: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            trend_sensitivity: 0.05,
            pre_alert_margin: 0.1,
            velocity_threshold: -0.01,
            acceleration_threshold: -0.005,
            acceleration_epsilon: 1e-6,
            forecast_horizon: 5,
            confidence_z: 1.96,
        }
    }
}

impl DriftConfig {
    /// Read drift settings from the environment, falling back to defaults.
    ///
    /// Variables: `FAIRLENS_DRIFT_WINDOW_SIZE`,
    /// `FAIRLENS_DRIFT_VELOCITY_THRESHOLD`,
    /// `FAIRLENS_DRIFT_ACCELERATION_THRESHOLD`.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            window_size: env_usize("FAIRLENS_DRIFT_WINDOW_SIZE", d.window_size),
            velocity_threshold: env_f64("FAIRLENS_DRIFT_VELOCITY_THRESHOLD", d.velocity_threshold),
            acceleration_threshold: env_f64(
                "FAIRLENS_DRIFT_ACCELERATION_THRESHOLD",
                d.acceleration_threshold,
            ),
            ..d
        }
    }

    /// Validate drift settings.
    pub fn validate(&self) -> Result<()> {
        if self.window_size < 2 {
            return Err(FairlensError::validation(
                "window_size",
                format!("window must cover at least 2 checks, got {}", self.window_size),
            ));
        }
        if !(self.trend_sensitivity > 0.0 && self.trend_sensitivity.is_finite()) {
            return Err(FairlensError::validation(
                "trend_sensitivity",
                format!("must be a positive finite number, got {}", self.trend_sensitivity),
            ));
        }
        if self.forecast_horizon == 0 {
            return Err(FairlensError::validation(
                "forecast_horizon",
                "horizon of zero produces no forecast",
            ));
        }
        Ok(())
    }
}

/// Complete monitor configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub thresholds: FairnessThresholds,
    pub drift: DriftConfig,
}

impl MonitorConfig {
    /// Read the full configuration from the environment.
    pub fn from_env() -> Self {
        Self { thresholds: FairnessThresholds::from_env(), drift: DriftConfig::from_env() }
    }

    /// Validate all settings.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.drift.validate()
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_follow_eeoc_rule() {
        let t = FairnessThresholds::default();
        assert!((t.dir - 0.8).abs() < f64::EPSILON);
        assert!((t.spd - 0.1).abs() < f64::EPSILON);
        assert!((t.theil - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_drift_config() {
        let d = DriftConfig::default();
        assert_eq!(d.window_size, 10);
        assert!((d.trend_sensitivity - 0.05).abs() < f64::EPSILON);
        assert_eq!(d.forecast_horizon, 5);
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let t = FairnessThresholds { dir: -0.8, ..Default::default() };
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_degenerate_window() {
        let d = DriftConfig { window_size: 1, ..Default::default() };
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_monitor_config_default_is_valid() {
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = MonitorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: MonitorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
