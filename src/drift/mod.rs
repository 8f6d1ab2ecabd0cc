//! Drift trend analysis and forecasting.
//!
//! The monitor reads an ordered window of recent records and turns the DIR
//! series into trend direction, velocity/acceleration, a threshold-breach
//! forecast, and an early-warning pre-alert that fires before any single
//! check crosses the threshold. It never mutates history.
//!
//! Short windows degrade gracefully: statistics are computed over whatever
//! exists and the result is flagged low-confidence. Only a zero-record
//! history produces the explicit no-data forms.

mod stats;

pub use stats::{mean, median, regression_slope, sample_std, standard_error};

use crate::config::DriftConfig;
use crate::error::Result;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Minimum points for velocity, acceleration, and forecasting.
const MIN_POINTS_FOR_VELOCITY: usize = 3;
/// Minimum points for the half-window trend comparison.
const MIN_POINTS_FOR_TREND: usize = 4;
/// Per-step decay of forecast confidence.
const FORECAST_CONFIDENCE_DECAY: f64 = 0.15;

/// Direction of the DIR series over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
    /// No data available to judge a direction.
    Unknown,
}

/// Severity attached to pre-alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    None,
    Low,
    Medium,
    High,
}

/// Forecast-driven classification, evaluated in strict priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftPrediction {
    Safe,
    Caution,
    Warning,
    Critical,
    /// Not enough history to classify.
    Unknown,
}

/// Moving statistics over the trend window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub average_dir: Option<f64>,
    pub median_dir: Option<f64>,
    pub min_dir: Option<f64>,
    pub max_dir: Option<f64>,
    pub trend_direction: TrendDirection,
    /// Records in the window whose evaluation raised an alert.
    pub alert_count: usize,
    /// Records actually analyzed.
    pub data_points: usize,
    /// Window size that was requested.
    pub requested_window: usize,
    /// Set when fewer than the requested window records exist.
    pub low_confidence: bool,
    /// DIR values oldest to newest.
    pub dir_values: Vec<f64>,
}

impl TrendSummary {
    fn no_data(requested_window: usize) -> Self {
        Self {
            average_dir: None,
            median_dir: None,
            min_dir: None,
            max_dir: None,
            trend_direction: TrendDirection::Unknown,
            alert_count: 0,
            data_points: 0,
            requested_window,
            low_confidence: true,
            dir_values: Vec::new(),
        }
    }
}

/// Interval around the moving average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    /// z value used to scale the standard error.
    pub z: f64,
}

/// Full drift analysis over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysis {
    /// Latest DIR value in the window.
    pub current_dir: Option<f64>,
    pub average_dir: Option<f64>,
    pub trend_direction: TrendDirection,
    /// Least-squares DIR change per check.
    pub velocity: Option<f64>,
    /// Recent-half slope minus earlier-half slope.
    pub acceleration: Option<f64>,
    /// True when the acceleration shares the velocity's sign and exceeds
    /// epsilon: the decline is speeding up, not just continuing.
    pub is_accelerating: bool,
    pub confidence_interval: Option<ConfidenceInterval>,
    /// Heuristic certainty in `[0, 1]`: `1 - clamp(stderr / mean, 0, 1)`.
    pub confidence: f64,
    /// Checks until the DIR threshold at current velocity, when declining
    /// and still above it.
    pub estimated_checks_to_threshold: Option<u64>,
    pub prediction: DriftPrediction,
    pub risk: Option<RiskAssessment>,
    pub data_points: usize,
    pub low_confidence: bool,
}

/// Early-warning signal raised before the threshold is breached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreAlert {
    /// True when the window average is below threshold, or declining and
    /// within the configured margin of it.
    pub pre_alert: bool,
    pub current_avg: Option<f64>,
    pub trend: TrendDirection,
    pub severity: AlertSeverity,
    pub message: String,
    pub recommendation: String,
    pub data_points: usize,
}

/// One extrapolated forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastStep {
    /// Checks ahead of the window's last record (1-based).
    pub step: usize,
    pub predicted_dir: f64,
    pub below_threshold: bool,
    /// Confidence decaying with distance, clamped to `[0.1, 1.0]`.
    pub confidence: f64,
}

/// Linear extrapolation of the DIR series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftForecast {
    /// Empty when fewer than three records exist.
    pub steps: Vec<ForecastStep>,
    pub current_dir: Option<f64>,
    pub velocity: Option<f64>,
    pub will_breach_threshold: bool,
    pub breach_at_step: Option<usize>,
    pub horizon: usize,
    pub data_points: usize,
}

/// Weighted drift risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Probabilistic risk score combining proximity, velocity, and
/// acceleration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Weighted score in `[0, 1]`.
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub needs_retraining: bool,
    pub distance_to_threshold: f64,
    pub velocity_risk: f64,
    pub acceleration_risk: f64,
    pub recommendation: String,
}

/// Read-only analytics over the audit history.
pub struct DriftMonitor {
    store: Arc<dyn RecordStore>,
    config: DriftConfig,
    dir_threshold: f64,
}

impl DriftMonitor {
    /// Monitor over the given store.
    pub fn new(store: Arc<dyn RecordStore>, config: DriftConfig, dir_threshold: f64) -> Self {
        Self { store, config, dir_threshold }
    }

    /// The drift settings in effect.
    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    /// Moving statistics over the last `window` checks.
    pub fn trend(&self, window: usize, model_name: Option<&str>) -> Result<TrendSummary> {
        let (values, alert_count) = self.dir_series(window, model_name)?;
        Ok(self.trend_from_values(&values, alert_count, window))
    }

    /// Full drift analysis over the last `window` checks.
    pub fn analysis(&self, window: usize, model_name: Option<&str>) -> Result<DriftAnalysis> {
        let (values, alert_count) = self.dir_series(window, model_name)?;
        let summary = self.trend_from_values(&values, alert_count, window);
        let n = values.len();

        if n == 0 {
            return Ok(DriftAnalysis {
                current_dir: None,
                average_dir: None,
                trend_direction: TrendDirection::Unknown,
                velocity: None,
                acceleration: None,
                is_accelerating: false,
                confidence_interval: None,
                confidence: 0.0,
                estimated_checks_to_threshold: None,
                prediction: DriftPrediction::Unknown,
                risk: None,
                data_points: 0,
                low_confidence: true,
            });
        }

        let current = values[n - 1];
        let average = summary.average_dir.unwrap_or(current);
        let velocity = if n >= MIN_POINTS_FOR_VELOCITY {
            regression_slope(&values)
        } else {
            None
        };
        let acceleration = self.acceleration(&values);
        let is_accelerating = match (velocity, acceleration) {
            (Some(v), Some(a)) => {
                a.abs() > self.config.acceleration_epsilon && a.signum() == v.signum()
            }
            _ => false,
        };

        let stderr = standard_error(&values);
        let confidence_interval = (n >= 2).then(|| ConfidenceInterval {
            lower: average - self.config.confidence_z * stderr,
            upper: average + self.config.confidence_z * stderr,
            z: self.config.confidence_z,
        });
        let confidence = if average > 0.0 {
            1.0 - (stderr / average).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let estimated = estimated_checks_to_threshold(current, velocity, self.dir_threshold);

        let prediction = if n < MIN_POINTS_FOR_VELOCITY {
            DriftPrediction::Unknown
        } else if current < self.dir_threshold {
            DriftPrediction::Critical
        } else if summary.trend_direction == TrendDirection::Down
            && estimated.is_some_and(|checks| checks <= 5)
        {
            DriftPrediction::Warning
        } else if summary.trend_direction == TrendDirection::Down {
            DriftPrediction::Caution
        } else {
            DriftPrediction::Safe
        };

        let risk = velocity.map(|v| {
            self.risk(v, acceleration.unwrap_or(0.0), current)
        });

        Ok(DriftAnalysis {
            current_dir: Some(current),
            average_dir: Some(average),
            trend_direction: summary.trend_direction,
            velocity,
            acceleration,
            is_accelerating,
            confidence_interval,
            confidence,
            estimated_checks_to_threshold: estimated,
            prediction,
            risk,
            data_points: n,
            low_confidence: summary.low_confidence,
        })
    }

    /// Early warning: fires while every individual check is still above
    /// threshold, as soon as the declining average enters the margin.
    pub fn pre_alert(
        &self,
        threshold: f64,
        window: usize,
        model_name: Option<&str>,
    ) -> Result<PreAlert> {
        let summary = self.trend(window, model_name)?;

        let Some(avg) = summary.average_dir else {
            return Ok(PreAlert {
                pre_alert: false,
                current_avg: None,
                trend: TrendDirection::Unknown,
                severity: AlertSeverity::None,
                message: "No history available for pre-alert analysis".into(),
                recommendation: "Run fairness checks to build a baseline".into(),
                data_points: 0,
            });
        };

        let trend = summary.trend_direction;
        let (pre_alert, severity, message, recommendation) = if avg < threshold {
            (
                true,
                AlertSeverity::High,
                format!(
                    "Average DIR {avg:.3} is below threshold {threshold}; {} alerts in the last {} checks",
                    summary.alert_count, summary.data_points
                ),
                "Immediate model review required: fairness threshold violated".to_string(),
            )
        } else if trend == TrendDirection::Down && avg < threshold + self.config.pre_alert_margin {
            (
                true,
                AlertSeverity::Medium,
                format!(
                    "Fairness degrading: average DIR {avg:.3} is declining toward threshold {threshold}"
                ),
                "Monitor closely and prepare model retraining if the trend continues".to_string(),
            )
        } else if trend == TrendDirection::Down {
            (
                false,
                AlertSeverity::Low,
                format!("Average DIR {avg:.3} is declining but still clear of the threshold"),
                "Investigate data quality and model inputs".to_string(),
            )
        } else {
            (
                false,
                AlertSeverity::None,
                format!("Average DIR {avg:.3} is above threshold and not declining"),
                "Continue regular monitoring".to_string(),
            )
        };

        Ok(PreAlert {
            pre_alert,
            current_avg: Some(avg),
            trend,
            severity,
            message,
            recommendation,
            data_points: summary.data_points,
        })
    }

    /// Linear extrapolation of the DIR series `horizon` checks ahead.
    pub fn forecast(
        &self,
        window: usize,
        horizon: usize,
        model_name: Option<&str>,
    ) -> Result<DriftForecast> {
        let (values, _) = self.dir_series(window, model_name)?;
        let n = values.len();

        if n < MIN_POINTS_FOR_VELOCITY {
            return Ok(DriftForecast {
                steps: Vec::new(),
                current_dir: values.last().copied(),
                velocity: None,
                will_breach_threshold: false,
                breach_at_step: None,
                horizon,
                data_points: n,
            });
        }

        let current = values[n - 1];
        let velocity = regression_slope(&values).unwrap_or(0.0);
        let base_confidence = (n as f64 / 20.0).min(1.0);

        let mut steps = Vec::with_capacity(horizon);
        let mut breach_at_step = None;
        for step in 1..=horizon {
            let predicted = current + velocity * step as f64;
            let below = predicted < self.dir_threshold;
            if below && breach_at_step.is_none() {
                breach_at_step = Some(step);
            }
            let decay = (-FORECAST_CONFIDENCE_DECAY * step as f64).exp();
            steps.push(ForecastStep {
                step,
                predicted_dir: predicted,
                below_threshold: below,
                confidence: (base_confidence * decay).clamp(0.1, 1.0),
            });
        }

        Ok(DriftForecast {
            steps,
            current_dir: Some(current),
            velocity: Some(velocity),
            will_breach_threshold: breach_at_step.is_some(),
            breach_at_step,
            horizon,
            data_points: n,
        })
    }

    /// Weighted risk score from drift dynamics. Pure computation.
    ///
    /// Weights 0.4 (threshold proximity), 0.35 (velocity), 0.25
    /// (acceleration); only downward motion contributes.
    pub fn risk(&self, velocity: f64, acceleration: f64, current: f64) -> RiskAssessment {
        let distance = current - self.dir_threshold;
        let velocity_risk = if velocity < 0.0 { velocity.abs() } else { 0.0 };
        let acceleration_risk = if acceleration < 0.0 { acceleration.abs() } else { 0.0 };

        // The proximity term goes negative beyond 0.2 above the threshold,
        // discounting velocity noise for comfortably fair models; only the
        // final score is clamped.
        let score = 0.4 * (1.0 - distance.max(0.0) / 0.2)
            + 0.35 * (velocity_risk * 10.0).min(1.0)
            + 0.25 * (acceleration_risk * 20.0).min(1.0);
        let risk_score = score.clamp(0.0, 1.0);

        let risk_level = if risk_score >= 0.7 {
            RiskLevel::High
        } else if risk_score >= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let needs_retraining = velocity < self.config.velocity_threshold
            || acceleration < self.config.acceleration_threshold
            || current < self.dir_threshold;

        let recommendation = match (risk_level, needs_retraining) {
            (RiskLevel::High, true) => {
                "Immediate model retraining required: bias drift is accelerating".to_string()
            }
            (RiskLevel::High, false) => {
                "High risk: monitor closely and consider retraining if the trend continues"
                    .to_string()
            }
            (RiskLevel::Medium, true) => {
                "Model retraining recommended within 48 hours to prevent bias escalation"
                    .to_string()
            }
            (RiskLevel::Medium, false) => {
                "Medium risk: increase monitoring frequency and review feature distributions"
                    .to_string()
            }
            (RiskLevel::Low, _) => {
                "System operating within acceptable fairness parameters".to_string()
            }
        };

        RiskAssessment {
            risk_score,
            risk_level,
            needs_retraining,
            distance_to_threshold: distance,
            velocity_risk,
            acceleration_risk,
            recommendation,
        }
    }

    fn trend_from_values(
        &self,
        values: &[f64],
        alert_count: usize,
        requested_window: usize,
    ) -> TrendSummary {
        if values.is_empty() {
            return TrendSummary::no_data(requested_window);
        }

        let direction = if values.len() >= MIN_POINTS_FOR_TREND {
            let mid = values.len() / 2;
            let first = mean(&values[..mid]).unwrap_or(0.0);
            let second = mean(&values[mid..]).unwrap_or(0.0);
            let difference = second - first;
            if difference < -self.config.trend_sensitivity {
                TrendDirection::Down
            } else if difference > self.config.trend_sensitivity {
                TrendDirection::Up
            } else {
                TrendDirection::Stable
            }
        } else {
            TrendDirection::Stable
        };

        TrendSummary {
            average_dir: mean(values),
            median_dir: median(values),
            min_dir: values.iter().copied().reduce(f64::min),
            max_dir: values.iter().copied().reduce(f64::max),
            trend_direction: direction,
            alert_count,
            data_points: values.len(),
            requested_window,
            low_confidence: values.len() < requested_window,
            dir_values: values.to_vec(),
        }
    }

    /// Slope over the recent half minus slope over the earlier half.
    fn acceleration(&self, values: &[f64]) -> Option<f64> {
        if values.len() < MIN_POINTS_FOR_TREND {
            return None;
        }
        let mid = values.len() / 2;
        let early = regression_slope(&values[..mid])?;
        let recent = regression_slope(&values[mid..])?;
        Some(recent - early)
    }

    /// DIR series for the last `window` checks, oldest first, with the
    /// number of alerting records.
    fn dir_series(&self, window: usize, model_name: Option<&str>) -> Result<(Vec<f64>, usize)> {
        let records = match model_name {
            None => self.store.tail(window)?,
            Some(name) => {
                let len = self.store.len()?;
                if len == 0 {
                    Vec::new()
                } else {
                    let mut matching: Vec<_> = self
                        .store
                        .range(0, len - 1)?
                        .into_iter()
                        .filter(|r| r.model_name == name)
                        .collect();
                    let skip = matching.len().saturating_sub(window);
                    matching.split_off(skip)
                }
            }
        };

        let alert_count = records.iter().filter(|r| r.alert).count();
        let values = records.iter().filter_map(|r| r.dir_value()).collect();
        Ok((values, alert_count))
    }
}

fn estimated_checks_to_threshold(current: f64, velocity: Option<f64>, threshold: f64) -> Option<u64> {
    let velocity = velocity?;
    if velocity < 0.0 && current > threshold {
        Some(((current - threshold) / velocity.abs()).ceil() as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::AuditChain;
    use crate::metrics::{EvaluationInput, MetricsEngine};
    use crate::record::RecordDraft;
    use crate::store::MemoryStore;

    /// Chain + monitor whose DIR series equals `dirs` (privileged approval
    /// rate is pinned at 1.0, so DIR == protected rate).
    fn monitor_over(dirs: &[f64]) -> DriftMonitor {
        monitor_over_models(&dirs.iter().map(|&d| ("loan_v1", d)).collect::<Vec<_>>())
    }

    fn monitor_over_models(series: &[(&str, f64)]) -> DriftMonitor {
        let store = Arc::new(MemoryStore::new());
        let chain = AuditChain::new(store.clone());
        let engine = MetricsEngine::default();
        for (model, dir) in series {
            let approved = (dir * 1000.0).round() as u32;
            let input = EvaluationInput::from_counts(*model, (approved, 1000), (1000, 1000));
            let report = engine.evaluate(&input);
            let draft = RecordDraft::from_report(*model, 2000, 0.0, &report, None);
            chain.append(draft).unwrap();
        }
        DriftMonitor::new(store, DriftConfig::default(), 0.8)
    }

    #[test]
    fn test_declining_series_trends_down() {
        let dirs: Vec<f64> = (0..10).map(|i| 1.01 - 0.02 * f64::from(i)).collect();
        let monitor = monitor_over(&dirs);
        let analysis = monitor.analysis(10, None).unwrap();

        assert_eq!(analysis.trend_direction, TrendDirection::Down);
        assert!(analysis.velocity.unwrap() < 0.0);
        // Current 0.83, slope -0.02: threshold in two checks.
        assert_eq!(analysis.estimated_checks_to_threshold, Some(2));
        assert!(!analysis.low_confidence);
    }

    #[test]
    fn test_constant_series_is_stable() {
        let monitor = monitor_over(&[0.9; 10]);
        let analysis = monitor.analysis(10, None).unwrap();

        assert_eq!(analysis.trend_direction, TrendDirection::Stable);
        assert!(analysis.velocity.unwrap().abs() < 1e-9);
        assert_eq!(analysis.estimated_checks_to_threshold, None);
        assert_eq!(analysis.prediction, DriftPrediction::Safe);
    }

    #[test]
    fn test_prediction_critical_below_threshold() {
        let monitor = monitor_over(&[0.75; 10]);
        let analysis = monitor.analysis(10, None).unwrap();
        assert_eq!(analysis.prediction, DriftPrediction::Critical);
    }

    #[test]
    fn test_prediction_warning_when_breach_imminent() {
        // Steep decline, average still above 0.8, ETA within 5 checks.
        let dirs: Vec<f64> = (0..10).map(|i| 1.3 - 0.045 * f64::from(i)).collect();
        let monitor = monitor_over(&dirs);
        let analysis = monitor.analysis(10, None).unwrap();

        assert!(analysis.average_dir.unwrap() > 0.8);
        assert_eq!(analysis.trend_direction, TrendDirection::Down);
        let eta = analysis.estimated_checks_to_threshold.unwrap();
        assert!(eta <= 5, "expected imminent breach, eta {eta}");
        assert_eq!(analysis.prediction, DriftPrediction::Warning);
    }

    #[test]
    fn test_prediction_caution_for_slow_decline() {
        // Declining by the half-window rule but far from the threshold.
        let dirs: Vec<f64> = (0..10).map(|i| 1.6 - 0.02 * f64::from(i)).collect();
        let monitor = monitor_over(&dirs);
        let analysis = monitor.analysis(10, None).unwrap();

        assert_eq!(analysis.trend_direction, TrendDirection::Down);
        assert!(analysis.estimated_checks_to_threshold.unwrap() > 5);
        assert_eq!(analysis.prediction, DriftPrediction::Caution);
    }

    #[test]
    fn test_acceleration_detects_speedup() {
        // Flat first half, steep second half: decline is speeding up.
        let dirs = [1.2, 1.2, 1.2, 1.2, 1.2, 1.15, 1.1, 1.05, 1.0, 0.95];
        let monitor = monitor_over(&dirs);
        let analysis = monitor.analysis(10, None).unwrap();

        assert!(analysis.velocity.unwrap() < 0.0);
        assert!(analysis.acceleration.unwrap() < 0.0);
        assert!(analysis.is_accelerating);
    }

    #[test]
    fn test_steady_decline_is_not_accelerating() {
        let dirs: Vec<f64> = (0..10).map(|i| 1.2 - 0.02 * f64::from(i)).collect();
        let monitor = monitor_over(&dirs);
        let analysis = monitor.analysis(10, None).unwrap();

        assert!(analysis.velocity.unwrap() < 0.0);
        assert!(!analysis.is_accelerating);
    }

    #[test]
    fn test_pre_alert_fires_before_breach() {
        // Declining toward 0.8, every value still above it, average inside
        // the 0.1 margin.
        let dirs: Vec<f64> = (0..10).map(|i| 0.95 - 0.015 * f64::from(i)).collect();
        let monitor = monitor_over(&dirs);
        assert!(dirs.iter().all(|&d| d > 0.8));

        let alert = monitor.pre_alert(0.8, 10, None).unwrap();
        assert!(alert.pre_alert);
        assert_eq!(alert.trend, TrendDirection::Down);
        assert_eq!(alert.severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_pre_alert_silent_on_flat_series() {
        let monitor = monitor_over(&[0.92; 10]);
        let alert = monitor.pre_alert(0.8, 10, None).unwrap();
        assert!(!alert.pre_alert);
        assert_eq!(alert.severity, AlertSeverity::None);
    }

    #[test]
    fn test_pre_alert_high_when_average_already_below() {
        let monitor = monitor_over(&[0.75; 10]);
        let alert = monitor.pre_alert(0.8, 10, None).unwrap();
        assert!(alert.pre_alert);
        assert_eq!(alert.severity, AlertSeverity::High);
    }

    #[test]
    fn test_pre_alert_no_data() {
        let monitor = monitor_over(&[]);
        let alert = monitor.pre_alert(0.8, 10, None).unwrap();
        assert!(!alert.pre_alert);
        assert!(alert.current_avg.is_none());
        assert_eq!(alert.data_points, 0);
    }

    #[test]
    fn test_forecast_predicts_breach_step() {
        let dirs: Vec<f64> = (0..10).map(|i| 0.97 - 0.015 * f64::from(i)).collect();
        let monitor = monitor_over(&dirs);
        let forecast = monitor.forecast(10, 5, None).unwrap();

        // Current 0.835 at slope -0.015: first step below 0.8 is step 3.
        assert!(forecast.will_breach_threshold);
        assert_eq!(forecast.breach_at_step, Some(3));
        assert_eq!(forecast.steps.len(), 5);
        for step in &forecast.steps {
            assert!((0.1..=1.0).contains(&step.confidence));
        }
        assert!(forecast.steps[4].confidence <= forecast.steps[0].confidence);
    }

    #[test]
    fn test_forecast_stable_series_never_breaches() {
        let monitor = monitor_over(&[0.95; 10]);
        let forecast = monitor.forecast(10, 5, None).unwrap();
        assert!(!forecast.will_breach_threshold);
        assert!(forecast.breach_at_step.is_none());
    }

    #[test]
    fn test_forecast_insufficient_data() {
        let monitor = monitor_over(&[0.9, 0.89]);
        let forecast = monitor.forecast(10, 5, None).unwrap();
        assert!(forecast.steps.is_empty());
        assert!(forecast.velocity.is_none());
        assert_eq!(forecast.data_points, 2);
    }

    #[test]
    fn test_short_window_degrades_with_low_confidence() {
        let monitor = monitor_over(&[0.9, 0.88, 0.86, 0.84, 0.82]);
        let summary = monitor.trend(10, None).unwrap();
        assert_eq!(summary.data_points, 5);
        assert!(summary.low_confidence);
        assert!(summary.average_dir.is_some());
    }

    #[test]
    fn test_no_data_summary_is_explicit() {
        let monitor = monitor_over(&[]);
        let summary = monitor.trend(10, None).unwrap();
        assert_eq!(summary.data_points, 0);
        assert_eq!(summary.trend_direction, TrendDirection::Unknown);
        assert!(summary.average_dir.is_none());
        assert!(summary.dir_values.is_empty());
    }

    #[test]
    fn test_model_name_filter() {
        let monitor = monitor_over_models(&[
            ("loan_v1", 0.9),
            ("loan_v2", 0.5),
            ("loan_v1", 0.9),
            ("loan_v2", 0.5),
            ("loan_v1", 0.9),
        ]);
        let v1 = monitor.trend(10, Some("loan_v1")).unwrap();
        assert_eq!(v1.data_points, 3);
        assert!((v1.average_dir.unwrap() - 0.9).abs() < 1e-9);

        let v2 = monitor.trend(10, Some("loan_v2")).unwrap();
        assert_eq!(v2.data_points, 2);
        assert!((v2.average_dir.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_risk_low_for_healthy_series() {
        let monitor = monitor_over(&[0.95; 10]);
        let risk = monitor.risk(0.0, 0.0, 1.1);
        assert_eq!(risk.risk_level, RiskLevel::Low);
        assert!(!risk.needs_retraining);
    }

    #[test]
    fn test_risk_high_near_threshold_with_fast_decline() {
        let monitor = monitor_over(&[0.85; 10]);
        let risk = monitor.risk(-0.15, -0.05, 0.82);
        assert_eq!(risk.risk_level, RiskLevel::High);
        assert!(risk.needs_retraining);
        assert!(risk.risk_score <= 1.0);
    }

    #[test]
    fn test_risk_discounts_noise_far_above_threshold() {
        // Steep decline, but the model sits 0.4 above the threshold: the
        // negative proximity term pulls the score below the Medium cut.
        let monitor = monitor_over(&[1.2; 10]);
        let risk = monitor.risk(-0.15, -0.06, 1.2);
        assert!(risk.risk_score < 0.4, "score {} not discounted", risk.risk_score);
        assert_eq!(risk.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_risk_below_threshold_always_needs_retraining() {
        let monitor = monitor_over(&[0.7; 10]);
        let risk = monitor.risk(0.0, 0.0, 0.7);
        assert!(risk.needs_retraining);
    }
}
