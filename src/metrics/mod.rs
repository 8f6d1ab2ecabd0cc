//! Fairness metric types.
//!
//! The metric set is fixed: DIR, SPD, EOD, AOD, and the Theil index. Each
//! computation produces an immutable [`MetricResult`]; the engine in
//! [`engine`] aggregates them into a [`FairnessReport`].

mod engine;

pub use engine::MetricsEngine;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed set of fairness metrics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricKind {
    /// Disparate Impact Ratio (EEOC four-fifths rule).
    Dir,
    /// Statistical Parity Difference.
    Spd,
    /// Equal Opportunity Difference.
    Eod,
    /// Average Odds Difference.
    Aod,
    /// Theil index (entropy-based inequality).
    Theil,
}

impl MetricKind {
    /// All metrics in canonical order.
    pub const ALL: [MetricKind; 5] = [Self::Dir, Self::Spd, Self::Eod, Self::Aod, Self::Theil];

    /// Human-readable metric name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dir => "Disparate Impact Ratio (DIR)",
            Self::Spd => "Statistical Parity Difference (SPD)",
            Self::Eod => "Equal Opportunity Difference (EOD)",
            Self::Aod => "Average Odds Difference (AOD)",
            Self::Theil => "Theil Index",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dir => write!(f, "DIR"),
            Self::Spd => write!(f, "SPD"),
            Self::Eod => write!(f, "EOD"),
            Self::Aod => write!(f, "AOD"),
            Self::Theil => write!(f, "THEIL"),
        }
    }
}

/// Pass/fail verdict for a single metric or a whole report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricStatus {
    Pass,
    Fail,
}

/// Qualitative inequality label attached to the Theil index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InequalityLevel {
    Low,
    Moderate,
    High,
}

impl InequalityLevel {
    /// Classify a Theil value at the fixed 0.05 / 0.1 cut points.
    pub fn from_theil(value: f64) -> Self {
        if value < 0.05 {
            Self::Low
        } else if value < 0.1 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

/// Compliance bucket for the aggregate fairness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceLevel {
    Full,
    High,
    Moderate,
    Low,
    NonCompliant,
}

impl ComplianceLevel {
    /// Bucket a fairness score (passed/total) at the fixed cut points.
    pub fn from_score(score: f64) -> Self {
        if score >= 1.0 {
            Self::Full
        } else if score >= 0.8 {
            Self::High
        } else if score >= 0.6 {
            Self::Moderate
        } else if score >= 0.4 {
            Self::Low
        } else {
            Self::NonCompliant
        }
    }
}

/// Result of a single metric computation. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Human-readable metric name.
    pub name: String,
    /// Computed metric value.
    pub value: f64,
    /// Threshold the value was judged against.
    pub threshold: f64,
    /// Whether the value satisfies the threshold rule.
    pub is_fair: bool,
    /// Pass/fail verdict.
    pub status: MetricStatus,
    /// Supporting rates that fed the formula, keyed by stable names
    /// (`protected_rate`, `privileged_tpr`, ...).
    pub support: BTreeMap<String, f64>,
    /// Qualitative inequality label; present for the Theil index only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inequality_level: Option<InequalityLevel>,
}

/// Outcome tally for one group, with optional ground-truth breakdown.
///
/// DIR and SPD need only `approved`/`total`; EOD and AOD additionally need
/// the confusion counts against true labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupOutcomes {
    /// Positive decisions for this group.
    pub approved: u32,
    /// Group size.
    pub total: u32,
    /// Approved and truly qualified.
    pub true_positive: u32,
    /// Rejected but truly qualified.
    pub false_negative: u32,
    /// Approved but not qualified.
    pub false_positive: u32,
    /// Rejected and not qualified.
    pub true_negative: u32,
}

impl GroupOutcomes {
    /// Tally without ground truth, for rate-only metrics.
    pub fn from_counts(approved: u32, total: u32) -> Self {
        Self { approved, total, ..Default::default() }
    }

    /// Approval rate, or 0 for an empty group.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.approved) / f64::from(self.total)
        }
    }

    /// True positive rate among truly qualified members, or 0 when none.
    pub fn tpr(&self) -> f64 {
        let positives = self.true_positive + self.false_negative;
        if positives == 0 {
            0.0
        } else {
            f64::from(self.true_positive) / f64::from(positives)
        }
    }

    /// False positive rate among unqualified members, or 0 when none.
    pub fn fpr(&self) -> f64 {
        let negatives = self.false_positive + self.true_negative;
        if negatives == 0 {
            0.0
        } else {
            f64::from(self.false_positive) / f64::from(negatives)
        }
    }
}

/// One evaluation request: two group tallies plus run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInput {
    /// Name of the decision model that produced the outcomes.
    pub model_name: String,
    /// Number of decisions in this evaluation run.
    pub n_samples: u32,
    /// Bias-injection level of the run, in `[0, 1]`. Run metadata, not a
    /// fairness value.
    pub drift_level: f64,
    /// Tally for the protected group.
    pub protected: GroupOutcomes,
    /// Tally for the privileged group.
    pub privileged: GroupOutcomes,
    /// Opaque encrypted alert payload from the collaborator encryption
    /// utility. Stored with the record, never interpreted here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_alert: Option<Vec<u8>>,
}

impl EvaluationInput {
    /// Minimal input from approval counts alone.
    pub fn from_counts(
        model_name: impl Into<String>,
        protected: (u32, u32),
        privileged: (u32, u32),
    ) -> Self {
        Self {
            model_name: model_name.into(),
            n_samples: protected.1 + privileged.1,
            drift_level: 0.0,
            protected: GroupOutcomes::from_counts(protected.0, protected.1),
            privileged: GroupOutcomes::from_counts(privileged.0, privileged.1),
            encrypted_alert: None,
        }
    }
}

/// Aggregate verdict over all five metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    /// Per-metric results, in canonical metric order.
    pub metrics: BTreeMap<MetricKind, MetricResult>,
    /// Number of metrics that passed.
    pub passed: usize,
    /// Number of metrics that failed.
    pub failed: usize,
    /// `passed / total_metrics`.
    pub fairness_score: f64,
    /// Pass only when every metric passed.
    pub overall_status: MetricStatus,
    /// Bucketed fairness score.
    pub compliance_level: ComplianceLevel,
}

impl FairnessReport {
    /// True if any required metric failed.
    pub fn alert(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_display() {
        assert_eq!(MetricKind::Dir.to_string(), "DIR");
        assert_eq!(MetricKind::Theil.to_string(), "THEIL");
    }

    #[test]
    fn test_metric_kind_canonical_order() {
        let mut sorted = MetricKind::ALL;
        sorted.sort();
        assert_eq!(sorted, MetricKind::ALL);
    }

    #[test]
    fn test_group_rate() {
        let group = GroupOutcomes::from_counts(45, 100);
        assert!((group.rate() - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_empty_group_rates_are_zero() {
        let group = GroupOutcomes::default();
        assert_eq!(group.rate(), 0.0);
        assert_eq!(group.tpr(), 0.0);
        assert_eq!(group.fpr(), 0.0);
    }

    #[test]
    fn test_tpr_and_fpr() {
        let group = GroupOutcomes {
            approved: 60,
            total: 100,
            true_positive: 40,
            false_negative: 10,
            false_positive: 20,
            true_negative: 30,
        };
        assert!((group.tpr() - 0.8).abs() < 1e-12);
        assert!((group.fpr() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_compliance_level_buckets() {
        assert_eq!(ComplianceLevel::from_score(1.0), ComplianceLevel::Full);
        assert_eq!(ComplianceLevel::from_score(0.8), ComplianceLevel::High);
        assert_eq!(ComplianceLevel::from_score(0.6), ComplianceLevel::Moderate);
        assert_eq!(ComplianceLevel::from_score(0.4), ComplianceLevel::Low);
        assert_eq!(ComplianceLevel::from_score(0.2), ComplianceLevel::NonCompliant);
    }

    #[test]
    fn test_inequality_level_cut_points() {
        assert_eq!(InequalityLevel::from_theil(0.01), InequalityLevel::Low);
        assert_eq!(InequalityLevel::from_theil(0.07), InequalityLevel::Moderate);
        assert_eq!(InequalityLevel::from_theil(0.2), InequalityLevel::High);
    }

    #[test]
    fn test_metric_kind_serializes_uppercase() {
        let json = serde_json::to_string(&MetricKind::Spd).unwrap();
        assert_eq!(json, "\"SPD\"");
    }

    #[test]
    fn test_evaluation_input_from_counts() {
        let input = EvaluationInput::from_counts("loan_v1", (45, 100), (70, 100));
        assert_eq!(input.n_samples, 200);
        assert_eq!(input.protected.approved, 45);
        assert!(input.encrypted_alert.is_none());
    }
}
