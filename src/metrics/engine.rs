//! Pure fairness metric computation.
//!
//! No I/O and no shared state: given two group tallies the engine produces
//! the five metric results and an aggregate report. A group with zero
//! members can never be certified fair, so every metric over an empty
//! group fails with value 0.

use super::{
    ComplianceLevel, EvaluationInput, FairnessReport, GroupOutcomes, InequalityLevel, MetricKind,
    MetricResult, MetricStatus,
};
use crate::config::FairnessThresholds;
use std::collections::BTreeMap;

/// Computes the fixed metric set against configured thresholds.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    thresholds: FairnessThresholds,
}

impl MetricsEngine {
    /// Engine with the given thresholds.
    pub fn new(thresholds: FairnessThresholds) -> Self {
        Self { thresholds }
    }

    /// The thresholds in effect.
    pub fn thresholds(&self) -> &FairnessThresholds {
        &self.thresholds
    }

    /// Compute all five metrics and the aggregate verdict.
    pub fn evaluate(&self, input: &EvaluationInput) -> FairnessReport {
        let mut metrics = BTreeMap::new();
        for kind in MetricKind::ALL {
            metrics.insert(kind, self.compute(kind, &input.protected, &input.privileged));
        }

        let passed = metrics.values().filter(|m| m.is_fair).count();
        let total = metrics.len();
        let fairness_score = passed as f64 / total as f64;

        FairnessReport {
            passed,
            failed: total - passed,
            fairness_score,
            overall_status: if passed == total { MetricStatus::Pass } else { MetricStatus::Fail },
            compliance_level: ComplianceLevel::from_score(fairness_score),
            metrics,
        }
    }

    /// Compute a single metric.
    pub fn compute(
        &self,
        kind: MetricKind,
        protected: &GroupOutcomes,
        privileged: &GroupOutcomes,
    ) -> MetricResult {
        match kind {
            MetricKind::Dir => self.disparate_impact(protected, privileged),
            MetricKind::Spd => self.statistical_parity(protected, privileged),
            MetricKind::Eod => self.equal_opportunity(protected, privileged),
            MetricKind::Aod => self.average_odds(protected, privileged),
            MetricKind::Theil => self.theil_index(protected, privileged),
        }
    }

    fn disparate_impact(
        &self,
        protected: &GroupOutcomes,
        privileged: &GroupOutcomes,
    ) -> MetricResult {
        let threshold = self.thresholds.dir;
        let protected_rate = protected.rate();
        let privileged_rate = privileged.rate();
        let support = rate_support(protected_rate, privileged_rate);

        // Undefined ratio (empty group or 0% privileged approvals) is
        // reported as 0 and can never pass.
        if protected.total == 0 || privileged.total == 0 || privileged_rate == 0.0 {
            return failed(MetricKind::Dir, 0.0, threshold, support, None);
        }

        let value = protected_rate / privileged_rate;
        result(MetricKind::Dir, value, threshold, value >= threshold, support, None)
    }

    fn statistical_parity(
        &self,
        protected: &GroupOutcomes,
        privileged: &GroupOutcomes,
    ) -> MetricResult {
        let threshold = self.thresholds.spd;
        let protected_rate = protected.rate();
        let privileged_rate = privileged.rate();
        let support = rate_support(protected_rate, privileged_rate);

        if protected.total == 0 || privileged.total == 0 {
            return failed(MetricKind::Spd, 0.0, threshold, support, None);
        }

        let value = protected_rate - privileged_rate;
        result(MetricKind::Spd, value, threshold, value.abs() < threshold, support, None)
    }

    fn equal_opportunity(
        &self,
        protected: &GroupOutcomes,
        privileged: &GroupOutcomes,
    ) -> MetricResult {
        let threshold = self.thresholds.eod;
        let protected_tpr = protected.tpr();
        let privileged_tpr = privileged.tpr();
        let support = BTreeMap::from([
            ("protected_tpr".to_string(), protected_tpr),
            ("privileged_tpr".to_string(), privileged_tpr),
        ]);

        if protected.total == 0 || privileged.total == 0 {
            return failed(MetricKind::Eod, 0.0, threshold, support, None);
        }

        let value = protected_tpr - privileged_tpr;
        result(MetricKind::Eod, value, threshold, value.abs() < threshold, support, None)
    }

    fn average_odds(&self, protected: &GroupOutcomes, privileged: &GroupOutcomes) -> MetricResult {
        let threshold = self.thresholds.aod;
        let tpr_diff = protected.tpr() - privileged.tpr();
        let fpr_diff = protected.fpr() - privileged.fpr();
        let support = BTreeMap::from([
            ("protected_tpr".to_string(), protected.tpr()),
            ("privileged_tpr".to_string(), privileged.tpr()),
            ("protected_fpr".to_string(), protected.fpr()),
            ("privileged_fpr".to_string(), privileged.fpr()),
        ]);

        if protected.total == 0 || privileged.total == 0 {
            return failed(MetricKind::Aod, 0.0, threshold, support, None);
        }

        let value = 0.5 * (tpr_diff + fpr_diff);
        result(MetricKind::Aod, value, threshold, value.abs() < threshold, support, None)
    }

    fn theil_index(&self, protected: &GroupOutcomes, privileged: &GroupOutcomes) -> MetricResult {
        let threshold = self.thresholds.theil;
        let protected_rate = protected.rate();
        let privileged_rate = privileged.rate();
        let combined_total = protected.total + privileged.total;

        let overall_rate = if combined_total == 0 {
            0.0
        } else {
            f64::from(protected.approved + privileged.approved) / f64::from(combined_total)
        };

        let mut support = rate_support(protected_rate, privileged_rate);
        support.insert("overall_rate".to_string(), overall_rate);

        if protected.total == 0 || privileged.total == 0 {
            return failed(MetricKind::Theil, 0.0, threshold, support, Some(InequalityLevel::Low));
        }

        // Entropy-weighted inequality of group rates around the overall
        // rate; degenerate overall rates carry no inequality.
        let value = if overall_rate == 0.0 || overall_rate == 1.0 {
            0.0
        } else {
            let protected_prop = f64::from(protected.total) / f64::from(combined_total);
            let privileged_prop = f64::from(privileged.total) / f64::from(combined_total);
            theil_contribution(protected_rate, protected_prop, overall_rate)
                + theil_contribution(privileged_rate, privileged_prop, overall_rate)
        };

        result(
            MetricKind::Theil,
            value,
            threshold,
            value < threshold,
            support,
            Some(InequalityLevel::from_theil(value)),
        )
    }
}

fn theil_contribution(rate: f64, proportion: f64, overall: f64) -> f64 {
    if rate == 0.0 || proportion == 0.0 {
        0.0
    } else {
        proportion * (rate / overall) * (rate / overall).ln()
    }
}

fn rate_support(protected_rate: f64, privileged_rate: f64) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("protected_rate".to_string(), protected_rate),
        ("privileged_rate".to_string(), privileged_rate),
    ])
}

fn result(
    kind: MetricKind,
    value: f64,
    threshold: f64,
    is_fair: bool,
    support: BTreeMap<String, f64>,
    inequality_level: Option<InequalityLevel>,
) -> MetricResult {
    MetricResult {
        name: kind.name().to_string(),
        value,
        threshold,
        is_fair,
        status: if is_fair { MetricStatus::Pass } else { MetricStatus::Fail },
        support,
        inequality_level,
    }
}

fn failed(
    kind: MetricKind,
    value: f64,
    threshold: f64,
    support: BTreeMap<String, f64>,
    inequality_level: Option<InequalityLevel>,
) -> MetricResult {
    result(kind, value, threshold, false, support, inequality_level)
}
