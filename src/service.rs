//! High-level monitoring facade.
//!
//! `FairnessMonitor` wires the metrics engine, the audit chain, the drift
//! monitor, and the anchor service behind one thread-safe surface. All
//! methods take `&self`; share the monitor via `Arc` for concurrent use.

use crate::anchor::{AnchorRecord, AnchorService, SimulatedLedger};
use crate::chain::{AuditChain, ChainVerification};
use crate::config::MonitorConfig;
use crate::drift::{DriftAnalysis, DriftForecast, DriftMonitor, PreAlert, TrendSummary};
use crate::error::{FairlensError, Result};
use crate::metrics::{EvaluationInput, GroupOutcomes, MetricsEngine};
use crate::record::{CheckRecord, RecordDraft};
use crate::store::{JsonlStore, MemoryStore, RecordStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Outcome of checking one record against its chain neighborhood and the
/// anchor ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordVerification {
    pub record: CheckRecord,
    /// True when the record's hash and its link to the predecessor hold.
    pub chain_ok: bool,
    /// Diagnostic for a failed chain check.
    pub detail: Option<String>,
    /// Ledger entry for this record's content hash, when one exists.
    pub anchor: Option<AnchorRecord>,
    /// True when the stored anchor reference matches the ledger.
    pub anchor_verified: bool,
}

/// Entry point for fairness monitoring.
pub struct FairnessMonitor {
    config: MonitorConfig,
    engine: MetricsEngine,
    chain: AuditChain,
    drift: DriftMonitor,
    anchor: Arc<dyn AnchorService>,
}

impl FairnessMonitor {
    /// Monitor over explicit storage and anchor backends.
    pub fn new(
        store: Arc<dyn RecordStore>,
        anchor: Arc<dyn AnchorService>,
        config: MonitorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let chain = AuditChain::new(store.clone());
        let drift = DriftMonitor::new(store, config.drift.clone(), config.thresholds.dir);
        let engine = MetricsEngine::new(config.thresholds.clone());
        Ok(Self { config, engine, chain, drift, anchor })
    }

    /// Volatile monitor backed by memory and a simulated ledger.
    pub fn in_memory(config: MonitorConfig) -> Result<Self> {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SimulatedLedger::new()),
            config,
        )
    }

    /// Durable monitor over a JSONL audit log and a simulated ledger.
    pub fn with_jsonl(path: impl AsRef<Path>, config: MonitorConfig) -> Result<Self> {
        Self::new(
            Arc::new(JsonlStore::open(path)?),
            Arc::new(SimulatedLedger::new()),
            config,
        )
    }

    /// The configuration in effect.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Runs a fairness check: computes the metric set, appends a sealed
    /// record to the audit chain, and anchors it best-effort.
    ///
    /// Validation failures reject before any state change. An unavailable
    /// anchor ledger never fails the call; the record is returned without
    /// an anchor reference.
    pub fn evaluate(&self, input: &EvaluationInput) -> Result<CheckRecord> {
        validate_input(input)?;

        let report = self.engine.evaluate(input);
        let draft = RecordDraft::from_report(
            input.model_name.clone(),
            input.n_samples,
            input.drift_level,
            &report,
            input.encrypted_alert.clone(),
        );
        let mut record = self.chain.append(draft)?;

        if let Ok(anchor) = self.anchor.anchor(record.content_hash) {
            // Anchor bookkeeping is best-effort as well; the sealed record
            // already exists and stays valid without it.
            if self.chain.set_anchor(record.sequence_id, anchor.clone()).is_ok() {
                record.anchor_ref = Some(anchor);
            }
        }

        Ok(record)
    }

    /// The newest `last_n` records, oldest first. Records are returned as
    /// stored; callers gate access to `encrypted_alert`.
    pub fn get_history(&self, last_n: usize) -> Result<Vec<CheckRecord>> {
        self.chain.get_tail(last_n)
    }

    /// Record at `sequence_id`, if present.
    pub fn get_record(&self, sequence_id: u64) -> Result<Option<CheckRecord>> {
        self.chain.get(sequence_id)
    }

    /// Records appended so far.
    pub fn len(&self) -> Result<u64> {
        self.chain.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.chain.is_empty()
    }

    /// Moving statistics over the last `window` checks.
    pub fn get_trend(&self, window: usize, model_name: Option<&str>) -> Result<TrendSummary> {
        self.drift.trend(window, model_name)
    }

    /// Full drift analysis (velocity, acceleration, prediction, risk).
    pub fn get_analysis(&self, window: usize, model_name: Option<&str>) -> Result<DriftAnalysis> {
        self.drift.analysis(window, model_name)
    }

    /// Early warning against a caller-chosen DIR threshold.
    pub fn get_pre_alert(
        &self,
        threshold: f64,
        window: usize,
        model_name: Option<&str>,
    ) -> Result<PreAlert> {
        self.drift.pre_alert(threshold, window, model_name)
    }

    /// DIR forecast over the configured horizon.
    pub fn get_forecast(&self, window: usize, model_name: Option<&str>) -> Result<DriftForecast> {
        self.drift.forecast(window, self.config.drift.forecast_horizon, model_name)
    }

    /// Verifies one record against its predecessor and the anchor ledger.
    /// Chain damage is reported in the result, not raised.
    pub fn verify_record(&self, sequence_id: u64) -> Result<RecordVerification> {
        let record = self
            .chain
            .get(sequence_id)?
            .ok_or_else(|| FairlensError::NotFound(format!("record {sequence_id}")))?;

        let (chain_ok, detail) = match self.chain.verify(sequence_id, sequence_id) {
            Ok(_) => (true, None),
            Err(FairlensError::ChainIntegrity { detail, .. }) => (false, Some(detail)),
            Err(other) => return Err(other),
        };

        let anchor = self.anchor.lookup(record.content_hash);
        let anchor_verified = match (&record.anchor_ref, &anchor) {
            (Some(stored), Some(found)) => stored.ref_id == found.ref_id,
            _ => false,
        };

        Ok(RecordVerification { record, chain_ok, detail, anchor, anchor_verified })
    }

    /// Walks `[from, to]` and fails fast on the first broken link.
    pub fn verify_chain(&self, from: u64, to: u64) -> Result<ChainVerification> {
        self.chain.verify(from, to)
    }

    /// Walks the entire chain.
    pub fn verify_all(&self) -> Result<ChainVerification> {
        self.chain.verify_all()
    }

    /// Ledger entry for a content hash, when one exists.
    pub fn anchor_lookup(&self, content_hash: [u8; 32]) -> Option<AnchorRecord> {
        self.anchor.lookup(content_hash)
    }
}

fn validate_input(input: &EvaluationInput) -> Result<()> {
    if input.model_name.trim().is_empty() {
        return Err(FairlensError::validation("model_name", "must not be empty"));
    }
    if input.n_samples == 0 {
        return Err(FairlensError::validation("n_samples", "must be greater than zero"));
    }
    if !(0.0..=1.0).contains(&input.drift_level) {
        return Err(FairlensError::validation("drift_level", "must be within [0, 1]"));
    }
    validate_group("protected", &input.protected)?;
    validate_group("privileged", &input.privileged)?;
    Ok(())
}

fn validate_group(field: &str, group: &GroupOutcomes) -> Result<()> {
    if group.total == 0 {
        return Err(FairlensError::validation(field, "group must not be empty"));
    }
    if group.approved > group.total {
        return Err(FairlensError::validation(
            field,
            "approved count exceeds group total",
        ));
    }
    let confusion = group.true_positive
        + group.false_negative
        + group.false_positive
        + group.true_negative;
    if confusion > 0 && confusion != group.total {
        return Err(FairlensError::validation(
            field,
            "confusion matrix counts must sum to the group total",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::TrendDirection;

    fn monitor() -> FairnessMonitor {
        FairnessMonitor::in_memory(MonitorConfig::default()).unwrap()
    }

    fn fair_input(model: &str) -> EvaluationInput {
        EvaluationInput::from_counts(model, (70, 100), (70, 100))
    }

    #[test]
    fn test_evaluate_appends_and_anchors() {
        let m = monitor();
        let record = m.evaluate(&fair_input("loan_v1")).unwrap();

        assert_eq!(record.sequence_id, 0);
        assert!(!record.alert);
        let anchor = record.anchor_ref.expect("simulated ledger always anchors");
        assert!(anchor.ref_id.starts_with("0x"));
        assert_eq!(m.anchor_lookup(record.content_hash).unwrap().ref_id, anchor.ref_id);
    }

    #[test]
    fn test_evaluate_biased_input_raises_alert() {
        let m = monitor();
        let input = EvaluationInput::from_counts("loan_v1", (45, 100), (70, 100));
        let record = m.evaluate(&input).unwrap();

        assert!(record.alert);
        let dir = record.dir_value().unwrap();
        assert!((dir - 45.0 / 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_validation_rejects_before_state_change() {
        let m = monitor();

        let zero_samples = EvaluationInput {
            n_samples: 0,
            ..fair_input("loan_v1")
        };
        assert!(matches!(
            m.evaluate(&zero_samples),
            Err(FairlensError::Validation { .. })
        ));

        let empty_group = EvaluationInput::from_counts("loan_v1", (0, 0), (70, 100));
        assert!(m.evaluate(&empty_group).is_err());

        let bad_drift = EvaluationInput {
            drift_level: 1.5,
            ..fair_input("loan_v1")
        };
        assert!(m.evaluate(&bad_drift).is_err());

        let over_approved = EvaluationInput::from_counts("loan_v1", (120, 100), (70, 100));
        assert!(m.evaluate(&over_approved).is_err());

        assert!(m.is_empty().unwrap());
    }

    #[test]
    fn test_validation_rejects_inconsistent_confusion_counts() {
        let m = monitor();
        let mut input = fair_input("loan_v1");
        input.protected.true_positive = 10;
        input.protected.false_negative = 5;
        // 15 labeled outcomes against a group of 100.
        assert!(matches!(
            m.evaluate(&input),
            Err(FairlensError::Validation { .. })
        ));
    }

    #[test]
    fn test_history_returns_newest_records() {
        let m = monitor();
        for _ in 0..5 {
            m.evaluate(&fair_input("loan_v1")).unwrap();
        }

        let history = m.get_history(3).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].sequence_id, 2);
        assert_eq!(history[2].sequence_id, 4);
    }

    #[test]
    fn test_trend_and_pre_alert_views() {
        let m = monitor();
        for _ in 0..6 {
            m.evaluate(&fair_input("loan_v1")).unwrap();
        }

        let trend = m.get_trend(10, None).unwrap();
        assert_eq!(trend.data_points, 6);
        assert!((trend.average_dir.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(trend.trend_direction, TrendDirection::Stable);

        let alert = m.get_pre_alert(0.8, 10, None).unwrap();
        assert!(!alert.pre_alert);
    }

    #[test]
    fn test_verify_record_reports_intact_chain() {
        let m = monitor();
        let record = m.evaluate(&fair_input("loan_v1")).unwrap();

        let verification = m.verify_record(record.sequence_id).unwrap();
        assert!(verification.chain_ok);
        assert!(verification.detail.is_none());
        assert!(verification.anchor.is_some());
        assert!(verification.anchor_verified);
    }

    #[test]
    fn test_verify_record_missing_sequence() {
        let m = monitor();
        assert!(matches!(
            m.verify_record(42),
            Err(FairlensError::NotFound(_))
        ));
    }

    #[test]
    fn test_verify_chain_full_range() {
        let m = monitor();
        for _ in 0..4 {
            m.evaluate(&fair_input("loan_v1")).unwrap();
        }
        let verification = m.verify_all().unwrap();
        assert_eq!(verification.records_verified, 4);
    }

    #[test]
    fn test_encrypted_alert_stored_opaquely() {
        let m = monitor();
        let mut input = EvaluationInput::from_counts("loan_v1", (45, 100), (70, 100));
        input.encrypted_alert = Some(vec![0xde, 0xad, 0xbe, 0xef]);

        let record = m.evaluate(&input).unwrap();
        assert_eq!(record.encrypted_alert.as_deref(), Some(&[0xde, 0xad, 0xbe, 0xef][..]));
    }
}
