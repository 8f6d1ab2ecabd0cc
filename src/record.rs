//! The audit record: atomic unit of monitoring history.
//!
//! A [`CheckRecord`] is created exactly once by the audit chain's append,
//! is immutable thereafter, and is never deleted. Its `content_hash` is
//! computed over one canonical, versioned byte encoding used identically
//! at write time and at verify time, so the two encodings cannot drift.

use crate::anchor::AnchorRecord;
use crate::metrics::{FairnessReport, MetricKind, MetricResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Version byte leading every canonical encoding. Bump on any change to
/// the byte layout; verification of old records keys off the stored byte.
pub const CANONICAL_VERSION: u8 = 1;

/// Genesis predecessor digest for the first record in a chain.
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// Record content before the chain assigns its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub timestamp: DateTime<Utc>,
    pub model_name: String,
    pub n_samples: u32,
    pub drift_level: f64,
    pub metrics: BTreeMap<MetricKind, MetricResult>,
    pub alert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_alert: Option<Vec<u8>>,
}

impl RecordDraft {
    /// Draft from a computed fairness report plus run metadata, stamped now.
    pub fn from_report(
        model_name: impl Into<String>,
        n_samples: u32,
        drift_level: f64,
        report: &FairnessReport,
        encrypted_alert: Option<Vec<u8>>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            model_name: model_name.into(),
            n_samples,
            drift_level,
            metrics: report.metrics.clone(),
            alert: report.alert(),
            encrypted_alert,
        }
    }
}

/// One immutable evaluation result, hash-linked to its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Monotonic position in the chain, assigned at append.
    pub sequence_id: u64,
    /// When the evaluation ran (UTC).
    pub timestamp: DateTime<Utc>,
    /// Decision model that produced the outcomes.
    pub model_name: String,
    /// Decisions covered by this evaluation.
    pub n_samples: u32,
    /// Bias-injection level of the run, `[0, 1]`. Run metadata.
    pub drift_level: f64,
    /// Per-metric results for the fixed metric set.
    pub metrics: BTreeMap<MetricKind, MetricResult>,
    /// True if any required metric failed.
    pub alert: bool,
    /// Opaque collaborator payload; stored, never interpreted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_alert: Option<Vec<u8>>,
    /// SHA-256 over the canonical encoding of all fields above plus
    /// `prev_hash`.
    pub content_hash: [u8; 32],
    /// `content_hash` of the immediate predecessor, or [`GENESIS_HASH`].
    pub prev_hash: [u8; 32],
    /// External anchor reference, attached after the fact. Excluded from
    /// the hashed content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_ref: Option<AnchorRecord>,
}

impl CheckRecord {
    /// Seal a draft at a chain position, computing its content hash.
    pub fn seal(draft: RecordDraft, sequence_id: u64, prev_hash: [u8; 32]) -> Self {
        let mut record = Self {
            sequence_id,
            timestamp: draft.timestamp,
            model_name: draft.model_name,
            n_samples: draft.n_samples,
            drift_level: draft.drift_level,
            metrics: draft.metrics,
            alert: draft.alert,
            encrypted_alert: draft.encrypted_alert,
            content_hash: [0u8; 32],
            prev_hash,
            anchor_ref: None,
        };
        record.content_hash = record.compute_content_hash();
        record
    }

    /// Re-derive the content hash from the record's fields.
    pub fn compute_content_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        hasher.finalize().into()
    }

    /// Canonical byte encoding, version 1.
    ///
    /// Field order is fixed; floats encode as IEEE-754 little-endian bits;
    /// the metrics map iterates in `BTreeMap` (canonical) order. The
    /// `anchor_ref` and `content_hash` fields are excluded so that late
    /// anchoring never invalidates the chain.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        buf.push(CANONICAL_VERSION);
        buf.extend_from_slice(&self.sequence_id.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.timestamp_micros().to_le_bytes());
        push_str(&mut buf, &self.model_name);
        buf.extend_from_slice(&self.n_samples.to_le_bytes());
        buf.extend_from_slice(&self.drift_level.to_bits().to_le_bytes());

        buf.extend_from_slice(&(self.metrics.len() as u32).to_le_bytes());
        for (kind, result) in &self.metrics {
            push_str(&mut buf, &kind.to_string());
            push_str(&mut buf, &result.name);
            buf.extend_from_slice(&result.value.to_bits().to_le_bytes());
            buf.extend_from_slice(&result.threshold.to_bits().to_le_bytes());
            buf.push(u8::from(result.is_fair));
            push_str(&mut buf, &format!("{:?}", result.status));
            buf.extend_from_slice(&(result.support.len() as u32).to_le_bytes());
            for (key, value) in &result.support {
                push_str(&mut buf, key);
                buf.extend_from_slice(&value.to_bits().to_le_bytes());
            }
            match result.inequality_level {
                None => buf.push(0),
                Some(level) => {
                    buf.push(1);
                    push_str(&mut buf, &format!("{level:?}"));
                }
            }
        }

        buf.push(u8::from(self.alert));
        match &self.encrypted_alert {
            None => buf.push(0),
            Some(payload) => {
                buf.push(1);
                buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
                buf.extend_from_slice(payload);
            }
        }
        buf.extend_from_slice(&self.prev_hash);
        buf
    }

    /// Check the stored hash against a fresh derivation.
    pub fn hash_is_valid(&self) -> bool {
        self.content_hash == self.compute_content_hash()
    }

    /// Hex form of the content hash, for display and anchor lookup keys.
    pub fn content_hash_hex(&self) -> String {
        hex::encode(self.content_hash)
    }

    /// DIR value of this record, the series drift analysis runs on.
    pub fn dir_value(&self) -> Option<f64> {
        self.metrics.get(&MetricKind::Dir).map(|m| m.value)
    }
}

fn push_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}
