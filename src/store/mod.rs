//! Record storage backends.
//!
//! A [`RecordStore`] holds the ordered, append-only sequence of
//! [`CheckRecord`]s. Records are never updated or deleted; the single
//! exception is attaching an [`AnchorRecord`] reference, which lives
//! outside the hashed content.

mod jsonl;

pub use jsonl::JsonlStore;

use crate::anchor::AnchorRecord;
use crate::error::{FairlensError, Result};
use crate::record::CheckRecord;
use std::sync::RwLock;

/// Append-only storage strategy for the audit chain.
pub trait RecordStore: Send + Sync {
    /// Persist a record at the end of the sequence.
    ///
    /// A failed append must leave no referenceable partial record.
    fn append(&self, record: &CheckRecord) -> Result<()>;

    /// Fetch a record by sequence id.
    fn get(&self, sequence_id: u64) -> Result<Option<CheckRecord>>;

    /// The most recent record, if any.
    fn last(&self) -> Result<Option<CheckRecord>>;

    /// The most recent `n` records, newest last.
    fn tail(&self, n: usize) -> Result<Vec<CheckRecord>>;

    /// Records with sequence ids in `from..=to`, oldest first.
    fn range(&self, from: u64, to: u64) -> Result<Vec<CheckRecord>>;

    /// Number of stored records.
    fn len(&self) -> Result<u64>;

    /// Check if the store holds no records.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Attach an anchor reference to an already-stored record.
    ///
    /// The only permitted mutation; `anchor_ref` is excluded from the
    /// content hash, so this never invalidates the chain.
    fn set_anchor(&self, sequence_id: u64, anchor: AnchorRecord) -> Result<()>;
}

/// In-memory store backed by a `RwLock<Vec<_>>`.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<CheckRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<CheckRecord>> {
        self.records.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RecordStore for MemoryStore {
    fn append(&self, record: &CheckRecord) -> Result<()> {
        let mut records =
            self.records.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if record.sequence_id != records.len() as u64 {
            return Err(FairlensError::StorageWrite(format!(
                "append out of order: expected sequence {}, got {}",
                records.len(),
                record.sequence_id
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    fn get(&self, sequence_id: u64) -> Result<Option<CheckRecord>> {
        Ok(self.read().get(sequence_id as usize).cloned())
    }

    fn last(&self) -> Result<Option<CheckRecord>> {
        Ok(self.read().last().cloned())
    }

    fn tail(&self, n: usize) -> Result<Vec<CheckRecord>> {
        let records = self.read();
        let skip = records.len().saturating_sub(n);
        Ok(records[skip..].to_vec())
    }

    fn range(&self, from: u64, to: u64) -> Result<Vec<CheckRecord>> {
        let records = self.read();
        let from = from as usize;
        let to = (to as usize).min(records.len().saturating_sub(1));
        if from > to || records.is_empty() {
            return Ok(Vec::new());
        }
        Ok(records[from..=to].to_vec())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.read().len() as u64)
    }

    fn set_anchor(&self, sequence_id: u64, anchor: AnchorRecord) -> Result<()> {
        let mut records =
            self.records.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = records
            .get_mut(sequence_id as usize)
            .ok_or_else(|| FairlensError::NotFound(format!("record {sequence_id}")))?;
        record.anchor_ref = Some(anchor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{AnchorStatus, SimulatedLedger};
    use crate::anchor::AnchorService;
    use crate::metrics::{EvaluationInput, MetricsEngine};
    use crate::record::{RecordDraft, GENESIS_HASH};

    fn record(sequence_id: u64, prev_hash: [u8; 32]) -> CheckRecord {
        let input = EvaluationInput::from_counts("loan_v1", (60, 100), (70, 100));
        let report = MetricsEngine::default().evaluate(&input);
        let draft = RecordDraft::from_report("loan_v1", 200, 0.0, &report, None);
        CheckRecord::seal(draft, sequence_id, prev_hash)
    }

    fn chain_of(n: u64) -> Vec<CheckRecord> {
        let mut prev = GENESIS_HASH;
        (0..n)
            .map(|i| {
                let r = record(i, prev);
                prev = r.content_hash;
                r
            })
            .collect()
    }

    #[test]
    fn test_append_and_get() {
        let store = MemoryStore::new();
        for r in chain_of(3) {
            store.append(&r).unwrap();
        }
        assert_eq!(store.len().unwrap(), 3);
        assert_eq!(store.get(1).unwrap().unwrap().sequence_id, 1);
        assert!(store.get(9).unwrap().is_none());
    }

    #[test]
    fn test_append_rejects_sequence_gap() {
        let store = MemoryStore::new();
        let out_of_order = record(5, GENESIS_HASH);
        let err = store.append(&out_of_order).unwrap_err();
        assert!(matches!(err, FairlensError::StorageWrite(_)));
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_tail_newest_last() {
        let store = MemoryStore::new();
        for r in chain_of(5) {
            store.append(&r).unwrap();
        }
        let tail = store.tail(2).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence_id, 3);
        assert_eq!(tail[1].sequence_id, 4);

        // Requesting more than available returns everything.
        assert_eq!(store.tail(50).unwrap().len(), 5);
    }

    #[test]
    fn test_range_clamps_to_stored() {
        let store = MemoryStore::new();
        for r in chain_of(4) {
            store.append(&r).unwrap();
        }
        let range = store.range(1, 100).unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range[0].sequence_id, 1);
        assert!(store.range(3, 1).unwrap().is_empty());
    }

    #[test]
    fn test_set_anchor() {
        let store = MemoryStore::new();
        let r = record(0, GENESIS_HASH);
        let hash = r.content_hash;
        store.append(&r).unwrap();

        let ledger = SimulatedLedger::new();
        let anchor = ledger.anchor(hash).unwrap();
        store.set_anchor(0, anchor).unwrap();

        let stored = store.get(0).unwrap().unwrap();
        let anchor_ref = stored.anchor_ref.as_ref().unwrap();
        assert_eq!(anchor_ref.status, AnchorStatus::Confirmed);
        // The record still hashes clean.
        assert!(stored.hash_is_valid());
    }

    #[test]
    fn test_set_anchor_missing_record() {
        let store = MemoryStore::new();
        let ledger = SimulatedLedger::new();
        let anchor = ledger.anchor([1u8; 32]).unwrap();
        assert!(matches!(
            store.set_anchor(3, anchor),
            Err(FairlensError::NotFound(_))
        ));
    }
}
