//! Tamper-evident audit chain.
//!
//! Wraps a [`RecordStore`] with hash chaining and serialized append
//! semantics. Appends run under one mutex so two concurrent calls can
//! never observe the same tail and race to reference it; every other
//! operation reads immutable history and takes no lock here.

use crate::anchor::AnchorRecord;
use crate::error::{FairlensError, Result};
use crate::record::{CheckRecord, RecordDraft, GENESIS_HASH};
use crate::store::RecordStore;
use std::sync::{Arc, Mutex};

/// Successful verification report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    /// Number of records whose hashes and links were re-derived.
    pub records_verified: usize,
}

/// Hash-chained, append-only sequence of [`CheckRecord`]s.
pub struct AuditChain {
    store: Arc<dyn RecordStore>,
    // Serializes tail observation + persist; held across no other I/O.
    append_lock: Mutex<()>,
}

impl AuditChain {
    /// Chain over the given store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, append_lock: Mutex::new(()) }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Freeze a draft into the next [`CheckRecord`] and persist it.
    ///
    /// Strictly sequential: the critical section covers reading the tail
    /// hash, computing the new content hash, and the single persistence
    /// write. A storage failure is fatal for this call only and does not
    /// advance the sequence.
    pub fn append(&self, draft: RecordDraft) -> Result<CheckRecord> {
        let _guard = self.append_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let prev_hash = match self.store.last()? {
            Some(tail) => tail.content_hash,
            None => GENESIS_HASH,
        };
        let sequence_id = self.store.len()?;
        let record = CheckRecord::seal(draft, sequence_id, prev_hash);
        self.store.append(&record)?;
        Ok(record)
    }

    /// Walk `from..=to` re-deriving every content hash and predecessor
    /// link. Fails fast at the first mismatch, reporting the offending
    /// sequence id. The predecessor of `from` is fetched even when it is
    /// outside the requested range.
    pub fn verify(&self, from: u64, to: u64) -> Result<ChainVerification> {
        let records = self.store.range(from, to)?;
        if records.is_empty() {
            return Ok(ChainVerification { records_verified: 0 });
        }

        let mut expected_prev = if from == 0 {
            GENESIS_HASH
        } else {
            self.store
                .get(from - 1)?
                .ok_or_else(|| FairlensError::NotFound(format!("record {}", from - 1)))?
                .content_hash
        };

        for (offset, record) in records.iter().enumerate() {
            let expected_sequence = from + offset as u64;
            if record.sequence_id != expected_sequence {
                return Err(FairlensError::ChainIntegrity {
                    sequence_id: expected_sequence,
                    detail: format!(
                        "sequence mismatch: stored {}, expected {expected_sequence}",
                        record.sequence_id
                    ),
                });
            }
            if record.prev_hash != expected_prev {
                return Err(FairlensError::ChainIntegrity {
                    sequence_id: record.sequence_id,
                    detail: "predecessor hash does not match previous record".into(),
                });
            }
            if !record.hash_is_valid() {
                return Err(FairlensError::ChainIntegrity {
                    sequence_id: record.sequence_id,
                    detail: "content hash does not match record fields".into(),
                });
            }
            expected_prev = record.content_hash;
        }

        Ok(ChainVerification { records_verified: records.len() })
    }

    /// Verify every stored record.
    pub fn verify_all(&self) -> Result<ChainVerification> {
        let len = self.store.len()?;
        if len == 0 {
            return Ok(ChainVerification { records_verified: 0 });
        }
        self.verify(0, len - 1)
    }

    /// The most recent `n` records, newest last. Lock-free read.
    pub fn get_tail(&self, n: usize) -> Result<Vec<CheckRecord>> {
        self.store.tail(n)
    }

    /// Fetch a single record.
    pub fn get(&self, sequence_id: u64) -> Result<Option<CheckRecord>> {
        self.store.get(sequence_id)
    }

    /// Number of records in the chain.
    pub fn len(&self) -> Result<u64> {
        self.store.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty()
    }

    /// Attach an anchor reference after the fact.
    pub fn set_anchor(&self, sequence_id: u64, anchor: AnchorRecord) -> Result<()> {
        self.store.set_anchor(sequence_id, anchor)
    }
}
