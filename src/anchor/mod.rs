//! External anchoring of audit content hashes.
//!
//! An anchor is an independently checkable reference to a record's content
//! hash, providing non-repudiation beyond the chain's own storage. The
//! trait keeps the interface forward-compatible with a real asynchronous
//! ledger (which would confirm eventually); the in-process simulation
//! confirms immediately but callers must not assume that.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

/// First simulated block number.
const GENESIS_BLOCK: u64 = 1_000_000;

/// Registration state of an anchor.
///
/// The simulation resolves to `Confirmed` synchronously; a network-backed
/// implementation would surface `Pending` until the ledger confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnchorStatus {
    Pending,
    Confirmed,
}

/// Permanent external reference for one content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// Transaction-style reference id (`0x`-prefixed digest).
    pub ref_id: String,
    /// Ledger the hash was registered with.
    pub network: String,
    /// Block the registration landed in (simulated counter).
    pub block_number: u64,
    /// Registration timestamp (UTC).
    pub registered_at: DateTime<Utc>,
    /// PENDING until the ledger confirms; transitions exactly once.
    pub status: AnchorStatus,
}

/// Verifiability substrate the audit chain registers hashes with.
pub trait AnchorService: Send + Sync {
    /// Register a content hash, returning its permanent reference.
    ///
    /// Idempotent: re-anchoring a hash returns the existing record.
    fn anchor(&self, content_hash: [u8; 32]) -> Result<AnchorRecord>;

    /// Look up the anchor for a content hash. Pure read.
    fn lookup(&self, content_hash: [u8; 32]) -> Option<AnchorRecord>;

    /// Most recent anchors, oldest first.
    fn recent(&self, limit: usize) -> Vec<AnchorRecord>;

    /// Confirm that a claimed reference id matches the stored anchor for
    /// a hash.
    fn verify_anchor(&self, content_hash: [u8; 32], ref_id: &str) -> bool {
        self.lookup(content_hash).is_some_and(|a| a.ref_id == ref_id)
    }
}

struct LedgerState {
    anchors: HashMap<[u8; 32], AnchorRecord>,
    order: Vec<[u8; 32]>,
    next_block: u64,
}

/// In-process ledger simulation.
///
/// Registrations are deterministic digests of the anchored hash and
/// timestamp, stored keyed by content hash, confirmed immediately.
pub struct SimulatedLedger {
    network: String,
    state: RwLock<LedgerState>,
}

impl SimulatedLedger {
    /// Ledger reporting the default `sim-local` network.
    pub fn new() -> Self {
        Self::with_network("sim-local")
    }

    /// Ledger reporting a custom network name.
    pub fn with_network(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            state: RwLock::new(LedgerState {
                anchors: HashMap::new(),
                order: Vec::new(),
                next_block: GENESIS_BLOCK,
            }),
        }
    }

    fn synthesize_ref_id(content_hash: &[u8; 32], registered_at: DateTime<Utc>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"fairlens-anchor");
        hasher.update(content_hash);
        hasher.update(registered_at.timestamp_micros().to_le_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorService for SimulatedLedger {
    fn anchor(&self, content_hash: [u8; 32]) -> Result<AnchorRecord> {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(existing) = state.anchors.get(&content_hash) {
            return Ok(existing.clone());
        }

        let registered_at = Utc::now();
        let record = AnchorRecord {
            ref_id: Self::synthesize_ref_id(&content_hash, registered_at),
            network: self.network.clone(),
            block_number: state.next_block,
            registered_at,
            status: AnchorStatus::Confirmed,
        };
        state.next_block += 1;
        state.order.push(content_hash);
        state.anchors.insert(content_hash, record.clone());
        Ok(record)
    }

    fn lookup(&self, content_hash: [u8; 32]) -> Option<AnchorRecord> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .anchors
            .get(&content_hash)
            .cloned()
    }

    fn recent(&self, limit: usize) -> Vec<AnchorRecord> {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let skip = state.order.len().saturating_sub(limit);
        state.order[skip..]
            .iter()
            .filter_map(|h| state.anchors.get(h).cloned())
            .collect()
    }
}
