//! Append-only JSON-lines store.
//!
//! One record per line, flushed and fsynced per append, so the file itself
//! is the tamper-evidence artifact independent of any database engine.
//! Records carry their own `content_hash`/`prev_hash`, so a full-file read
//! plus a chain walk is all an external auditor needs.

use super::RecordStore;
use crate::anchor::AnchorRecord;
use crate::error::{FairlensError, Result};
use crate::record::CheckRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct JsonlState {
    file: File,
    // In-memory mirror for reads; the file is the durable artifact.
    records: Vec<CheckRecord>,
}

/// Durable append-only store over a JSONL file.
///
/// Anchor references attached via [`RecordStore::set_anchor`] live in the
/// in-memory mirror only: the file stays strictly append-only, and anchors
/// are externally keyed by content hash, so they are recoverable from the
/// anchor service after a reopen.
pub struct JsonlStore {
    path: PathBuf,
    state: Mutex<JsonlState>,
}

impl JsonlStore {
    /// Open or create the audit log at `path`, loading existing records.
    ///
    /// A malformed line is a hard error: the log is evidence, and silently
    /// skipping damage would hide tampering.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut records = Vec::new();

        if path.exists() {
            let reader = BufReader::new(
                File::open(&path).map_err(|e| FairlensError::io("opening audit log", e))?,
            );
            for (line_no, line) in reader.lines().enumerate() {
                let line = line.map_err(|e| FairlensError::io("reading audit log", e))?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: CheckRecord = serde_json::from_str(&line).map_err(|e| {
                    FairlensError::Serialization(format!(
                        "audit log line {} is not a valid record: {e}",
                        line_no + 1
                    ))
                })?;
                records.push(record);
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| FairlensError::io("opening audit log for append", e))?;

        Ok(Self { path, state: Mutex::new(JsonlState { file, records }) })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JsonlState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RecordStore for JsonlStore {
    fn append(&self, record: &CheckRecord) -> Result<()> {
        let mut state = self.lock();
        if record.sequence_id != state.records.len() as u64 {
            return Err(FairlensError::StorageWrite(format!(
                "append out of order: expected sequence {}, got {}",
                state.records.len(),
                record.sequence_id
            )));
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        state
            .file
            .write_all(line.as_bytes())
            .and_then(|()| state.file.flush())
            .and_then(|()| state.file.sync_data())
            .map_err(|e| FairlensError::StorageWrite(format!("appending record: {e}")))?;

        state.records.push(record.clone());
        Ok(())
    }

    fn get(&self, sequence_id: u64) -> Result<Option<CheckRecord>> {
        Ok(self.lock().records.get(sequence_id as usize).cloned())
    }

    fn last(&self) -> Result<Option<CheckRecord>> {
        Ok(self.lock().records.last().cloned())
    }

    fn tail(&self, n: usize) -> Result<Vec<CheckRecord>> {
        let state = self.lock();
        let skip = state.records.len().saturating_sub(n);
        Ok(state.records[skip..].to_vec())
    }

    fn range(&self, from: u64, to: u64) -> Result<Vec<CheckRecord>> {
        let state = self.lock();
        let from = from as usize;
        let to = (to as usize).min(state.records.len().saturating_sub(1));
        if from > to || state.records.is_empty() {
            return Ok(Vec::new());
        }
        Ok(state.records[from..=to].to_vec())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.lock().records.len() as u64)
    }

    fn set_anchor(&self, sequence_id: u64, anchor: AnchorRecord) -> Result<()> {
        let mut state = self.lock();
        let record = state
            .records
            .get_mut(sequence_id as usize)
            .ok_or_else(|| FairlensError::NotFound(format!("record {sequence_id}")))?;
        record.anchor_ref = Some(anchor);
        Ok(())
    }
}
