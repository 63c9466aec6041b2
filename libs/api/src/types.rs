use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  LedgerTimestamp
// ════════════════════════════════════════════════════════════════

/// Commit time of a transaction, in the `{seconds, nanos}` shape the
/// ledger reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerTimestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl LedgerTimestamp {
    pub fn from_ms(ms: i64) -> Self {
        Self {
            seconds: ms.div_euclid(1000),
            nanos: (ms.rem_euclid(1000) * 1_000_000) as i32,
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  KeyModification
// ════════════════════════════════════════════════════════════════

/// One committed modification of a key, as returned by
/// `ChaincodeStub::get_history_for_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: String,
    pub timestamp: LedgerTimestamp,
    pub is_delete: bool,
    /// Value written by the transaction. Empty for deletes.
    pub value: Vec<u8>,
}

// ════════════════════════════════════════════════════════════════
//  WriteSet
// ════════════════════════════════════════════════════════════════

/// Pending write of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateWrite {
    Put(Vec<u8>),
    Delete,
}

/// Writes staged by a transaction until the host commits it.
///
/// Last write per key wins. Drained in key order so that commits are
/// deterministic.
#[derive(Debug, Default)]
pub struct WriteSet {
    writes: Mutex<BTreeMap<String, StateWrite>>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, value: Vec<u8>) {
        self.lock().insert(key.to_string(), StateWrite::Put(value));
    }

    pub fn delete(&self, key: &str) {
        self.lock().insert(key.to_string(), StateWrite::Delete);
    }

    /// Drain the staged writes.
    pub fn take(&self) -> Vec<(String, StateWrite)> {
        std::mem::take(&mut *self.lock()).into_iter().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StateWrite>> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ════════════════════════════════════════════════════════════════
//  ReadSet
// ════════════════════════════════════════════════════════════════

/// Version of a key as seen by a transaction: the number of committed
/// modifications of that key. `0` = never written.
pub type KeyVersion = u64;

/// Key versions observed by `get_state`, validated by the host at commit.
///
/// Only the first read of a key is recorded; a later commit by another
/// transaction makes the recorded version stale.
#[derive(Debug, Default)]
pub struct ReadSet {
    reads: Mutex<BTreeMap<String, KeyVersion>>,
}

impl ReadSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: &str, version: KeyVersion) {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_insert(version);
    }

    /// Drain the recorded versions.
    pub fn take(&self) -> Vec<(String, KeyVersion)> {
        std::mem::take(&mut *self.reads.lock().unwrap_or_else(PoisonError::into_inner))
            .into_iter()
            .collect()
    }
}
