use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::RwLock;

use chaincode_api::{
    ChaincodeStub, KeyModification, KeyVersion, LedgerError, LedgerTimestamp, ReadSet, StateWrite,
    WriteSet, new_tx_id, now_ms,
};

type History = HashMap<String, Vec<KeyModification>>;

fn version_of(history: &History, key: &str) -> KeyVersion {
    history.get(key).map_or(0, |mods| mods.len() as KeyVersion)
}

// ═══════════════════════════════════════════════════════════════
//  MemoryLedger
// ═══════════════════════════════════════════════════════════════

/// In-process world-state с полной историей по каждому ключу.
///
/// Текущее значение ключа — его последняя модификация, если это не delete.
/// Clone разделяет одно и то же состояние.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    history: Arc<RwLock<History>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a transaction with a freshly generated id.
    pub fn begin(&self) -> MemoryTransaction {
        self.begin_with_id(new_tx_id())
    }

    pub fn begin_with_id(&self, tx_id: impl Into<String>) -> MemoryTransaction {
        MemoryTransaction {
            ledger: self.clone(),
            tx_id: tx_id.into(),
            reads: ReadSet::new(),
            writes: WriteSet::new(),
        }
    }

    /// Commit a single put in its own transaction.
    pub async fn seed(&self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        let tx = self.begin();
        tx.put_state(key, value.to_vec()).await?;
        tx.commit().await
    }

    /// Number of keys with a live (non-deleted) value.
    pub async fn live_keys(&self) -> usize {
        let history = self.history.read().await;
        history
            .values()
            .filter(|mods| mods.last().is_some_and(|m| !m.is_delete))
            .count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryTransaction
// ═══════════════════════════════════════════════════════════════

/// Transaction over a `MemoryLedger`. Writes are buffered until `commit`;
/// dropping the transaction discards them.
pub struct MemoryTransaction {
    ledger: MemoryLedger,
    tx_id: String,
    reads: ReadSet,
    writes: WriteSet,
}

impl MemoryTransaction {
    /// Validate the read set and apply buffered writes, both under the
    /// ledger's write lock. A stale read fails the whole transaction with
    /// `ErrorKind::Conflict` and nothing is written.
    pub async fn commit(self) -> Result<(), LedgerError> {
        let reads = self.reads.take();
        let writes = self.writes.take();
        let count = writes.len();

        let mut history = self.ledger.history.write().await;
        for (key, read_version) in reads {
            if version_of(&history, &key) != read_version {
                tracing::warn!(tx_id = %self.tx_id, key = %key, "mvcc read conflict");
                return Err(LedgerError::conflict(&self.tx_id, &key));
            }
        }

        let timestamp = LedgerTimestamp::from_ms(now_ms());
        for (key, write) in writes {
            let (is_delete, value) = match write {
                StateWrite::Put(value) => (false, value),
                StateWrite::Delete => (true, Vec::new()),
            };
            history.entry(key).or_default().push(KeyModification {
                tx_id: self.tx_id.clone(),
                timestamp,
                is_delete,
                value,
            });
        }

        tracing::info!(tx_id = %self.tx_id, writes = count, "committed transaction");
        Ok(())
    }
}

impl ChaincodeStub for MemoryTransaction {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn get_state(&self, key: &str)
        -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>, LedgerError>> + Send + '_>>
    {
        let key = key.to_string();
        Box::pin(async move {
            let history = self.ledger.history.read().await;
            self.reads.record(&key, version_of(&history, &key));
            let current = history
                .get(&key)
                .and_then(|mods| mods.last())
                .filter(|m| !m.is_delete)
                .map(|m| m.value.clone());
            tracing::debug!(tx_id = %self.tx_id, key = %key, found = current.is_some(), "get_state");
            Ok(current)
        })
    }

    fn put_state(&self, key: &str, value: Vec<u8>)
        -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>>
    {
        let key = key.to_string();
        Box::pin(async move {
            if key.is_empty() {
                return Err(LedgerError::new("empty key"));
            }
            tracing::debug!(tx_id = %self.tx_id, key = %key, bytes = value.len(), "put_state");
            self.writes.put(&key, value);
            Ok(())
        })
    }

    fn delete_state(&self, key: &str)
        -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>>
    {
        let key = key.to_string();
        Box::pin(async move {
            if key.is_empty() {
                return Err(LedgerError::new("empty key"));
            }
            tracing::debug!(tx_id = %self.tx_id, key = %key, "delete_state");
            self.writes.delete(&key);
            Ok(())
        })
    }

    fn get_history_for_key(&self, key: &str)
        -> Pin<Box<dyn Future<Output = Result<Vec<KeyModification>, LedgerError>> + Send + '_>>
    {
        let key = key.to_string();
        Box::pin(async move {
            let history = self.ledger.history.read().await;
            let mods = history.get(&key).cloned().unwrap_or_default();
            tracing::debug!(tx_id = %self.tx_id, key = %key, entries = mods.len(), "get_history_for_key");
            Ok(mods)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincode_api::ErrorKind;

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let ledger = MemoryLedger::new();
        let tx = ledger.begin();
        tx.put_state("1001", b"{}".to_vec()).await.unwrap();

        assert_eq!(tx.get_state("1001").await.unwrap(), None);

        tx.commit().await.unwrap();
        let reader = ledger.begin();
        assert_eq!(reader.get_state("1001").await.unwrap(), Some(b"{}".to_vec()));
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let ledger = MemoryLedger::new();
        {
            let tx = ledger.begin();
            tx.put_state("1001", b"{}".to_vec()).await.unwrap();
        }
        assert_eq!(ledger.live_keys().await, 0);
        assert!(ledger.begin().get_history_for_key("1001").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_hides_value_but_keeps_history() {
        let ledger = MemoryLedger::new();
        ledger.seed("1001", b"\"a\"").await.unwrap();

        let tx = ledger.begin_with_id("tx-delete");
        tx.delete_state("1001").await.unwrap();
        tx.commit().await.unwrap();

        let reader = ledger.begin();
        assert_eq!(reader.get_state("1001").await.unwrap(), None);

        let history = reader.get_history_for_key("1001").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].is_delete);
        assert_eq!(history[0].value, b"\"a\"".to_vec());
        assert!(history[1].is_delete);
        assert_eq!(history[1].tx_id, "tx-delete");
        assert!(history[1].value.is_empty());
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let ledger = MemoryLedger::new();
        let tx = ledger.begin();
        assert!(tx.put_state("", b"x".to_vec()).await.is_err());
        assert!(tx.delete_state("").await.is_err());
    }

    #[tokio::test]
    async fn test_stale_read_commit_rejected() {
        let ledger = MemoryLedger::new();
        let a = ledger.begin_with_id("ta");
        let b = ledger.begin_with_id("tb");

        assert_eq!(a.get_state("1001").await.unwrap(), None);
        assert_eq!(b.get_state("1001").await.unwrap(), None);
        a.put_state("1001", br#"{"who":"a"}"#.to_vec()).await.unwrap();
        b.put_state("1001", br#"{"who":"b"}"#.to_vec()).await.unwrap();

        a.commit().await.unwrap();
        let err = b.commit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let reader = ledger.begin();
        assert_eq!(reader.get_state("1001").await.unwrap(), Some(br#"{"who":"a"}"#.to_vec()));
        let history = reader.get_history_for_key("1001").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].tx_id, "ta");
    }

    #[tokio::test]
    async fn test_stale_delete_rejected_after_update() {
        let ledger = MemoryLedger::new();
        ledger.seed("1001", b"1").await.unwrap();

        let deleter = ledger.begin();
        assert!(deleter.get_state("1001").await.unwrap().is_some());
        deleter.delete_state("1001").await.unwrap();

        let updater = ledger.begin();
        updater.get_state("1001").await.unwrap();
        updater.put_state("1001", b"2".to_vec()).await.unwrap();
        updater.commit().await.unwrap();

        assert_eq!(deleter.commit().await.unwrap_err().kind(), ErrorKind::Conflict);
        assert_eq!(ledger.live_keys().await, 1);
    }

    #[tokio::test]
    async fn test_disjoint_keys_commit_independently() {
        let ledger = MemoryLedger::new();
        let a = ledger.begin();
        let b = ledger.begin();
        a.get_state("1001").await.unwrap();
        b.get_state("1002").await.unwrap();
        a.put_state("1001", b"a".to_vec()).await.unwrap();
        b.put_state("1002", b"b".to_vec()).await.unwrap();

        a.commit().await.unwrap();
        b.commit().await.unwrap();
        assert_eq!(ledger.live_keys().await, 2);
    }
}
