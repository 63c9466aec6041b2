use std::fs::File;
use std::future::Future;
use std::io::{BufRead, ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fs2::FileExt;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use chaincode_api::{
    ChaincodeStub, KeyModification, KeyVersion, LedgerError, LedgerTimestamp, ReadSet, StateWrite,
    WriteSet, new_tx_id, now_ms,
};

use super::config::{DiskRecord, FileLedgerConfig};

const LOCK_FILE: &str = ".lock";

// ════════════════════════════════════════════════════════════════
//  FileLedger
// ════════════════════════════════════════════════════════════════

/// Handle на каталог с world-state.
///
/// Коммиты сериализуются in-process мьютексом и flock на `{data_dir}/.lock`,
/// поэтому несколько процессов над одним каталогом тоже не пересекаются.
#[derive(Clone)]
pub struct FileLedger {
    data_dir: PathBuf,
    commit_lock: Arc<Mutex<()>>,
}

impl FileLedger {
    /// Open (and create if missing) the ledger directory.
    pub fn open(config: &FileLedgerConfig) -> Result<Self, LedgerError> {
        if config.data_dir.trim().is_empty() {
            return Err(LedgerError::config("data_dir must not be empty"));
        }
        let data_dir = PathBuf::from(&config.data_dir);
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| LedgerError::io(format!("mkdir {}: {e}", data_dir.display())))?;
        tracing::debug!(data_dir = %data_dir.display(), "opened file ledger");
        Ok(Self {
            data_dir,
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn begin(&self) -> FileTransaction {
        self.begin_with_id(new_tx_id())
    }

    pub fn begin_with_id(&self, tx_id: impl Into<String>) -> FileTransaction {
        FileTransaction {
            ledger: self.clone(),
            tx_id: tx_id.into(),
            reads: ReadSet::new(),
            writes: WriteSet::new(),
        }
    }

    /// Path of the history file for `key`: sha256 of the key in hex, so the
    /// name has a fixed length whatever the key.
    fn key_path(&self, key: &str) -> Result<PathBuf, LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::new("empty key"));
        }
        let name = hex::encode(Sha256::digest(key.as_bytes()));
        Ok(self.data_dir.join(format!("{name}.jsonl")))
    }

    /// Take the directory lock. Released when the returned file is dropped.
    fn lock_dir(&self, exclusive: bool) -> Result<File, LedgerError> {
        let path = self.data_dir.join(LOCK_FILE);
        let f = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| LedgerError::io(format!("open {}: {e}", path.display())))?;
        let locked = if exclusive { f.lock_exclusive() } else { f.lock_shared() };
        locked.map_err(|e| LedgerError::io(format!("lock {}: {e}", path.display())))?;
        Ok(f)
    }

    // ── Read ──

    /// All committed records of `key`, oldest first. A missing file means
    /// the key was never written; any other open error is reported.
    fn read_records(&self, key: &str) -> Result<Vec<DiskRecord>, LedgerError> {
        let path = self.key_path(key)?;
        let f = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LedgerError::io(format!("open {}: {e}", path.display()))),
        };

        let mut records = Vec::new();
        for line in std::io::BufReader::new(f).lines() {
            let line = line.map_err(|e| LedgerError::io(format!("read {}: {e}", path.display())))?;
            if line.is_empty() {
                continue;
            }
            records.push(parse_line(&line)?);
        }
        Ok(records)
    }

    // ── Commit ──

    fn append_record(&self, key: &str, record: &DiskRecord) -> Result<(), LedgerError> {
        let path = self.key_path(key)?;
        let line = serde_json::to_string(record)?;
        append_line(&path, &line)
    }
}

// ════════════════════════════════════════════════════════════════
//  FileTransaction
// ════════════════════════════════════════════════════════════════

/// Transaction over a `FileLedger`. Writes are buffered until `commit`;
/// dropping the transaction discards them.
pub struct FileTransaction {
    ledger: FileLedger,
    tx_id: String,
    reads: ReadSet,
    writes: WriteSet,
}

impl FileTransaction {
    /// Validate read versions and append buffered writes, all under the
    /// exclusive directory lock. On a stale read nothing is appended.
    pub async fn commit(self) -> Result<(), LedgerError> {
        let _guard = self.ledger.commit_lock.lock().await;
        let _dir_lock = self.ledger.lock_dir(true)?;

        for (key, read_version) in self.reads.take() {
            let current = self.ledger.read_records(&key)?.len() as KeyVersion;
            if current != read_version {
                tracing::warn!(
                    tx_id = %self.tx_id,
                    key = %key,
                    read_version,
                    current,
                    "mvcc read conflict"
                );
                return Err(LedgerError::conflict(&self.tx_id, &key));
            }
        }

        let writes = self.writes.take();
        let count = writes.len();
        let ts_ms = now_ms();

        for (key, write) in writes {
            let (is_delete, value) = match write {
                StateWrite::Put(value) => (false, STANDARD.encode(value)),
                StateWrite::Delete => (true, String::new()),
            };
            let record = DiskRecord {
                tx_id: self.tx_id.clone(),
                ts_ms,
                is_delete,
                value,
            };
            self.ledger.append_record(&key, &record)?;
        }

        tracing::info!(
            tx_id = %self.tx_id,
            writes = count,
            data_dir = %self.ledger.data_dir.display(),
            "committed transaction"
        );
        Ok(())
    }
}

impl ChaincodeStub for FileTransaction {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn get_state(&self, key: &str)
        -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>, LedgerError>> + Send + '_>>
    {
        let key = key.to_string();
        Box::pin(async move {
            let records = {
                let _dir_lock = self.ledger.lock_dir(false)?;
                self.ledger.read_records(&key)?
            };
            self.reads.record(&key, records.len() as KeyVersion);

            let current = match records.last() {
                Some(record) if !record.is_delete => Some(decode_value(&record.value)?),
                _ => None,
            };
            tracing::debug!(tx_id = %self.tx_id, key = %key, found = current.is_some(), "get_state");
            Ok(current)
        })
    }

    fn put_state(&self, key: &str, value: Vec<u8>)
        -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>>
    {
        let key = key.to_string();
        Box::pin(async move {
            self.ledger.key_path(&key)?;
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
            self.ledger.key_path(&key)?;
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
            let records = {
                let _dir_lock = self.ledger.lock_dir(false)?;
                self.ledger.read_records(&key)?
            };
            let mods = records
                .into_iter()
                .map(|record| {
                    Ok(KeyModification {
                        value: decode_value(&record.value)?,
                        tx_id: record.tx_id,
                        timestamp: LedgerTimestamp::from_ms(record.ts_ms),
                        is_delete: record.is_delete,
                    })
                })
                .collect::<Result<Vec<_>, LedgerError>>()?;
            tracing::debug!(tx_id = %self.tx_id, key = %key, entries = mods.len(), "get_history_for_key");
            Ok(mods)
        })
    }
}

// ════════════════════════════════════════════════════════════════
//  Helpers
// ════════════════════════════════════════════════════════════════

fn parse_line(line: &str) -> Result<DiskRecord, LedgerError> {
    serde_json::from_str(line).map_err(|e| LedgerError::format_err(format!("parse json: {e}")))
}

fn decode_value(value: &str) -> Result<Vec<u8>, LedgerError> {
    STANDARD
        .decode(value)
        .map_err(|e| LedgerError::format_err(format!("decode value: {e}")))
}

fn append_line(path: &Path, line: &str) -> Result<(), LedgerError> {
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LedgerError::io(format!("open {}: {e}", path.display())))?;
    writeln!(f, "{line}").map_err(|e| LedgerError::io(format!("write: {e}")))?;
    f.sync_data().map_err(|e| LedgerError::io(format!("sync: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincode_api::ErrorKind;
    use tempfile::tempdir;

    fn open(dir: &Path) -> FileLedger {
        FileLedger::open(&FileLedgerConfig {
            data_dir: dir.to_string_lossy().into_owned(),
        })
        .unwrap()
    }

    fn key_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|ext| ext == "jsonl"))
            .count()
    }

    #[tokio::test]
    async fn test_commit_and_read_back() {
        let dir = tempdir().unwrap();
        let ledger = open(dir.path());

        let tx = ledger.begin_with_id("tx1");
        tx.put_state("1001", br#"{"value":"a"}"#.to_vec()).await.unwrap();
        assert_eq!(tx.get_state("1001").await.unwrap(), None);
        tx.commit().await.unwrap();

        let reader = ledger.begin();
        assert_eq!(
            reader.get_state("1001").await.unwrap(),
            Some(br#"{"value":"a"}"#.to_vec())
        );
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let ledger = open(dir.path());
            let tx = ledger.begin_with_id("tx1");
            tx.put_state("1001", b"1".to_vec()).await.unwrap();
            tx.commit().await.unwrap();

            let tx = ledger.begin_with_id("tx2");
            tx.put_state("1001", b"2".to_vec()).await.unwrap();
            tx.commit().await.unwrap();
        }

        let reopened = open(dir.path());
        let reader = reopened.begin();
        assert_eq!(reader.get_state("1001").await.unwrap(), Some(b"2".to_vec()));

        let history = reader.get_history_for_key("1001").await.unwrap();
        let tx_ids: Vec<&str> = history.iter().map(|m| m.tx_id.as_str()).collect();
        assert_eq!(tx_ids, vec!["tx1", "tx2"]);
    }

    #[tokio::test]
    async fn test_delete_appends_tombstone() {
        let dir = tempdir().unwrap();
        let ledger = open(dir.path());

        let tx = ledger.begin();
        tx.put_state("a/b", b"x".to_vec()).await.unwrap();
        tx.commit().await.unwrap();

        let tx = ledger.begin();
        tx.delete_state("a/b").await.unwrap();
        tx.commit().await.unwrap();

        let reader = ledger.begin();
        assert_eq!(reader.get_state("a/b").await.unwrap(), None);
        let history = reader.get_history_for_key("a/b").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].is_delete);
        assert!(history[1].value.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_transaction_writes_nothing() {
        let dir = tempdir().unwrap();
        let ledger = open(dir.path());
        {
            let tx = ledger.begin();
            tx.put_state("1001", b"x".to_vec()).await.unwrap();
        }
        assert_eq!(key_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_unknown_key_has_empty_history() {
        let dir = tempdir().unwrap();
        let ledger = open(dir.path());
        let reader = ledger.begin();
        assert!(reader.get_history_for_key("nope").await.unwrap().is_empty());
        assert!(reader.put_state("", b"x".to_vec()).await.is_err());
    }

    #[tokio::test]
    async fn test_long_key_round_trip() {
        let dir = tempdir().unwrap();
        let ledger = open(dir.path());
        let key = "w".repeat(200);

        let tx = ledger.begin_with_id("tx-long");
        tx.put_state(&key, b"1".to_vec()).await.unwrap();
        tx.commit().await.unwrap();

        let reader = ledger.begin();
        assert_eq!(reader.get_state(&key).await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(reader.get_history_for_key(&key).await.unwrap()[0].tx_id, "tx-long");
        assert_eq!(key_files(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_stale_read_commit_rejected() {
        let dir = tempdir().unwrap();
        let ledger = open(dir.path());
        // Second handle on the same directory: only the directory lock is shared.
        let other = open(dir.path());

        let a = ledger.begin_with_id("ta");
        let b = other.begin_with_id("tb");
        assert_eq!(a.get_state("1001").await.unwrap(), None);
        assert_eq!(b.get_state("1001").await.unwrap(), None);
        a.put_state("1001", b"a".to_vec()).await.unwrap();
        b.put_state("1001", b"b".to_vec()).await.unwrap();

        a.commit().await.unwrap();
        let err = b.commit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let reader = ledger.begin();
        assert_eq!(reader.get_state("1001").await.unwrap(), Some(b"a".to_vec()));
        let history = reader.get_history_for_key("1001").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].tx_id, "ta");
    }

    #[test]
    fn test_empty_data_dir_is_config_error() {
        let err = FileLedger::open(&FileLedgerConfig { data_dir: String::new() })
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
