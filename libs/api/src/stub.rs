use std::future::Future;
use std::pin::Pin;

use crate::{KeyModification, LedgerError};

// ════════════════════════════════════════════════════════════════
//  Transaction context
// ════════════════════════════════════════════════════════════════

/// Per-transaction capability handed to a contract by the ledger runtime.
///
/// Reads observe committed world-state only; writes are buffered by the
/// host and become visible after the host commits the transaction. If the
/// contract returns an error the host discards the buffered writes.
///
/// Implementations: `MemoryTransaction` (tests), `FileTransaction` (CLI).
pub trait ChaincodeStub: Send + Sync {
    /// Identifier of the transaction this stub belongs to.
    fn tx_id(&self) -> &str;

    /// Current committed value of `key`. `None` = key absent or deleted.
    fn get_state(&self, key: &str)
        -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>, LedgerError>> + Send + '_>>;

    /// Stage a write of `value` under `key`.
    fn put_state(&self, key: &str, value: Vec<u8>)
        -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>>;

    /// Stage removal of `key`.
    fn delete_state(&self, key: &str)
        -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>>;

    /// Every committed modification of `key`, oldest first.
    fn get_history_for_key(&self, key: &str)
        -> Pin<Box<dyn Future<Output = Result<Vec<KeyModification>, LedgerError>> + Send + '_>>;
}
