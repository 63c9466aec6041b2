/// Category of a ledger error. Lets the host tell a resubmittable
/// transaction apart from a broken store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unusable ledger configuration (e.g. empty `data_dir`).
    Config,
    /// I/O error while reading or committing world-state.
    Io,
    /// Persisted state could not be decoded.
    Format,
    /// A key read by the transaction was modified by another transaction
    /// before commit. The client may resubmit.
    Conflict,
    /// Invalid key or other misuse of the stub.
    Logic,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Format => f.write_str("format"),
            ErrorKind::Conflict => f.write_str("mvcc conflict"),
            ErrorKind::Logic => f.write_str("logic"),
        }
    }
}

/// Error returned by every `ChaincodeStub` call and by host commits.
#[derive(Clone)]
pub struct LedgerError {
    kind: ErrorKind,
    message: String,
}

impl LedgerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Logic, message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Io, message: msg.into() }
    }

    pub fn format_err(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    /// Stale read of `key` detected at commit.
    pub fn conflict(tx_id: &str, key: &str) -> Self {
        Self {
            kind: ErrorKind::Conflict,
            message: format!("transaction {tx_id}: key '{key}' changed since it was read"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl std::fmt::Debug for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LedgerError {}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self { Self { kind: ErrorKind::Format, message: e.to_string() } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_is_format_kind() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(LedgerError::from(json).kind(), ErrorKind::Format);
    }

    #[test]
    fn test_conflict_names_key_and_tx() {
        let e = LedgerError::conflict("tx-b", "1001");
        assert_eq!(e.kind(), ErrorKind::Conflict);
        assert_eq!(e.to_string(), "transaction tx-b: key '1001' changed since it was read");
        assert!(format!("{e:?}").starts_with("[mvcc conflict]"));
    }
}
