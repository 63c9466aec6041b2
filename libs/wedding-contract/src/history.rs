use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use chaincode_api::{KeyModification, LedgerTimestamp};

use crate::config::HistoryExportConfig;

pub const STATUS_SUCCESS: &str = "Success!";

/// One materialized history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryEntry {
    pub tx_id: String,
    pub timestamp: LedgerTimestamp,
    pub is_delete: bool,
    /// Parsed JSON value; the raw text if the bytes are not JSON;
    /// `null` for deletes.
    pub value: Value,
}

impl From<KeyModification> for HistoryEntry {
    fn from(m: KeyModification) -> Self {
        let value = if m.value.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&m.value)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&m.value).into_owned()))
        };
        Self {
            tx_id: m.tx_id,
            timestamp: m.timestamp,
            is_delete: m.is_delete,
            value,
        }
    }
}

/// Result of `readHistory`: a status literal and the history array
/// serialized as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResult {
    pub status: String,
    pub history: String,
}

impl HistoryResult {
    pub fn success(history: String) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            history,
        }
    }

    /// Decode the `history` string back into entries.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, serde_json::Error> {
        serde_json::from_str(&self.history)
    }
}

pub(crate) fn materialize(modifications: Vec<KeyModification>) -> Vec<HistoryEntry> {
    modifications.into_iter().map(HistoryEntry::from).collect()
}

// ════════════════════════════════════════════════════════════════
//  Export
// ════════════════════════════════════════════════════════════════

pub(crate) struct HistoryExport {
    path: Option<PathBuf>,
}

impl HistoryExport {
    pub(crate) fn new(config: &HistoryExportConfig) -> Self {
        Self {
            path: config.enabled.then(|| PathBuf::from(&config.path)),
        }
    }

    /// Overwrite the export file. Never fails the caller.
    pub(crate) async fn write(&self, id: &str, contents: &str) {
        let Some(path) = &self.path else {
            return;
        };
        match tokio::fs::write(path, contents).await {
            Ok(()) => tracing::info!(id = %id, path = %path.display(), "exported wedding history"),
            Err(e) => tracing::warn!(id = %id, path = %path.display(), error = %e, "history export failed"),
        }
    }
}
