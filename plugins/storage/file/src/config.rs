// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

fn default_data_dir() -> String {
    "./ledger".to_string()
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FileLedgerConfig {
    /// Каталог с одним `.jsonl` файлом на ключ.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for FileLedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  On-disk record format
// ════════════════════════════════════════════════════════════════

/// Одна закоммиченная модификация. Ключ задаётся именем файла (sha256).
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct DiskRecord {
    pub tx_id: String,
    pub ts_ms: i64,
    #[serde(default)]
    pub is_delete: bool,
    /// Base64 of the stored bytes; empty for deletes.
    #[serde(default)]
    pub value: String,
}
