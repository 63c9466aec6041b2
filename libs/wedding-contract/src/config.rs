use serde::Deserialize;

fn default_export_enabled() -> bool {
    true
}

fn default_export_path() -> String {
    "history.json".to_string()
}

/// Local export of the last `readHistory` result.
///
/// The file sits outside the ledger's transactional boundary: it is
/// overwritten on every call and write failures are only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryExportConfig {
    #[serde(default = "default_export_enabled")]
    pub enabled: bool,
    #[serde(default = "default_export_path")]
    pub path: String,
}

impl Default for HistoryExportConfig {
    fn default() -> Self {
        Self {
            enabled: default_export_enabled(),
            path: default_export_path(),
        }
    }
}

impl HistoryExportConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractConfig {
    #[serde(default)]
    pub history_export: HistoryExportConfig,
}
