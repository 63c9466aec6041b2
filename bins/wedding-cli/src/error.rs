#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("{0}")]
    Contract(#[from] wedding_contract::ContractError),

    #[error("ledger: {0}")]
    Ledger(#[from] chaincode_api::LedgerError),

    #[error("decode response: {0}")]
    Response(#[from] serde_json::Error),
}
