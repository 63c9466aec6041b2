use chaincode_api::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("The wedding {0} already exists")]
    AlreadyExists(String),

    #[error("The wedding {0} does not exist")]
    NotFound(String),

    #[error("invalid payload for wedding {id}: {source}")]
    InvalidPayload {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored state of wedding {id} is not valid JSON: {source}")]
    CorruptState {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        function: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}
