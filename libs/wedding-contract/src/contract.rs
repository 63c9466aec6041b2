use serde_json::Value;

use chaincode_api::{ChaincodeStub, LedgerError};

use crate::config::ContractConfig;
use crate::error::ContractError;
use crate::history::{self, HistoryExport, HistoryResult};

// ════════════════════════════════════════════════════════════════
//  WeddingContract
// ════════════════════════════════════════════════════════════════

/// Wedding registration contract.
///
/// Stateless between invocations: every operation takes the transaction
/// context of the current invocation and touches exactly one key.
pub struct WeddingContract {
    export: HistoryExport,
}

impl Default for WeddingContract {
    fn default() -> Self {
        Self::new(&ContractConfig::default())
    }
}

impl WeddingContract {
    pub fn new(config: &ContractConfig) -> Self {
        Self {
            export: HistoryExport::new(&config.history_export),
        }
    }

    /// True iff a non-empty value is stored under `id`.
    pub async fn exists(&self, ctx: &dyn ChaincodeStub, id: &str) -> Result<bool, ContractError> {
        Ok(self.load(ctx, id).await?.is_some())
    }

    pub async fn create(&self, ctx: &dyn ChaincodeStub, id: &str, data: &str) -> Result<(), ContractError> {
        if self.exists(ctx, id).await? {
            return Err(ContractError::AlreadyExists(id.to_string()));
        }
        let bytes = normalize_payload(id, data)?;
        ctx.put_state(id, bytes).await?;
        tracing::info!(id = %id, tx_id = %ctx.tx_id(), "created wedding");
        Ok(())
    }

    pub async fn read(&self, ctx: &dyn ChaincodeStub, id: &str) -> Result<Value, ContractError> {
        let bytes = self.require(ctx, id).await?;
        serde_json::from_slice(&bytes).map_err(|source| ContractError::CorruptState {
            id: id.to_string(),
            source,
        })
    }

    /// Replace the stored document. No field merging.
    pub async fn update(&self, ctx: &dyn ChaincodeStub, id: &str, data: &str) -> Result<(), ContractError> {
        self.require(ctx, id).await?;
        let bytes = normalize_payload(id, data)?;
        ctx.put_state(id, bytes).await?;
        tracing::info!(id = %id, tx_id = %ctx.tx_id(), "updated wedding");
        Ok(())
    }

    pub async fn delete(&self, ctx: &dyn ChaincodeStub, id: &str) -> Result<(), ContractError> {
        self.require(ctx, id).await?;
        ctx.delete_state(id).await?;
        tracing::info!(id = %id, tx_id = %ctx.tx_id(), "deleted wedding");
        Ok(())
    }

    /// Every committed version of `id`, oldest first, serialized as a JSON
    /// array. Also written to the export file when export is enabled.
    pub async fn read_history(&self, ctx: &dyn ChaincodeStub, id: &str) -> Result<HistoryResult, ContractError> {
        self.require(ctx, id).await?;

        let modifications = ctx.get_history_for_key(id).await?;
        let entries = history::materialize(modifications);
        let serialized = serde_json::to_string(&entries)
            .map_err(LedgerError::from)?;

        self.export.write(id, &serialized).await;
        Ok(HistoryResult::success(serialized))
    }

    // ── Helpers ──

    async fn load(&self, ctx: &dyn ChaincodeStub, id: &str) -> Result<Option<Vec<u8>>, ContractError> {
        let state = ctx.get_state(id).await?;
        Ok(state.filter(|bytes| !bytes.is_empty()))
    }

    async fn require(&self, ctx: &dyn ChaincodeStub, id: &str) -> Result<Vec<u8>, ContractError> {
        self.load(ctx, id)
            .await?
            .ok_or_else(|| ContractError::NotFound(id.to_string()))
    }
}

/// Parse `data` as JSON and re-serialize it. Key order is preserved.
fn normalize_payload(id: &str, data: &str) -> Result<Vec<u8>, ContractError> {
    let invalid = |source| ContractError::InvalidPayload {
        id: id.to_string(),
        source,
    };
    let value: Value = serde_json::from_str(data).map_err(invalid)?;
    serde_json::to_vec(&value).map_err(invalid)
}
