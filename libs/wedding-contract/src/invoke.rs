use chaincode_api::{ChaincodeStub, LedgerError};

use crate::contract::WeddingContract;
use crate::error::ContractError;

/// Contract functions addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Exists,
    Create,
    Read,
    Update,
    Delete,
    ReadHistory,
}

impl Function {
    /// Resolve a chaincode function name. Accepts both the registered
    /// names (`createWedding`, ...) and the short aliases (`create`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "weddingExists" | "exists" => Some(Function::Exists),
            "createWedding" | "create" => Some(Function::Create),
            "readWedding" | "read" => Some(Function::Read),
            "updateWedding" | "update" => Some(Function::Update),
            "deleteWedding" | "delete" => Some(Function::Delete),
            "readHistory" | "history" => Some(Function::ReadHistory),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Exists => "weddingExists",
            Function::Create => "createWedding",
            Function::Read => "readWedding",
            Function::Update => "updateWedding",
            Function::Delete => "deleteWedding",
            Function::ReadHistory => "readHistory",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Function::Create | Function::Update => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl WeddingContract {
    /// Dispatch a named invocation with positional string arguments and
    /// return the response payload. Unit results yield an empty payload.
    pub async fn invoke(
        &self,
        ctx: &dyn ChaincodeStub,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, ContractError> {
        let func = Function::parse(function)
            .ok_or_else(|| ContractError::UnknownFunction(function.to_string()))?;
        if args.len() != func.arity() {
            return Err(ContractError::ArgumentCount {
                function: func.name(),
                expected: func.arity(),
                got: args.len(),
            });
        }

        tracing::debug!(function = %func, tx_id = %ctx.tx_id(), "invoke");
        let id = args[0].as_str();

        match func {
            Function::Exists => {
                let exists = self.exists(ctx, id).await?;
                Ok(exists.to_string().into_bytes())
            }
            Function::Create => {
                self.create(ctx, id, &args[1]).await?;
                Ok(Vec::new())
            }
            Function::Read => {
                let value = self.read(ctx, id).await?;
                Ok(serde_json::to_vec(&value).map_err(LedgerError::from)?)
            }
            Function::Update => {
                self.update(ctx, id, &args[1]).await?;
                Ok(Vec::new())
            }
            Function::Delete => {
                self.delete(ctx, id).await?;
                Ok(Vec::new())
            }
            Function::ReadHistory => {
                let result = self.read_history(ctx, id).await?;
                Ok(serde_json::to_vec(&result).map_err(LedgerError::from)?)
            }
        }
    }
}
