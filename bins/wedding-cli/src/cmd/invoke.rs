use chaincode_api::ErrorKind;
use storage_file::FileLedger;
use wedding_contract::WeddingContract;

use crate::config::{InvokeArgs, WeddingConfig};
use crate::error::CliError;

pub async fn run(config_path: &str, args: InvokeArgs) -> Result<(), CliError> {
    let config = WeddingConfig::load(config_path)?;
    let payload = execute(&config, &args.function, &args.args).await?;
    if !payload.is_empty() {
        println!("{}", String::from_utf8_lossy(&payload));
    }
    Ok(())
}

/// Run one transaction: begin, invoke, commit on success. On failure the
/// transaction is dropped and its writes are discarded.
pub async fn execute(config: &WeddingConfig, function: &str, args: &[String]) -> Result<Vec<u8>, CliError> {
    let ledger = FileLedger::open(&config.ledger)?;
    let contract = WeddingContract::new(&config.contract);

    let tx = ledger.begin();
    let payload = match contract.invoke(&tx, function, args).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(function = %function, error = %e, "transaction aborted");
            return Err(e.into());
        }
    };
    if let Err(e) = tx.commit().await {
        if e.kind() == ErrorKind::Conflict {
            tracing::warn!(function = %function, error = %e, "commit rejected, resubmit the transaction");
        }
        return Err(e.into());
    }
    Ok(payload)
}
