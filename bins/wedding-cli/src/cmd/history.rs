use wedding_contract::HistoryResult;

use crate::config::{HistoryArgs, WeddingConfig};
use crate::error::CliError;

/// Print the history of one registration as a pretty JSON array.
pub async fn run(config_path: &str, args: HistoryArgs) -> Result<(), CliError> {
    let config = WeddingConfig::load(config_path)?;
    let payload = super::invoke::execute(&config, "readHistory", &[args.id]).await?;

    let result: HistoryResult = serde_json::from_slice(&payload)?;
    let entries = result.entries()?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
