use std::path::Path;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use storage_file::FileLedgerConfig;
use wedding_contract::ContractConfig;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "wedding-cli", about = "Wedding registration chaincode host")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "wedding.toml", env = "WEDDING_CONFIG")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one transaction invoking a contract function
    Invoke(InvokeArgs),
    /// Print the history of a registration as a JSON array
    History(HistoryArgs),
}

#[derive(Args, Clone, Debug)]
pub struct InvokeArgs {
    /// Function name, e.g. createWedding or create
    pub function: String,
    /// Positional arguments passed to the function
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args, Clone, Debug)]
pub struct HistoryArgs {
    /// Registration id
    pub id: String,
}

// ---- TOML Config ----

#[derive(Debug, Default, Deserialize)]
pub struct WeddingConfig {
    #[serde(flatten)]
    pub ledger: FileLedgerConfig,
    #[serde(flatten)]
    pub contract: ContractConfig,
}

impl WeddingConfig {
    /// Load the config file; a missing file yields the defaults.
    pub fn load(path: &str) -> Result<Self, CliError> {
        if !Path::new(path).exists() {
            tracing::info!(config = %path, "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|e| CliError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
