//! Wedding registration chaincode.
//!
//! CRUD and history over wedding registration records keyed by
//! registration id. Values are opaque JSON documents; the contract only
//! checks existence, validates that payloads are JSON and delegates every
//! state access to the `ChaincodeStub` supplied by the host.

mod config;
mod contract;
mod error;
mod history;
mod invoke;

pub use config::{ContractConfig, HistoryExportConfig};
pub use contract::WeddingContract;
pub use error::ContractError;
pub use history::{HistoryEntry, HistoryResult, STATUS_SUCCESS};
pub use invoke::Function;
