//! Host-agnostic chaincode API.
//!
//! Defines the transaction-context capability a contract receives from the
//! ledger runtime, the history entry types returned by it and the error type
//! every state call reports.

mod error;
mod stub;
mod types;
mod util;

pub use error::{ErrorKind, LedgerError};
pub use stub::ChaincodeStub;
pub use types::{KeyModification, KeyVersion, LedgerTimestamp, ReadSet, StateWrite, WriteSet};
pub use util::{new_tx_id, now_ms};
