//! World-state persisted as JSON lines, one file per key.
//!
//! Every committed modification is appended to `{data_dir}/{sha256(key)}.jsonl`;
//! the last line is the current state, the whole file is the key's history.
//! The number of lines is the key's version, checked at commit against what
//! the transaction read.

mod config;
mod storage;

pub use config::FileLedgerConfig;
pub use storage::{FileLedger, FileTransaction};
