//! Ledger (token store) access
//!
//! One ledger record is the head pointer of one document: it carries the
//! current content address and a memo holding the encoded version chain.
//! Records are never deleted. The concrete ledger lives outside this crate;
//! [`MemoryLedger`] is an in-process implementation.

mod memory;
mod provider;

pub use memory::{MemoryLedger, MemoryLedgerError};
pub use provider::{LedgerError, LedgerProvider, LedgerRecord, RecordId};
