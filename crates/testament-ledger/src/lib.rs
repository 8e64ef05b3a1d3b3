//! # testament-ledger
//!
//! Gateway to the will registry ledger: the [`LedgerGateway`] trait, the
//! pending-transaction/finality types, and [`MemoryLedger`], an in-process
//! reference implementation of the contract semantics.

pub mod gateway;
pub mod memory;
pub mod tx;

pub use gateway::{CreateWillRequest, LedgerGateway};
pub use memory::MemoryLedger;
pub use tx::{PendingTx, TxReceipt};
