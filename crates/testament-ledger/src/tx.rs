//! Pending transactions and finality.
//!
//! A ledger write returns a [`PendingTx`] immediately; its effects are only
//! durable once [`PendingTx::wait`] resolves. Until then, reads may observe
//! the pre-transaction state (eventual consistency, not linearizable).

use tokio::sync::oneshot;

use testament_shared::{LedgerError, WillId};

/// Receipt for a transaction that reached finality successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// The will the transaction acted on.
    pub will_id: WillId,
}

/// A submitted but not yet final transaction.
///
/// Dropping a `PendingTx` abandons the local wait only; the in-flight write
/// still completes on the ledger and its effects remain durable.
#[derive(Debug)]
pub struct PendingTx {
    rx: oneshot::Receiver<Result<TxReceipt, LedgerError>>,
}

impl PendingTx {
    /// Create a pending transaction plus the sender its confirmation task
    /// resolves it with.
    pub fn channel() -> (oneshot::Sender<Result<TxReceipt, LedgerError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Await finality. Returns the receipt on success, or the ledger's
    /// rejection reason if the transaction reverted.
    pub async fn wait(self) -> Result<TxReceipt, LedgerError> {
        self.rx
            .await
            .map_err(|_| LedgerError::Unavailable("transaction confirmation dropped".into()))?
    }
}
