//! Client-side projection of the will registry.
//!
//! The registry is a disposable cache: `reload` replaces the whole set with
//! a fresh ledger read, never patching individual entries, so there is no
//! stale-entry reconciliation after concurrent writes. A read failure for
//! one id is logged and that id skipped; the rest still load.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use testament_ledger::LedgerGateway;
use testament_shared::{Will, WillError, WillId};

/// Best-effort display aggregate over the cached wills.
///
/// `total_amount` mixes attested cleartexts (verified wills) with the
/// untrusted `public_value1` of unverified ones; it is a display figure,
/// not a financial guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub verified: usize,
    pub total_amount: u64,
}

#[derive(Default)]
pub struct WillRegistry {
    inner: RwLock<HashMap<WillId, Will>>,
}

impl WillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cache from the ledger. Per-id read failures are caught
    /// and skipped; only a failing id enumeration aborts the reload.
    /// Returns the number of wills loaded.
    pub async fn reload(&self, gateway: &dyn LedgerGateway) -> Result<usize, WillError> {
        let ids = gateway.list_will_ids().await?;

        let mut fresh = HashMap::with_capacity(ids.len());
        for id in ids {
            match gateway.get_will(&id).await {
                Ok(will) => {
                    fresh.insert(id, will);
                }
                Err(e) => warn!(id = %id, error = %e, "skipping will during reload"),
            }
        }

        let count = fresh.len();
        *self.inner.write().await = fresh;
        Ok(count)
    }

    pub async fn get(&self, id: &WillId) -> Option<Will> {
        self.inner.read().await.get(id).cloned()
    }

    /// All cached wills, oldest first.
    pub async fn snapshot(&self) -> Vec<Will> {
        let mut wills: Vec<Will> = self.inner.read().await.values().cloned().collect();
        wills.sort_by(|a, b| (a.timestamp, &a.id.0).cmp(&(b.timestamp, &b.id.0)));
        wills
    }

    /// Case-insensitive substring filter over name and description.
    /// Does not mutate the cache.
    pub async fn search(&self, term: &str) -> Vec<Will> {
        let needle = term.to_lowercase();
        let mut wills: Vec<Will> = self
            .inner
            .read()
            .await
            .values()
            .filter(|w| {
                w.name.to_lowercase().contains(&needle)
                    || w.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        wills.sort_by(|a, b| (a.timestamp, &a.id.0).cmp(&(b.timestamp, &b.id.0)));
        wills
    }

    pub async fn stats(&self) -> RegistryStats {
        let inner = self.inner.read().await;
        let verified = inner.values().filter(|w| w.is_verified).count();
        let total_amount = inner
            .values()
            .map(|w| {
                if w.is_verified {
                    w.decrypted_value
                } else {
                    w.public_value1
                }
            })
            .sum();
        RegistryStats {
            total: inner.len(),
            verified,
            total_amount,
        }
    }
}
