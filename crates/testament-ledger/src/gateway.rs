//! Read/write façade over the will registry contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use testament_shared::{
    CiphertextHandle, DecryptionProof, InputProof, LedgerError, Wallet, Will, WillId,
};

use crate::tx::PendingTx;

/// Parameters for a will creation write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWillRequest {
    pub id: WillId,
    pub name: String,
    pub description: String,
    /// Ciphertext of the asset amount; stored verbatim, exposed only as a
    /// handle afterwards.
    pub encrypted_data: CiphertextHandle,
    /// Proof binding the ciphertext to the contract and the submitter;
    /// validated ledger-side before acceptance.
    pub proof: InputProof,
    pub public_value1: u64,
    /// Reserved; always submitted as 0.
    pub public_value2: u64,
}

/// Gateway to the will registry ledger.
///
/// Read operations need no signature. Write operations require a connected
/// [`Wallet`] and return a [`PendingTx`] that must be awaited to finality
/// before the write is durable.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Enumerate all known will ids in ledger-insertion order. The order is
    /// not stable across calls if wills were created concurrently.
    async fn list_will_ids(&self) -> Result<Vec<WillId>, LedgerError>;

    /// Fetch a snapshot of one will.
    async fn get_will(&self, id: &WillId) -> Result<Will, LedgerError>;

    /// Fetch the ciphertext handle stored for one will.
    async fn get_encrypted_handle(&self, id: &WillId) -> Result<CiphertextHandle, LedgerError>;

    /// Liveness probe; no side effect.
    async fn is_available(&self) -> bool;

    /// Submit a new will. Rejected ledger-side if the input proof does not
    /// match the ciphertext.
    async fn create_will(
        &self,
        wallet: &Wallet,
        request: CreateWillRequest,
    ) -> Result<PendingTx, LedgerError>;

    /// Submit a decryption proof for a will. On acceptance the ledger sets
    /// `is_verified = true` exactly once and stores the decoded cleartext.
    /// Fails with [`LedgerError::AlreadyVerified`] if a prior submission
    /// already won; callers must treat that as a non-error outcome.
    async fn submit_verification_proof(
        &self,
        wallet: &Wallet,
        id: &WillId,
        encoded_clear: Vec<u8>,
        proof: DecryptionProof,
    ) -> Result<PendingTx, LedgerError>;
}
