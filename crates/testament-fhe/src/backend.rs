//! Backend traits for the FHE scheme.
//!
//! The scheme's cryptographic internals are external; these traits are the
//! boundary Testament consumes them through. Decryption is a two-phase
//! protocol: the backend returns the encoded cleartexts plus the proof
//! bundle, and the caller performs the on-chain submission itself, keeping
//! each protocol step independently testable.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use testament_shared::{
    Address, CiphertextHandle, ClearValue, DecryptionProof, FheError, InputProof,
};

/// An encrypted payload ready for ledger submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedInput {
    /// The ciphertext; stored by the ledger and exposed as a handle.
    pub handle: CiphertextHandle,
    /// Proof binding the ciphertext to `(contract, user)`.
    pub proof: InputProof,
}

/// A request to decrypt one or more ciphertext handles in the context of a
/// contract address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptionRequest {
    pub handles: Vec<CiphertextHandle>,
    pub contract: Address,
}

impl DecryptionRequest {
    pub fn single(handle: CiphertextHandle, contract: Address) -> Self {
        Self {
            handles: vec![handle],
            contract,
        }
    }
}

/// Backend decryption output.
///
/// The clear values are [`ClearValue::Advisory`]: nothing here has been
/// attested on the ledger yet. `encoded` and `proof` are exactly what a
/// verification submission carries.
#[derive(Debug, Clone)]
pub struct DecryptionResult {
    pub clear_values: HashMap<CiphertextHandle, ClearValue>,
    pub encoded: Vec<u8>,
    pub proof: DecryptionProof,
}

impl DecryptionResult {
    /// The advisory cleartext for one handle, if the backend produced it.
    pub fn advisory_value(&self, handle: &CiphertextHandle) -> Option<u64> {
        self.clear_values.get(handle).map(|v| v.value())
    }
}

/// Client-side encryption: wraps a non-negative integer amount and the
/// `(contract, user)` identity pair into a submittable payload. Must never
/// contact the ledger.
#[async_trait]
pub trait EncryptionBackend: Send + Sync {
    async fn encrypt(
        &self,
        contract: Address,
        user: Address,
        value: u64,
    ) -> Result<EncryptedInput, FheError>;
}

/// Decryption oracle: resolves ciphertext handles to cleartexts and
/// produces the attestation proof bound to `(contract, handles)`.
#[async_trait]
pub trait DecryptionBackend: Send + Sync {
    async fn decrypt(&self, request: DecryptionRequest) -> Result<DecryptionResult, FheError>;
}
