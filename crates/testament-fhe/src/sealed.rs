//! In-process reference backend.
//!
//! `SealedBackend` stands in for a real FHE scheme: the "ciphertext" is an
//! XChaCha20-Poly1305 sealing of the amount and the "proofs" are keyed
//! BLAKE3 MACs under an attestation key shared with the verifying ledger.
//! Good enough to exercise every pass/fail path the protocol consumes;
//! not a cryptosystem.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use testament_shared::codec::encode_clear_values;
use testament_shared::crypto::{self, SymmetricKey};
use testament_shared::{Address, CiphertextHandle, ClearValue, FheError};

use crate::backend::{
    DecryptionBackend, DecryptionRequest, DecryptionResult, EncryptedInput, EncryptionBackend,
};
use crate::runtime::{FheRuntime, FheSession};

/// Reference encryption/decryption backend over a symmetric sealing key.
pub struct SealedBackend {
    sealing_key: SymmetricKey,
    attestation_key: SymmetricKey,
}

impl SealedBackend {
    pub fn new(sealing_key: SymmetricKey, attestation_key: SymmetricKey) -> Self {
        Self {
            sealing_key,
            attestation_key,
        }
    }
}

#[async_trait]
impl EncryptionBackend for SealedBackend {
    async fn encrypt(
        &self,
        contract: Address,
        user: Address,
        value: u64,
    ) -> Result<EncryptedInput, FheError> {
        let sealed = crypto::seal(&self.sealing_key, &value.to_le_bytes())
            .map_err(FheError::Crypto)?;
        let proof = crypto::input_proof(&self.attestation_key, &contract, &user, &sealed);

        debug!(contract = %contract.short(), user = %user.short(), "amount encrypted");
        Ok(EncryptedInput {
            handle: CiphertextHandle(sealed),
            proof,
        })
    }
}

#[async_trait]
impl DecryptionBackend for SealedBackend {
    async fn decrypt(&self, request: DecryptionRequest) -> Result<DecryptionResult, FheError> {
        if request.handles.is_empty() {
            return Err(FheError::Backend("empty decryption request".into()));
        }

        let mut clear_values = HashMap::with_capacity(request.handles.len());
        let mut values = Vec::with_capacity(request.handles.len());
        let mut bound = Vec::new();

        for handle in &request.handles {
            let plain = crypto::open(&self.sealing_key, handle.as_bytes())
                .map_err(|_| FheError::UnknownHandle(handle.to_hex()))?;
            let bytes: [u8; 8] = plain
                .try_into()
                .map_err(|_| FheError::Backend("unexpected plaintext width".into()))?;
            let value = u64::from_le_bytes(bytes);

            clear_values.insert(handle.clone(), ClearValue::Advisory(value));
            values.push(value);
            bound.extend_from_slice(handle.as_bytes());
        }

        // The proof binds the contract and the handles (in request order) to
        // the encoded cleartexts; for a single handle this is exactly what
        // the ledger recomputes at verification.
        let encoded = encode_clear_values(&values);
        let proof =
            crypto::decryption_proof(&self.attestation_key, &request.contract, &bound, &encoded);

        Ok(DecryptionResult {
            clear_values,
            encoded,
            proof,
        })
    }
}

/// Runtime producing [`SealedBackend`] sessions.
pub struct SealedRuntime {
    sealing_key: SymmetricKey,
    attestation_key: SymmetricKey,
    fail_next_init: AtomicBool,
}

impl SealedRuntime {
    pub fn new(sealing_key: SymmetricKey, attestation_key: SymmetricKey) -> Self {
        Self {
            sealing_key,
            attestation_key,
            fail_next_init: AtomicBool::new(false),
        }
    }

    /// Fresh runtime with random keys.
    pub fn generate() -> Self {
        Self::new(crypto::generate_key(), crypto::generate_key())
    }

    /// The key the ledger must verify attestations under.
    pub fn attestation_key(&self) -> SymmetricKey {
        self.attestation_key
    }

    /// Make the next `initialize` call fail. Consumed on use.
    pub fn fail_next_init(&self) {
        self.fail_next_init.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FheRuntime for SealedRuntime {
    async fn initialize(&self) -> Result<Arc<FheSession>, FheError> {
        if self.fail_next_init.swap(false, Ordering::SeqCst) {
            return Err(FheError::Backend("simulated initialization failure".into()));
        }

        let backend = Arc::new(SealedBackend::new(self.sealing_key, self.attestation_key));
        Ok(Arc::new(FheSession {
            encryptor: backend.clone(),
            decryptor: backend,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> SealedBackend {
        SealedBackend::new(crypto::generate_key(), crypto::generate_key())
    }

    #[tokio::test]
    async fn test_encrypt_decrypt_roundtrip() {
        let backend = backend();
        let contract = Address([1; 20]);
        let user = Address([2; 20]);

        let input = backend.encrypt(contract, user, 42).await.unwrap();
        let result = backend
            .decrypt(DecryptionRequest::single(input.handle.clone(), contract))
            .await
            .unwrap();

        assert_eq!(result.advisory_value(&input.handle), Some(42));
        // Backend output is advisory, never attested.
        assert!(!result.clear_values[&input.handle].is_attested());
        assert_eq!(result.encoded, encode_clear_values(&[42]));
    }

    #[tokio::test]
    async fn test_foreign_handle_rejected() {
        let first = backend();
        let other = backend();
        let contract = Address([1; 20]);

        let input = other.encrypt(contract, Address([2; 20]), 7).await.unwrap();
        let result = first
            .decrypt(DecryptionRequest::single(input.handle, contract))
            .await;

        assert!(matches!(result, Err(FheError::UnknownHandle(_))));
    }

    #[tokio::test]
    async fn test_proof_bound_to_contract() {
        let backend = backend();
        let input = backend
            .encrypt(Address([0xAA; 20]), Address([2; 20]), 9)
            .await
            .unwrap();

        let a = backend
            .decrypt(DecryptionRequest::single(
                input.handle.clone(),
                Address([0xAA; 20]),
            ))
            .await
            .unwrap();
        let b = backend
            .decrypt(DecryptionRequest::single(input.handle, Address([0xBB; 20])))
            .await
            .unwrap();

        // Same handle, same cleartext; the proof must still differ per
        // contract or it would be replayable across contracts.
        assert_eq!(a.encoded, b.encoded);
        assert_ne!(a.proof, b.proof);
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let backend = backend();
        let request = DecryptionRequest {
            handles: vec![],
            contract: Address([1; 20]),
        };
        assert!(matches!(
            backend.decrypt(request).await,
            Err(FheError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_runtime_init_failure_is_consumed() {
        let runtime = SealedRuntime::generate();
        runtime.fail_next_init();

        assert!(runtime.initialize().await.is_err());
        assert!(runtime.initialize().await.is_ok());
    }
}
