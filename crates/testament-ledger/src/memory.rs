//! In-process reference ledger.
//!
//! [`MemoryLedger`] implements the will registry contract semantics against
//! a `HashMap`: input-proof validation at creation, at-most-once
//! verification with `AlreadyVerified` for losing submissions, and
//! insertion-ordered id enumeration. Writes are applied by a spawned
//! confirmation task, never at submission time, so reads stay eventually
//! consistent until the caller awaits finality.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use ed25519_dalek::Signature;
use tracing::{debug, info};

use testament_shared::crypto::{self, SymmetricKey};
use testament_shared::identity::verify_signature;
use testament_shared::{
    Address, CiphertextHandle, DecryptionProof, LedgerError, Wallet, Will, WillId,
};

use crate::gateway::{CreateWillRequest, LedgerGateway};
use crate::tx::{PendingTx, TxReceipt};

#[derive(Default)]
struct LedgerState {
    wills: HashMap<WillId, Will>,
    order: Vec<WillId>,
}

/// Reference ledger holding the will registry in memory.
pub struct MemoryLedger {
    contract: Address,
    attestation_key: SymmetricKey,
    state: Arc<Mutex<LedgerState>>,
    available: AtomicBool,
    poisoned_reads: Mutex<HashSet<WillId>>,
    refuse_signing: AtomicBool,
    verification_count: Arc<AtomicU32>,
}

impl MemoryLedger {
    /// Create an empty ledger for the given contract address. The
    /// attestation key stands in for the decryption oracle's verification
    /// material; it must match the key the FHE backend proves under.
    pub fn new(contract: Address, attestation_key: SymmetricKey) -> Self {
        Self {
            contract,
            attestation_key,
            state: Arc::new(Mutex::new(LedgerState::default())),
            available: AtomicBool::new(true),
            poisoned_reads: Mutex::new(HashSet::new()),
            refuse_signing: AtomicBool::new(false),
            verification_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// The contract address encrypted inputs must be bound to.
    pub fn contract_address(&self) -> Address {
        self.contract
    }

    /// Number of verification proofs accepted to finality.
    pub fn verification_count(&self) -> u32 {
        self.verification_count.load(Ordering::SeqCst)
    }

    // -- test hooks ---------------------------------------------------------

    /// Make every read for `id` fail until cleared.
    pub fn poison_read(&self, id: &WillId) {
        self.poisoned_reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone());
    }

    /// Toggle the liveness probe and write acceptance.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Refuse the next signing request, simulating the user dismissing the
    /// wallet prompt. Consumed by the first subsequent write.
    pub fn refuse_next_signing(&self) {
        self.refuse_signing.store(true, Ordering::SeqCst);
    }

    // -----------------------------------------------------------------------

    fn lock_state(state: &Mutex<LedgerState>) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        state
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger state lock poisoned".into()))
    }

    fn ensure_writable(&self) -> Result<(), LedgerError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("ledger offline".into()));
        }
        if self.refuse_signing.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::SigningRejected);
        }
        Ok(())
    }

    fn read_guard(&self, id: &WillId) -> Result<(), LedgerError> {
        let poisoned = self
            .poisoned_reads
            .lock()
            .map_err(|_| LedgerError::Unavailable("poison set lock poisoned".into()))?;
        if poisoned.contains(id) {
            return Err(LedgerError::Unavailable(format!(
                "simulated read failure for {id}"
            )));
        }
        Ok(())
    }

    fn apply_create(
        state: &Mutex<LedgerState>,
        contract: Address,
        attestation_key: &SymmetricKey,
        creator: Address,
        pubkey: [u8; 32],
        digest: [u8; 32],
        signature: Signature,
        request: CreateWillRequest,
    ) -> Result<TxReceipt, LedgerError> {
        verify_signature(&pubkey, &digest, &signature)
            .map_err(|_| LedgerError::Reverted("invalid call signature".into()))?;

        let expected =
            crypto::input_proof(attestation_key, &contract, &creator, request.encrypted_data.as_bytes());
        if expected != request.proof {
            return Err(LedgerError::InvalidProof(request.id.clone()));
        }

        let mut state = Self::lock_state(state)?;
        if state.wills.contains_key(&request.id) {
            return Err(LedgerError::Reverted(format!(
                "duplicate will id: {}",
                request.id
            )));
        }

        let will = Will {
            id: request.id.clone(),
            name: request.name,
            description: request.description,
            creator,
            timestamp: Utc::now().timestamp(),
            public_value1: request.public_value1,
            public_value2: request.public_value2,
            encrypted_value: request.encrypted_data,
            is_verified: false,
            decrypted_value: 0,
        };
        state.order.push(request.id.clone());
        state.wills.insert(request.id.clone(), will);

        info!(id = %request.id, creator = %creator.short(), "will created");
        Ok(TxReceipt {
            will_id: request.id,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_verification(
        state: &Mutex<LedgerState>,
        contract: Address,
        attestation_key: &SymmetricKey,
        id: WillId,
        pubkey: [u8; 32],
        digest: [u8; 32],
        signature: Signature,
        encoded_clear: Vec<u8>,
        proof: DecryptionProof,
        verification_count: &AtomicU32,
    ) -> Result<TxReceipt, LedgerError> {
        verify_signature(&pubkey, &digest, &signature)
            .map_err(|_| LedgerError::Reverted("invalid call signature".into()))?;

        let mut state = Self::lock_state(state)?;
        let will = state
            .wills
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;

        // Authoritative at-most-once check, under the state lock: the first
        // accepted proof wins, every later one observes AlreadyVerified.
        if will.is_verified {
            return Err(LedgerError::AlreadyVerified(id));
        }

        let expected = crypto::decryption_proof(
            attestation_key,
            &contract,
            will.encrypted_value.as_bytes(),
            &encoded_clear,
        );
        if expected != proof {
            return Err(LedgerError::InvalidProof(id));
        }

        let values = testament_shared::codec::decode_clear_values(&encoded_clear)
            .map_err(|_| LedgerError::Reverted("malformed clear value encoding".into()))?;
        if values.len() != 1 {
            return Err(LedgerError::Reverted("unexpected clear value count".into()));
        }
        let value = values[0];

        will.is_verified = true;
        will.decrypted_value = value;
        verification_count.fetch_add(1, Ordering::SeqCst);

        info!(id = %id, value, "decryption verified on ledger");
        Ok(TxReceipt { will_id: id })
    }
}

#[async_trait]
impl LedgerGateway for MemoryLedger {
    async fn list_will_ids(&self) -> Result<Vec<WillId>, LedgerError> {
        let state = Self::lock_state(&self.state)?;
        Ok(state.order.clone())
    }

    async fn get_will(&self, id: &WillId) -> Result<Will, LedgerError> {
        self.read_guard(id)?;
        let state = Self::lock_state(&self.state)?;
        state
            .wills
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    async fn get_encrypted_handle(&self, id: &WillId) -> Result<CiphertextHandle, LedgerError> {
        self.read_guard(id)?;
        let state = Self::lock_state(&self.state)?;
        state
            .wills
            .get(id)
            .map(|w| w.encrypted_value.clone())
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn create_will(
        &self,
        wallet: &Wallet,
        request: CreateWillRequest,
    ) -> Result<PendingTx, LedgerError> {
        self.ensure_writable()?;

        let digest = crypto::call_digest(
            "createWill",
            &[
                request.id.as_str().as_bytes(),
                request.name.as_bytes(),
                request.encrypted_data.as_bytes(),
                &request.proof.0,
                &request.public_value1.to_be_bytes(),
                &request.public_value2.to_be_bytes(),
                request.description.as_bytes(),
            ],
        );
        let signature = wallet.sign(&digest);
        let pubkey = wallet.public_key_bytes();
        let creator = wallet.address();

        let (done, pending) = PendingTx::channel();
        let state = Arc::clone(&self.state);
        let contract = self.contract;
        let attestation_key = self.attestation_key;

        tokio::spawn(async move {
            let outcome = Self::apply_create(
                &state,
                contract,
                &attestation_key,
                creator,
                pubkey,
                digest,
                signature,
                request,
            );
            // The write is durable whether or not the submitter still waits.
            if done.send(outcome).is_err() {
                debug!("create confirmation receiver dropped");
            }
        });

        Ok(pending)
    }

    async fn submit_verification_proof(
        &self,
        wallet: &Wallet,
        id: &WillId,
        encoded_clear: Vec<u8>,
        proof: DecryptionProof,
    ) -> Result<PendingTx, LedgerError> {
        self.ensure_writable()?;

        // Fast reject before signing: no point prompting for a will that is
        // unknown or already settled. The authoritative check happens again
        // at confirmation time.
        {
            let state = Self::lock_state(&self.state)?;
            let will = state
                .wills
                .get(id)
                .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
            if will.is_verified {
                return Err(LedgerError::AlreadyVerified(id.clone()));
            }
        }

        let digest = crypto::call_digest(
            "verifyDecryption",
            &[id.as_str().as_bytes(), &encoded_clear, &proof.0],
        );
        let signature = wallet.sign(&digest);
        let pubkey = wallet.public_key_bytes();

        let (done, pending) = PendingTx::channel();
        let state = Arc::clone(&self.state);
        let contract = self.contract;
        let attestation_key = self.attestation_key;
        let id = id.clone();
        let verification_count = Arc::clone(&self.verification_count);
        tokio::spawn(async move {
            let outcome = Self::apply_verification(
                &state,
                contract,
                &attestation_key,
                id,
                pubkey,
                digest,
                signature,
                encoded_clear,
                proof,
                &verification_count,
            );
            if done.send(outcome).is_err() {
                debug!("verification confirmation receiver dropped");
            }
        });

        Ok(pending)
    }
}
