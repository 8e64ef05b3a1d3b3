//! Shared test fixture: an in-memory ledger wired to a sealed-box FHE
//! runtime under one attestation key, plus one funded identity.

use std::sync::Arc;

use testament_fhe::{FheRuntime, FheSession, SealedRuntime};
use testament_ledger::{CreateWillRequest, LedgerGateway, MemoryLedger};
use testament_shared::constants::RESERVED_PUBLIC_VALUE2;
use testament_shared::crypto::{self, SymmetricKey};
use testament_shared::{codec, Address, Wallet, Will, WillId};

use crate::events::{self, ClientEvent, EventReceiver, EventSender};
use crate::protocol::{DecryptPhase, Decryptor};

pub struct Rig {
    pub ledger: Arc<MemoryLedger>,
    pub session: Arc<FheSession>,
    pub wallet: Wallet,
    pub contract: Address,
    attestation_key: SymmetricKey,
    events_tx: EventSender,
    events_rx: EventReceiver,
}

impl Rig {
    pub async fn new() -> Self {
        let runtime = SealedRuntime::generate();
        let attestation_key = runtime.attestation_key();
        let contract = Address([0xCC; 20]);
        let ledger = Arc::new(MemoryLedger::new(contract, attestation_key));
        let session = runtime.initialize().await.unwrap();
        let (events_tx, events_rx) = events::channel();
        Self {
            ledger,
            session,
            wallet: Wallet::generate(),
            contract,
            attestation_key,
            events_tx,
            events_rx,
        }
    }

    /// Create a will with a fixed id and wait for confirmation.
    pub async fn create_will(&self, id: &str, name: &str, description: &str, amount: u64) {
        let encrypted = self
            .session
            .encryptor
            .encrypt(self.contract, self.wallet.address(), amount)
            .await
            .unwrap();
        let request = CreateWillRequest {
            id: WillId::from(id),
            name: name.to_string(),
            description: description.to_string(),
            encrypted_data: encrypted.handle,
            proof: encrypted.proof,
            public_value1: amount,
            public_value2: RESERVED_PUBLIC_VALUE2,
        };
        let pending = self.ledger.create_will(&self.wallet, request).await.unwrap();
        pending.wait().await.unwrap();
    }

    /// Attest `value` for a will directly, as an out-of-band verifier
    /// holding the attestation key would.
    pub async fn verify_on_ledger(&self, id: &WillId, value: u64) {
        let handle = self.ledger.get_encrypted_handle(id).await.unwrap();
        let encoded = codec::encode_clear_values(&[value]);
        let proof = crypto::decryption_proof(
            &self.attestation_key,
            &self.contract,
            handle.as_bytes(),
            &encoded,
        );
        let pending = self
            .ledger
            .submit_verification_proof(&self.wallet, id, encoded, proof)
            .await
            .unwrap();
        pending.wait().await.unwrap();
    }

    pub fn decryptor(&self) -> Decryptor {
        Decryptor::new(
            self.ledger.clone(),
            self.session.decryptor.clone(),
            self.contract,
            self.wallet.clone(),
            self.events_tx.clone(),
        )
    }

    pub async fn get_will(&self, id: &WillId) -> Will {
        self.ledger.get_will(id).await.unwrap()
    }

    /// Collect the decrypt phase transitions emitted so far for one will.
    pub fn drain_decrypt_phases(&mut self, id: &WillId) -> Vec<DecryptPhase> {
        let mut phases = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if let ClientEvent::Decrypt { will, phase } = event {
                if &will == id {
                    phases.push(phase);
                }
            }
        }
        phases
    }
}
