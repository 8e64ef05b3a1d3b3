//! The verified-decryption protocol.
//!
//! Drives one will's encrypted amount from ciphertext handle to on-chain
//! attested cleartext: fetch handle, request proof from the decryption
//! backend, submit the proof, await finality, re-read. The local view of
//! `is_verified` is always re-derived from a ledger read, never set
//! optimistically before finality.
//!
//! At most one proof submission wins per will. A racer that loses observes
//! `AlreadyVerified` and converges to the winning value instead of failing;
//! that branch is the protocol's central correctness property.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use testament_fhe::{DecryptionBackend, DecryptionRequest};
use testament_ledger::LedgerGateway;
use testament_shared::{Address, ClearValue, Wallet, WillError, WillId};

use crate::events::{emit, ClientEvent, EventSender};

/// Phases of a single `decrypt` invocation. Steps are strictly sequential;
/// all "is busy" predicates derive from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecryptPhase {
    /// Rest state before any run; never emitted by the protocol itself,
    /// presentation layers start each will from it.
    NotRequested,
    FetchingHandle,
    RequestingProof,
    SubmittingProof,
    AwaitingFinality,
    Verified,
    Failed,
}

/// One-shot driver for the verified-decryption protocol.
pub struct Decryptor {
    gateway: Arc<dyn LedgerGateway>,
    backend: Arc<dyn DecryptionBackend>,
    contract: Address,
    wallet: Wallet,
    events: EventSender,
}

impl Decryptor {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        backend: Arc<dyn DecryptionBackend>,
        contract: Address,
        wallet: Wallet,
        events: EventSender,
    ) -> Self {
        Self {
            gateway,
            backend,
            contract,
            wallet,
            events,
        }
    }

    fn phase(&self, id: &WillId, phase: DecryptPhase) {
        debug!(id = %id, ?phase, "decrypt phase");
        emit(
            &self.events,
            ClientEvent::Decrypt {
                will: id.clone(),
                phase,
            },
        );
    }

    /// Run the protocol for one will and return its attested cleartext.
    pub async fn run(&self, id: &WillId) -> Result<ClearValue, WillError> {
        match self.drive(id).await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.phase(id, DecryptPhase::Failed);
                Err(e)
            }
        }
    }

    async fn drive(&self, id: &WillId) -> Result<ClearValue, WillError> {
        self.phase(id, DecryptPhase::FetchingHandle);
        let will = self.gateway.get_will(id).await?;

        // Idempotence: an already-verified will short-circuits to its stored
        // value; re-running the proof path would only waste an on-chain
        // write.
        if will.is_verified {
            debug!(id = %id, "already verified, returning stored value");
            self.phase(id, DecryptPhase::Verified);
            return Ok(ClearValue::Attested(will.decrypted_value));
        }

        let handle = self.gateway.get_encrypted_handle(id).await?;

        self.phase(id, DecryptPhase::RequestingProof);
        let result = self
            .backend
            .decrypt(DecryptionRequest::single(handle, self.contract))
            .await
            .map_err(|e| WillError::DecryptionFailed(e.to_string()))?;
        // result already carries an advisory cleartext here, but nothing is
        // returned until the ledger has attested it.

        self.phase(id, DecryptPhase::SubmittingProof);
        let submitted = self
            .gateway
            .submit_verification_proof(&self.wallet, id, result.encoded, result.proof)
            .await;

        let outcome = match submitted {
            Ok(pending) => {
                self.phase(id, DecryptPhase::AwaitingFinality);
                pending.wait().await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(_receipt) => {
                info!(id = %id, "decryption proof accepted");
                self.phase(id, DecryptPhase::Verified);
                self.read_attested(id).await
            }
            // Lost a race: another submission won between our read and our
            // confirmation. Converge to the winning value.
            Err(e) if e.is_already_verified() => {
                info!(id = %id, "already verified by concurrent submission, converging");
                self.phase(id, DecryptPhase::Verified);
                self.read_attested(id).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Re-read the will and return its now-authoritative cleartext.
    async fn read_attested(&self, id: &WillId) -> Result<ClearValue, WillError> {
        let will = self.gateway.get_will(id).await?;
        if !will.is_verified {
            // Finality promised the flag; a read disagreeing is a gateway
            // consistency fault, retryable by the caller.
            return Err(WillError::Transient(
                "verified flag not yet visible after finality".into(),
            ));
        }
        Ok(ClearValue::Attested(will.decrypted_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Rig;

    #[tokio::test]
    async fn test_decrypt_attests_on_ledger() {
        let rig = Rig::new().await;
        rig.create_will("will-1000", "estate", "house", 42).await;
        let id = WillId::from("will-1000");

        let decryptor = rig.decryptor();
        let value = decryptor.run(&id).await.unwrap();

        assert_eq!(value, ClearValue::Attested(42));
        let will = rig.get_will(&id).await;
        assert!(will.is_verified);
        assert_eq!(will.decrypted_value, 42);
        assert_eq!(rig.ledger.verification_count(), 1);
    }

    #[tokio::test]
    async fn test_repeat_decrypt_submits_no_new_proof() {
        let rig = Rig::new().await;
        rig.create_will("will-1000", "estate", "house", 42).await;
        let id = WillId::from("will-1000");

        let decryptor = rig.decryptor();
        decryptor.run(&id).await.unwrap();
        assert_eq!(rig.ledger.verification_count(), 1);

        // Second run short-circuits on the stored value.
        let value = decryptor.run(&id).await.unwrap();
        assert_eq!(value, ClearValue::Attested(42));
        assert_eq!(rig.ledger.verification_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_decrypts_converge() {
        let rig = Rig::new().await;
        rig.create_will("will-race", "estate", "house", 42).await;
        let id = WillId::from("will-race");

        let a = rig.decryptor();
        let b = rig.decryptor();
        let (ra, rb) = tokio::join!(a.run(&id), b.run(&id));

        // Exactly one submission wins; both callers converge to the same
        // attested value.
        assert_eq!(ra.unwrap(), ClearValue::Attested(42));
        assert_eq!(rb.unwrap(), ClearValue::Attested(42));
        assert_eq!(rig.ledger.verification_count(), 1);
    }

    #[tokio::test]
    async fn test_externally_verified_will_returns_stored_value() {
        let rig = Rig::new().await;
        rig.create_will("will-7", "estate", "house", 7).await;
        let id = WillId::from("will-7");
        rig.verify_on_ledger(&id, 7).await;

        let value = rig.decryptor().run(&id).await.unwrap();
        assert_eq!(value, ClearValue::Attested(7));
        assert_eq!(rig.ledger.verification_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_signing_leaves_will_unverified() {
        let rig = Rig::new().await;
        rig.create_will("will-a", "estate", "house", 42).await;
        let id = WillId::from("will-a");

        // Backend decryption will succeed, but the submission never happens:
        // no verified flag may be cached from the advisory cleartext.
        rig.ledger.refuse_next_signing();
        let result = rig.decryptor().run(&id).await;

        assert!(matches!(result, Err(WillError::UserRejectedSigning)));
        assert!(!rig.get_will(&id).await.is_verified);
        assert_eq!(rig.ledger.verification_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_will_is_not_found() {
        let rig = Rig::new().await;
        let result = rig.decryptor().run(&WillId::from("missing")).await;
        assert!(matches!(result, Err(WillError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_phase_sequence_on_success() {
        let mut rig = Rig::new().await;
        rig.create_will("will-a", "estate", "house", 1).await;
        let id = WillId::from("will-a");

        rig.decryptor().run(&id).await.unwrap();

        let phases = rig.drain_decrypt_phases(&id);
        assert_eq!(
            phases,
            vec![
                DecryptPhase::FetchingHandle,
                DecryptPhase::RequestingProof,
                DecryptPhase::SubmittingProof,
                DecryptPhase::AwaitingFinality,
                DecryptPhase::Verified,
            ]
        );
    }
}
