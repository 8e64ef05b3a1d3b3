use thiserror::Error;

use crate::types::WillId;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptionFailed,

    #[error("Invalid key length")]
    InvalidKeyLength,
}

/// Errors from the FHE encryption/decryption backends.
#[derive(Error, Debug)]
pub enum FheError {
    /// The cryptographic context has not been initialized yet. Callers must
    /// complete initialization (gated on a connected identity) first.
    #[error("FHE context not initialized")]
    NotInitialized,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The backend does not know the given ciphertext handle.
    #[error("Unknown ciphertext handle: {0}")]
    UnknownHandle(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by a ledger gateway, read or write path.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Will not found: {0}")]
    NotFound(WillId),

    /// A prior verification proof already won for this will. Callers must
    /// treat this as an idempotent non-error outcome and converge to the
    /// stored value.
    #[error("Will already verified: {0}")]
    AlreadyVerified(WillId),

    /// The ledger rejected the proof/ciphertext binding.
    #[error("Invalid proof for will: {0}")]
    InvalidProof(WillId),

    /// Transaction reverted on-chain for any other reason.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// The user refused to sign the transaction.
    #[error("Signing rejected by user")]
    SigningRejected,

    /// The ledger could not be reached; safe to retry.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    pub fn is_already_verified(&self) -> bool {
        matches!(self, Self::AlreadyVerified(_))
    }
}

/// Top-level error taxonomy for user-facing will operations.
#[derive(Error, Debug)]
pub enum WillError {
    #[error("No wallet connected")]
    NotConnected,

    #[error("Will not found: {0}")]
    NotFound(WillId),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(#[source] FheError),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Ledger rejected transaction: {0}")]
    LedgerRejected(#[source] LedgerError),

    #[error("Transaction rejected by user")]
    UserRejectedSigning,

    #[error("Transient failure: {0}")]
    Transient(String),
}

// The propagation policy: ledger failures map onto the operation taxonomy,
// keeping NotFound / user rejection / retryable hiccups distinct.
impl From<LedgerError> for WillError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(id) => WillError::NotFound(id),
            LedgerError::SigningRejected => WillError::UserRejectedSigning,
            LedgerError::Unavailable(msg) => WillError::Transient(msg),
            other => WillError::LedgerRejected(other),
        }
    }
}
