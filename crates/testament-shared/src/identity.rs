use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::WillError;
use crate::types::Address;

/// A wallet identity based on Ed25519. The ledger account address is derived
/// from the public key; a connected wallet is a precondition for every
/// ledger write and for decryption.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
}

/// Serializable format for storing/exporting a wallet
#[derive(Serialize, Deserialize)]
pub struct WalletExport {
    pub secret_key: [u8; 32],
    pub public_key: [u8; 32],
}

impl Wallet {
    /// Generate a new random wallet
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Restore a wallet from secret key bytes
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        Self { signing_key }
    }

    /// Restore a wallet from a serialized export
    pub fn from_export(export: &WalletExport) -> Self {
        Self::from_secret_bytes(&export.secret_key)
    }

    /// The ledger account address (BLAKE3 of the public key, first 20 bytes)
    pub fn address(&self) -> Address {
        crate::crypto::derive_address(&self.public_key_bytes())
    }

    /// Get the raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message (a canonical call digest for ledger writes)
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Get the verifying (public) key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Export the wallet for serialization
    pub fn to_export(&self) -> WalletExport {
        WalletExport {
            secret_key: *self.signing_key.as_bytes(),
            public_key: self.signing_key.verifying_key().to_bytes(),
        }
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret key.
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish()
    }
}

/// Verify a call signature against a public key
pub fn verify_signature(
    pubkey_bytes: &[u8; 32],
    message: &[u8],
    signature: &Signature,
) -> Result<(), WillError> {
    let verifying_key = VerifyingKey::from_bytes(pubkey_bytes)
        .map_err(|_| WillError::Transient("invalid public key bytes".into()))?;
    verifying_key
        .verify(message, signature)
        .map_err(|_| WillError::Transient("signature verification failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_generation() {
        let wallet = Wallet::generate();
        assert_eq!(wallet.address().0.len(), 20);
    }

    #[test]
    fn test_wallet_roundtrip() {
        let wallet = Wallet::generate();
        let export = wallet.to_export();
        let restored = Wallet::from_export(&export);
        assert_eq!(wallet.address(), restored.address());
    }

    #[test]
    fn test_sign_verify() {
        let wallet = Wallet::generate();
        let message = b"create-will:will-1";
        let signature = wallet.sign(message);

        assert!(verify_signature(&wallet.public_key_bytes(), message, &signature).is_ok());

        // Wrong message should fail
        assert!(verify_signature(&wallet.public_key_bytes(), b"wrong", &signature).is_err());
    }

    #[test]
    fn test_address_deterministic() {
        let wallet = Wallet::generate();
        assert_eq!(wallet.address(), wallet.address());

        let other = Wallet::generate();
        assert_ne!(wallet.address(), other.address());
    }
}
