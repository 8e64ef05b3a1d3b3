use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use crate::constants::{
    ADDRESS_SIZE, MAC_CONTEXT_ADDRESS, MAC_CONTEXT_CALL_SIGNATURE, MAC_CONTEXT_DECRYPTION_PROOF,
    MAC_CONTEXT_INPUT_PROOF, NONCE_SIZE,
};
use crate::error::CryptoError;
use crate::types::{Address, DecryptionProof, InputProof};

pub type SymmetricKey = [u8; 32];

pub fn generate_key() -> SymmetricKey {
    let mut key = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

// Returns nonce || ciphertext (24 bytes nonce prepended)
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce_bytes = generate_nonce();
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

pub fn open(key: &SymmetricKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce = XNonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

// Keyed BLAKE3 MAC with a domain-separation context prefix
fn keyed_mac(key: &SymmetricKey, context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_keyed(key);
    hasher.update(context.as_bytes());
    for part in parts {
        // Length-prefix each part so boundaries are unambiguous.
        hasher.update(&(part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Attestation MAC binding `(contract, user, ciphertext)`, produced by the
/// encryption backend and checked by the ledger at creation.
pub fn input_proof(
    attestation_key: &SymmetricKey,
    contract: &Address,
    user: &Address,
    ciphertext: &[u8],
) -> InputProof {
    InputProof(
        keyed_mac(
            attestation_key,
            MAC_CONTEXT_INPUT_PROOF,
            &[&contract.0, &user.0, ciphertext],
        )
        .to_vec(),
    )
}

/// Attestation MAC binding `(contract, ciphertext, encoded clear values)`,
/// produced by the decryption backend and checked by the ledger at
/// verification. The contract is part of the binding so a proof minted for
/// one contract cannot be replayed against another sharing the key.
pub fn decryption_proof(
    attestation_key: &SymmetricKey,
    contract: &Address,
    ciphertext: &[u8],
    encoded_clear: &[u8],
) -> DecryptionProof {
    DecryptionProof(
        keyed_mac(
            attestation_key,
            MAC_CONTEXT_DECRYPTION_PROOF,
            &[&contract.0, ciphertext, encoded_clear],
        )
        .to_vec(),
    )
}

/// Canonical digest of a ledger write call, signed by the wallet.
pub fn call_digest(method: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(MAC_CONTEXT_CALL_SIGNATURE);
    hasher.update(method.as_bytes());
    for part in parts {
        hasher.update(&(part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Derive a 20-byte account address from an Ed25519 public key.
pub fn derive_address(pubkey: &[u8; 32]) -> Address {
    let mut hasher = blake3::Hasher::new_derive_key(MAC_CONTEXT_ADDRESS);
    hasher.update(pubkey);
    let hash = hasher.finalize();
    let mut addr = [0u8; ADDRESS_SIZE];
    addr.copy_from_slice(&hash.as_bytes()[..ADDRESS_SIZE]);
    Address(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = generate_key();
        let plaintext = 42u64.to_le_bytes();

        let sealed = seal(&key, &plaintext).unwrap();
        let opened = open(&key, &sealed).unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = generate_key();
        let key2 = generate_key();

        let sealed = seal(&key1, b"amount").unwrap();
        assert!(open(&key2, &sealed).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = generate_key();
        let mut sealed = seal(&key, b"amount").unwrap();
        let len = sealed.len();
        sealed[len - 1] ^= 0xFF;

        assert!(open(&key, &sealed).is_err());
    }

    #[test]
    fn test_truncated_data_fails() {
        let key = generate_key();
        assert!(open(&key, &[]).is_err());
    }

    #[test]
    fn test_input_proof_binds_all_inputs() {
        let key = generate_key();
        let contract = Address([1; 20]);
        let user = Address([2; 20]);

        let proof = input_proof(&key, &contract, &user, b"ct");
        assert_eq!(proof, input_proof(&key, &contract, &user, b"ct"));
        assert_ne!(proof, input_proof(&key, &contract, &user, b"other"));
        assert_ne!(proof, input_proof(&key, &contract, &Address([3; 20]), b"ct"));
    }

    #[test]
    fn test_decryption_proof_binds_all_inputs() {
        let key = generate_key();
        let contract = Address([1; 20]);

        let proof = decryption_proof(&key, &contract, b"ct", b"clear");
        assert_eq!(proof, decryption_proof(&key, &contract, b"ct", b"clear"));
        assert_ne!(proof, decryption_proof(&key, &contract, b"ct", b"forged"));
        assert_ne!(
            proof,
            decryption_proof(&key, &Address([2; 20]), b"ct", b"clear")
        );
    }

    #[test]
    fn test_derive_address_deterministic() {
        let pk = [7u8; 32];
        assert_eq!(derive_address(&pk), derive_address(&pk));
        assert_ne!(derive_address(&pk), derive_address(&[8u8; 32]));
    }
}
