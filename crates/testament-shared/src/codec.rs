//! Wire encoding of cleartexts submitted with a decryption proof.
//!
//! Values are packed as 32-byte big-endian words (ABI style) so the encoded
//! form is exactly what the ledger contract hashes and stores.

use crate::constants::CLEAR_WORD_SIZE;
use crate::error::CryptoError;

/// Encode cleartext values as concatenated 32-byte big-endian words.
pub fn encode_clear_values(values: &[u64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * CLEAR_WORD_SIZE);
    for value in values {
        let mut word = [0u8; CLEAR_WORD_SIZE];
        word[CLEAR_WORD_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        out.extend_from_slice(&word);
    }
    out
}

/// Decode 32-byte big-endian words back into values. Rejects input that is
/// not word-aligned or that overflows u64.
pub fn decode_clear_values(encoded: &[u8]) -> Result<Vec<u64>, CryptoError> {
    if encoded.is_empty() || encoded.len() % CLEAR_WORD_SIZE != 0 {
        return Err(CryptoError::DecryptionFailed);
    }

    let mut values = Vec::with_capacity(encoded.len() / CLEAR_WORD_SIZE);
    for word in encoded.chunks_exact(CLEAR_WORD_SIZE) {
        if word[..CLEAR_WORD_SIZE - 8].iter().any(|&b| b != 0) {
            return Err(CryptoError::DecryptionFailed);
        }
        let mut be = [0u8; 8];
        be.copy_from_slice(&word[CLEAR_WORD_SIZE - 8..]);
        values.push(u64::from_be_bytes(be));
    }
    Ok(values)
}
