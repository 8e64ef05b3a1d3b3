/// Ledger account address size in bytes (BLAKE3-derived from the wallet key)
pub const ADDRESS_SIZE: usize = 20;

/// Ed25519 public key size in bytes
pub const PUBKEY_SIZE: usize = 32;

/// Ed25519 secret key size in bytes
pub const SECRET_KEY_SIZE: usize = 32;

/// Symmetric key size in bytes (XChaCha20-Poly1305 and keyed BLAKE3)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// XChaCha20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Size of one encoded cleartext word in bytes (big-endian, ABI style)
pub const CLEAR_WORD_SIZE: usize = 32;

/// Keyed-hash contexts (BLAKE3)
pub const MAC_CONTEXT_ADDRESS: &str = "testament-address-v1";
pub const MAC_CONTEXT_INPUT_PROOF: &str = "testament-input-proof-v1";
pub const MAC_CONTEXT_DECRYPTION_PROOF: &str = "testament-decryption-proof-v1";
pub const MAC_CONTEXT_CALL_SIGNATURE: &str = "testament-call-v1";

/// Reserved public field, always submitted as 0 at creation
pub const RESERVED_PUBLIC_VALUE2: u64 = 0;

/// Suggested display interval for transient status notices, in seconds.
/// Advisory for the presentation layer; the core never arms a timer on it.
pub const STATUS_DISPLAY_SECS: u64 = 3;
