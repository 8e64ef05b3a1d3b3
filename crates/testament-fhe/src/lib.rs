//! # testament-fhe
//!
//! Encryption/decryption backend traits for the FHE boundary, the two-phase
//! decryption request/result objects, and a sealed in-process reference
//! backend for development and tests.

pub mod backend;
pub mod runtime;
pub mod sealed;

pub use backend::{
    DecryptionBackend, DecryptionRequest, DecryptionResult, EncryptedInput, EncryptionBackend,
};
pub use runtime::{FheRuntime, FheSession};
pub use sealed::{SealedBackend, SealedRuntime};
