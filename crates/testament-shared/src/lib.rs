//! # testament-shared
//!
//! Domain types, wallet identity, crypto primitives, wire codec and the
//! error taxonomy shared by every Testament crate.

pub mod codec;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod types;

pub use error::{CryptoError, FheError, LedgerError, WillError};
pub use identity::Wallet;
pub use types::{
    Address, AmountView, CiphertextHandle, ClearValue, DecryptionProof, InputProof, Will, WillId,
};
