use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::ADDRESS_SIZE;

// Will identifier, assigned client-side at creation and immutable after.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WillId(pub String);

impl WillId {
    /// Generate a fresh collision-resistant id: a millisecond timestamp
    /// prefix (insertion-sortable) plus 8 random hex characters.
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "will-{}-{}",
            Utc::now().timestamp_millis(),
            &suffix[..8]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WillId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// Ledger account identity (20 bytes, BLAKE3-derived from the wallet key)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; ADDRESS_SIZE]);

impl Address {
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != ADDRESS_SIZE {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; ADDRESS_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Truncated form for logs and display, e.g. `0x1a2b3c…9f0e`.
    pub fn short(&self) -> String {
        let full = self.to_hex();
        format!("{}…{}", &full[..8], &full[full.len() - 4..])
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Opaque reference to an encrypted value stored on the ledger. Used only
/// as a lookup key for the decryption protocol, never interpreted locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CiphertextHandle(pub Vec<u8>);

impl CiphertextHandle {
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode(s)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Proof that a ciphertext was well-formed by its submitter, checked by the
/// ledger before a will is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputProof(pub Vec<u8>);

/// Attestation that a claimed cleartext is the correct decryption of a
/// ciphertext handle, checked by the ledger before `is_verified` flips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecryptionProof(pub Vec<u8>);

/// A cleartext amount tagged by trust level.
///
/// `Advisory` values come straight from a decryption backend and have not
/// been attested on the ledger; they must never be displayed as
/// authoritative. `Attested` values were read back from a verified will.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClearValue {
    Advisory(u64),
    Attested(u64),
}

impl ClearValue {
    pub fn value(&self) -> u64 {
        match self {
            Self::Advisory(v) | Self::Attested(v) => *v,
        }
    }

    pub fn is_attested(&self) -> bool {
        matches!(self, Self::Attested(_))
    }
}

/// Display projection of a will's amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AmountView {
    /// Still encrypted; nothing trustworthy to show.
    Sealed,
    /// On-chain attested cleartext.
    Attested(u64),
}

// ---------------------------------------------------------------------------
// Will
// ---------------------------------------------------------------------------

/// A digital will record as stored on the ledger.
///
/// All fields except `is_verified` and `decrypted_value` are set at creation
/// and immutable thereafter; no edit or deletion path exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Will {
    /// Unique client-assigned identifier.
    pub id: WillId,
    /// Free-text title.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Account that created the will.
    pub creator: Address,
    /// Creation time in seconds, assigned by the ledger.
    pub timestamp: i64,
    /// Plaintext companion field (the declared amount at creation).
    pub public_value1: u64,
    /// Reserved field, always 0 in the creation path.
    pub public_value2: u64,
    /// Handle of the encrypted asset amount.
    pub encrypted_value: CiphertextHandle,
    /// Whether a decryption proof has been accepted for this will.
    /// Flips false -> true at most once.
    pub is_verified: bool,
    /// Authoritative cleartext once `is_verified`; meaningless (0) before.
    pub decrypted_value: u64,
}

impl Will {
    /// What the amount field may be displayed as. `decrypted_value` is only
    /// trustworthy behind `is_verified`.
    pub fn amount_view(&self) -> AmountView {
        if self.is_verified {
            AmountView::Attested(self.decrypted_value)
        } else {
            AmountView::Sealed
        }
    }
}
