//! Asynchronous FHE context initialization.
//!
//! Initialization is a prerequisite for any encrypt/decrypt call and is
//! gated on a connected identity by the lifecycle controller; backends
//! behind an uninitialized context fail with [`FheError::NotInitialized`].

use std::sync::Arc;

use async_trait::async_trait;

use testament_shared::FheError;

use crate::backend::{DecryptionBackend, EncryptionBackend};

/// An initialized cryptographic context: the pair of backends every
/// encrypt/decrypt path goes through.
pub struct FheSession {
    pub encryptor: Arc<dyn EncryptionBackend>,
    pub decryptor: Arc<dyn DecryptionBackend>,
}

/// Factory for [`FheSession`]s. `initialize` may suspend for an externally
/// bounded time (key material fetches, WASM warmup and the like) and may
/// fail transiently; callers retry on their next connection attempt.
#[async_trait]
pub trait FheRuntime: Send + Sync {
    async fn initialize(&self) -> Result<Arc<FheSession>, FheError>;
}
