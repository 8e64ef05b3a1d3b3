//! Session lifecycle and top-level will operations.
//!
//! [`WillClient`] coordinates wallet connection, FHE context
//! initialization, will creation and decryption requests, translating
//! protocol outcomes into status notices. All "is busy" state derives from
//! the session phase and explicit guards rather than parallel flags.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use testament_fhe::{FheRuntime, FheSession};
use testament_ledger::{CreateWillRequest, LedgerGateway};
use testament_shared::constants::RESERVED_PUBLIC_VALUE2;
use testament_shared::{Address, ClearValue, Wallet, Will, WillError, WillId};

use crate::events::{self, emit, ClientEvent, EventReceiver, EventSender, StatusNotice};
use crate::protocol::Decryptor;
use crate::registry::{RegistryStats, WillRegistry};

/// Lifecycle of one user session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Disconnected,
    /// Wallet connected, FHE context initialization in flight.
    Initializing,
    Ready,
}

struct SessionState {
    wallet: Option<Wallet>,
    fhe: Option<Arc<FheSession>>,
    phase: SessionPhase,
}

impl SessionState {
    fn disconnected() -> Self {
        Self {
            wallet: None,
            fhe: None,
            phase: SessionPhase::Disconnected,
        }
    }
}

/// Top-level client over one ledger contract.
pub struct WillClient {
    gateway: Arc<dyn LedgerGateway>,
    runtime: Arc<dyn FheRuntime>,
    contract: Address,
    registry: WillRegistry,
    events: EventSender,
    session: Mutex<SessionState>,
    /// Guard against duplicate concurrent creation submissions. Decrypts
    /// are deliberately unguarded: the ledger converges concurrent
    /// verifications itself.
    creating: AtomicBool,
}

impl WillClient {
    /// Build a client plus the receiver its status/protocol events arrive
    /// on.
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        runtime: Arc<dyn FheRuntime>,
        contract: Address,
    ) -> (Self, EventReceiver) {
        let (events, rx) = events::channel();
        (
            Self {
                gateway,
                runtime,
                contract,
                registry: WillRegistry::new(),
                events,
                session: Mutex::new(SessionState::disconnected()),
                creating: AtomicBool::new(false),
            },
            rx,
        )
    }

    fn notice(&self, notice: StatusNotice) {
        emit(&self.events, ClientEvent::Status(notice));
    }

    fn session_event(&self, phase: SessionPhase) {
        emit(&self.events, ClientEvent::Session(phase));
    }

    /// Current session phase.
    pub async fn session_phase(&self) -> SessionPhase {
        self.session.lock().await.phase
    }

    /// Connect a wallet and initialize the FHE context.
    ///
    /// Idempotent once `Ready`; a call while initialization is already in
    /// flight returns without starting a second one. Initialization failure
    /// reverts the session to `Disconnected` and is transient, not fatal.
    pub async fn connect(&self, wallet: Wallet) -> Result<(), WillError> {
        {
            let mut session = self.session.lock().await;
            match session.phase {
                SessionPhase::Ready | SessionPhase::Initializing => return Ok(()),
                SessionPhase::Disconnected => {}
            }
            info!(address = %wallet.address().short(), "wallet connected, initializing FHE context");
            session.wallet = Some(wallet);
            session.phase = SessionPhase::Initializing;
        }
        self.session_event(SessionPhase::Initializing);

        match self.runtime.initialize().await {
            Ok(fhe) => {
                let mut session = self.session.lock().await;
                session.fhe = Some(fhe);
                session.phase = SessionPhase::Ready;
                drop(session);
                self.session_event(SessionPhase::Ready);
                Ok(())
            }
            Err(e) => {
                *self.session.lock().await = SessionState::disconnected();
                self.session_event(SessionPhase::Disconnected);
                warn!(error = %e, "FHE context initialization failed");
                self.notice(StatusNotice::error("FHE initialization failed"));
                Err(WillError::Transient(format!("initialization failed: {e}")))
            }
        }
    }

    /// Drop the wallet and the crypto context.
    pub async fn disconnect(&self) {
        *self.session.lock().await = SessionState::disconnected();
        self.session_event(SessionPhase::Disconnected);
    }

    /// Wallet and initialized context, or a fast `NotConnected` failure.
    /// Context initialization is part of readiness: an absent or still
    /// initializing context fails the same way an absent wallet does.
    async fn ready_session(&self) -> Result<(Wallet, Arc<FheSession>), WillError> {
        let session = self.session.lock().await;
        if session.phase != SessionPhase::Ready {
            return Err(WillError::NotConnected);
        }
        let wallet = session.wallet.clone().ok_or(WillError::NotConnected)?;
        let fhe = session.fhe.clone().ok_or(WillError::NotConnected)?;
        Ok((wallet, fhe))
    }

    /// Create a will with an FHE-encrypted amount. The caller validates
    /// that `amount` came from non-negative integer input.
    pub async fn create_will(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        amount: u64,
    ) -> Result<WillId, WillError> {
        let (wallet, fhe) = self.ready_session().await?;

        if self.creating.swap(true, Ordering::SeqCst) {
            return Err(WillError::Transient(
                "a will creation is already in progress".into(),
            ));
        }
        let result = self
            .do_create(&wallet, &fhe, name.into(), description.into(), amount)
            .await;
        self.creating.store(false, Ordering::SeqCst);

        match &result {
            Ok(id) => {
                info!(id = %id, "digital will created");
                self.notice(StatusNotice::success("Digital will created successfully"));
            }
            Err(e) => self.notice(StatusNotice::error(e.to_string())),
        }
        result
    }

    async fn do_create(
        &self,
        wallet: &Wallet,
        fhe: &FheSession,
        name: String,
        description: String,
        amount: u64,
    ) -> Result<WillId, WillError> {
        self.notice(StatusNotice::pending(
            "Encrypting will amount with FHE encryption...",
        ));
        let encrypted = fhe
            .encryptor
            .encrypt(self.contract, wallet.address(), amount)
            .await
            .map_err(WillError::EncryptionFailed)?;

        let id = WillId::generate();
        let request = CreateWillRequest {
            id: id.clone(),
            name,
            description,
            encrypted_data: encrypted.handle,
            proof: encrypted.proof,
            public_value1: amount,
            public_value2: RESERVED_PUBLIC_VALUE2,
        };

        self.notice(StatusNotice::pending(
            "Waiting for transaction confirmation...",
        ));
        let pending = self.gateway.create_will(wallet, request).await?;
        pending.wait().await?;

        // The will is durable; a failing refresh only delays its
        // appearance in the cached view.
        if let Err(e) = self.registry.reload(self.gateway.as_ref()).await {
            warn!(error = %e, "registry reload after creation failed");
        }
        Ok(id)
    }

    /// Run the verified-decryption protocol for one will.
    pub async fn decrypt_will(&self, id: &WillId) -> Result<ClearValue, WillError> {
        let (wallet, fhe) = self.ready_session().await?;

        self.notice(StatusNotice::pending("Verifying decryption on-chain..."));
        let decryptor = Decryptor::new(
            self.gateway.clone(),
            fhe.decryptor.clone(),
            self.contract,
            wallet,
            self.events.clone(),
        );
        let result = decryptor.run(id).await;

        match &result {
            Ok(value) => {
                if let Err(e) = self.registry.reload(self.gateway.as_ref()).await {
                    warn!(error = %e, "registry reload after decryption failed");
                }
                info!(id = %id, value = value.value(), "will amount decrypted");
                self.notice(StatusNotice::success("Will amount decrypted and verified"));
            }
            Err(e) => self.notice(StatusNotice::error(format!("Decryption failed: {e}"))),
        }
        result
    }

    /// Rebuild the cached will view from the ledger.
    pub async fn reload(&self) -> Result<usize, WillError> {
        match self.registry.reload(self.gateway.as_ref()).await {
            Ok(count) => Ok(count),
            Err(e) => {
                self.notice(StatusNotice::error("Failed to load wills"));
                Err(e)
            }
        }
    }

    /// Probe the ledger contract.
    pub async fn check_availability(&self) -> bool {
        let available = self.gateway.is_available().await;
        if available {
            self.notice(StatusNotice::success("Ledger contract is available"));
        } else {
            self.notice(StatusNotice::error("Availability check failed"));
        }
        available
    }

    // -- cached view --------------------------------------------------------

    pub async fn wills(&self) -> Vec<Will> {
        self.registry.snapshot().await
    }

    pub async fn will(&self, id: &WillId) -> Option<Will> {
        self.registry.get(id).await
    }

    pub async fn search(&self, term: &str) -> Vec<Will> {
        self.registry.search(term).await
    }

    pub async fn stats(&self) -> RegistryStats {
        self.registry.stats().await
    }
}
