//! # testament-client
//!
//! Client core for the Testament confidential will registry: session
//! lifecycle, the cached will view, the verified-decryption protocol and
//! the event stream a presentation layer subscribes to.

pub mod controller;
pub mod events;
pub mod protocol;
pub mod registry;

#[cfg(test)]
pub(crate) mod testutil;

pub use controller::{SessionPhase, WillClient};
pub use events::{ClientEvent, EventReceiver, StatusLevel, StatusNotice};
pub use protocol::{DecryptPhase, Decryptor};
pub use registry::{RegistryStats, WillRegistry};

/// Initialize tracing for binaries embedding the client (respects the
/// RUST_LOG env var).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,testament_client=debug")),
        )
        .init();
}
