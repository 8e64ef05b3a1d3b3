//! Status and protocol events emitted by the client core.
//!
//! The core never owns a display timer: notices carry a suggested display
//! interval and the presentation layer decides what to do with it. Events
//! flow over an unbounded channel so no protocol step can block on a slow
//! or absent subscriber.

use serde::Serialize;
use tokio::sync::mpsc;

use testament_shared::constants::STATUS_DISPLAY_SECS;
use testament_shared::WillId;

use crate::controller::SessionPhase;
use crate::protocol::DecryptPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Pending,
    Success,
    Error,
}

/// A human-readable operation status notice.
#[derive(Debug, Clone, Serialize)]
pub struct StatusNotice {
    pub level: StatusLevel,
    pub message: String,
    /// Suggested display duration in seconds; 0 means "until replaced".
    pub display_for: u64,
}

impl StatusNotice {
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Pending,
            message: message.into(),
            display_for: 0,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Success,
            message: message.into(),
            display_for: STATUS_DISPLAY_SECS,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
            display_for: STATUS_DISPLAY_SECS,
        }
    }
}

/// Everything the client core reports outward.
#[derive(Debug, Clone, Serialize)]
pub enum ClientEvent {
    /// User-facing operation status.
    Status(StatusNotice),
    /// A decryption protocol phase transition.
    Decrypt { will: WillId, phase: DecryptPhase },
    /// The session lifecycle moved to a new phase.
    Session(SessionPhase),
}

pub type EventSender = mpsc::UnboundedSender<ClientEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Emit an event, dropping it silently if nobody listens.
pub fn emit(tx: &EventSender, event: ClientEvent) {
    if tx.send(event).is_err() {
        tracing::debug!("no event subscriber, dropping event");
    }
}
