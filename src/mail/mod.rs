//! Mail transporter.
//!
//! # Data Flow
//! ```text
//! settings.mail
//!     → create_transport (at startup, unless the builder supplied one)
//!     → Arc<dyn Transporter> in AppContext
//!     → controllers / handlers call send(Mail)
//! ```
//!
//! # Design Decisions
//! - Delivery is behind a trait; the built-in transports render or reject
//! - A message without `from` uses `mail.from`

pub mod transport;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use transport::{create_transport, DisabledTransport, JsonTransport, Transporter};

/// An outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Mail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl Mail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Receipt for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMail {
    pub message_id: String,

    /// Rendered message as handed to the transport.
    pub message: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport is disabled")]
    Disabled,

    #[error("message has no recipients")]
    NoRecipients,

    #[error("failed to render message: {0}")]
    Render(#[from] serde_json::Error),
}
