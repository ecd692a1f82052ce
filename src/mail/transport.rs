//! Built-in transports.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::config::{MailConfig, TransportKind};
use crate::mail::{Mail, MailError, SentMail};

/// Delivers outgoing mail.
pub trait Transporter: Send + Sync {
    fn send(&self, mail: Mail) -> BoxFuture<'static, Result<SentMail, MailError>>;
}

/// Renders each message as JSON and logs it instead of delivering it.
#[derive(Debug, Clone)]
pub struct JsonTransport {
    default_from: String,
}

impl JsonTransport {
    pub fn new(default_from: impl Into<String>) -> Self {
        Self {
            default_from: default_from.into(),
        }
    }

    fn render(&self, mut mail: Mail) -> Result<SentMail, MailError> {
        if mail.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        if mail.from.is_none() {
            mail.from = Some(self.default_from.clone());
        }

        let message_id = format!("<{}@mentat>", uuid::Uuid::new_v4());
        let message = serde_json::to_string(&mail)?;
        tracing::info!(message_id = %message_id, to = ?mail.to, subject = %mail.subject, "Mail rendered");

        Ok(SentMail { message_id, message })
    }
}

impl Transporter for JsonTransport {
    fn send(&self, mail: Mail) -> BoxFuture<'static, Result<SentMail, MailError>> {
        let result = self.render(mail);
        Box::pin(async move { result })
    }
}

/// Rejects every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTransport;

impl Transporter for DisabledTransport {
    fn send(&self, _mail: Mail) -> BoxFuture<'static, Result<SentMail, MailError>> {
        Box::pin(async { Err(MailError::Disabled) })
    }
}

/// Build the transporter named by `mail.transport`.
pub fn create_transport(config: &MailConfig) -> Arc<dyn Transporter> {
    tracing::info!(transport = ?config.transport, "Mail transporter ready");
    match config.transport {
        TransportKind::Json => Arc::new(JsonTransport::new(config.from.clone())),
        TransportKind::Disabled => Arc::new(DisabledTransport),
    }
}
