//! Operator notifications
//!
//! Delivery is an external concern; dockhand only hands a
//! [`Notification`] to a [`Notifier`] and reports whether it was accepted.

mod webhook;

pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("No notification endpoint configured (set DOCKHAND_NOTIFY_WEBHOOK)")]
    NotConfigured,

    #[error("Invalid notification: {0}")]
    Invalid(String),

    #[error("Notification request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Notification endpoint unreachable: {0}")]
    Network(String),

    #[error("Notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let notification = Self {
            recipient: recipient.into().trim().to_string(),
            subject: subject.into().trim().to_string(),
            body: body.into(),
        };
        if notification.recipient.is_empty() {
            return Err(NotifyError::Invalid("recipient cannot be empty".to_string()));
        }
        if notification.subject.is_empty() {
            return Err(NotifyError::Invalid("subject cannot be empty".to_string()));
        }
        if notification.subject.contains('\n') {
            return Err(NotifyError::Invalid("subject must be a single line".to_string()));
        }
        Ok(notification)
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
