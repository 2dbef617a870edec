//! Notification delivery seam

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("email API key is missing")]
    MissingApiKey,

    #[error("verified sender address is missing")]
    MissingSender,

    #[error("email request failed: {0}")]
    Request(String),

    #[error("email service returned status {0}")]
    Status(u16),
}

/// Sends a plain-text message to a single recipient.
///
/// Implementations validate their credentials at construction, not at send
/// time; a transport failure during send surfaces as an `Err`, never a panic.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}
