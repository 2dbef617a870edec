//! Interactive configuration edits: the boundary a settings form or CLI
//! talks to. Validation errors here are user-facing and synchronous, unlike
//! the silent aborts of an unattended check cycle.

use tracing::info;

use crate::core::config::{Condition, ConfigError, ConfigStore, MonitorConfig, is_valid_email};
use crate::core::notify::{Notifier, NotifyError};

pub const TEST_SUBJECT: &str = "Test Email - Email Sender Configuration";
pub const TEST_BODY: &str = "This is a test email to verify the email sender configuration.\n\n\
     If you received this email, the email sender is working correctly!";

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

pub struct ConfigEditor<'a> {
    store: &'a ConfigStore,
}

impl<'a> ConfigEditor<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        ConfigEditor { store }
    }

    /// The saved configuration, or the conservative default for prefill when
    /// nothing has been saved yet.
    pub fn current(&self) -> MonitorConfig {
        self.store.load().ok().flatten().unwrap_or_default()
    }

    /// Validates and persists a whole-record replacement.
    pub fn validate_and_save(
        &self,
        email: &str,
        target_rate: f64,
        condition: Condition,
    ) -> Result<MonitorConfig, ConfigError> {
        let config = MonitorConfig {
            email: email.to_string(),
            target_rate,
            condition,
        };
        self.store.save(&config)?;
        info!("Configuration saved for {}", config.email);
        Ok(config)
    }

    /// Sends the fixed test message. The address is checked locally first so
    /// an obvious typo never costs an external call.
    pub async fn send_test_email(
        &self,
        notifier: &dyn Notifier,
        email: &str,
    ) -> Result<(), EditorError> {
        if !is_valid_email(email) {
            return Err(ConfigError::InvalidEmail.into());
        }
        notifier.send(email, TEST_SUBJECT, TEST_BODY).await?;
        info!("Test email sent to {email}");
        Ok(())
    }
}
