//! SendGrid v3 mail delivery.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::core::notify::{Notifier, NotifyError};

pub const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SendGridMailer {
    base_url: String,
    api_key: String,
    from_email: String,
}

impl SendGridMailer {
    /// Fails immediately when either credential is absent; a mailer that
    /// cannot send must not be constructed.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        from_email: Option<String>,
    ) -> Result<Self, NotifyError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or(NotifyError::MissingApiKey)?;
        let from_email = from_email
            .filter(|s| !s.is_empty())
            .ok_or(NotifyError::MissingSender)?;

        debug!("SendGrid mailer initialized with sender {from_email}");
        Ok(SendGridMailer {
            base_url: base_url.to_string(),
            api_key,
            from_email,
        })
    }
}

#[derive(Debug, Serialize)]
struct MailPayload {
    personalizations: Vec<Personalization>,
    from: Address,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<Address>,
}

#[derive(Debug, Serialize)]
struct Address {
    email: String,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[async_trait]
impl Notifier for SendGridMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        debug!("Sending email to {recipient}: {subject}");

        let payload = MailPayload {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: recipient.to_string(),
                }],
            }],
            from: Address {
                email: self.from_email.clone(),
            },
            subject: subject.to_string(),
            content: vec![Content {
                content_type: "text/plain".to_string(),
                value: body.to_string(),
            }],
        };

        let client = reqwest::Client::builder()
            .user_agent("ratewatch/0.2")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let response = client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if (200..=202).contains(&status) {
            info!("Email accepted for delivery to {recipient} (status {status})");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            error!("SendGrid rejected the message with status {status}: {body}");
            Err(NotifyError::Status(status))
        }
    }
}
