//! Transactional mail client
//!
//! Thin client for the hosted mail provider's JSON API. Sends are
//! best-effort everywhere they are used; `send_best_effort` logs failures
//! instead of propagating them.

use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use crate::error::EventsError;

/// Mail provider configuration
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Mail provider API base URL
    pub api_base: String,
    /// API key
    pub api_key: String,
    /// Sender address
    pub from_email: String,
    /// Sender display name
    pub from_name: String,
}

impl MailerConfig {
    /// Create a new mailer config
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        from_email: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            from_email: from_email.into(),
            from_name: "Haru".to_string(),
        }
    }
}

/// Transactional mail client
#[derive(Clone)]
pub struct Mailer {
    client: Client,
    config: MailerConfig,
}

impl Mailer {
    /// Create a new mailer
    pub fn new(config: MailerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send one transactional mail.
    #[instrument(skip(self, body))]
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EventsError> {
        debug!("Sending transactional mail");

        let payload = json!({
            "from": { "email": self.config.from_email, "name": self.config.from_name },
            "to": [{ "email": to }],
            "subject": subject,
            "text": body,
        });

        let url = format!("{}/v3/mail/send", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Mail request failed");
                EventsError::Mail(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Mail API error");
            return Err(EventsError::Mail(format!("mail API error: {status}")));
        }

        Ok(())
    }

    /// Send, logging failure instead of returning it.
    pub async fn send_best_effort(&self, to: &str, subject: &str, body: &str) {
        if let Err(e) = self.send(to, subject, body).await {
            warn!(error = %e, to = %to, "Transactional mail dropped");
        }
    }
}
