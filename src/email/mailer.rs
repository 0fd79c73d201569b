use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// A fully rendered email ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service is not configured")]
    NotConfigured,

    #[error("Email sending timed out after {0} seconds")]
    Timeout(u64),

    #[error("Email provider authentication failed: {0}")]
    Authentication(String),

    #[error("Email provider error: {0}")]
    Provider(String),

    #[error("Email template error: {0}")]
    Template(String),
}

impl From<tera::Error> for EmailError {
    fn from(err: tera::Error) -> Self {
        // tera keeps the useful part in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        EmailError::Template(message)
    }
}

/// Trait for email transports.
///
/// Abstracted as a trait so tests can capture mail without a provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

/// Sends through the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await
            .map_err(|e| EmailError::Provider(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Email '{}' accepted by Resend", email.subject);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(EmailError::Authentication(body)),
            _ => Err(EmailError::Provider(format!("{status}: {body}"))),
        }
    }
}

/// Installed when no provider key is configured; every send fails.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        tracing::warn!("Dropping email '{}': no email provider configured", email.subject);
        Err(EmailError::NotConfigured)
    }
}
