use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::EmailConfig;
use crate::db::models::TestimonialView;
use crate::email::mailer::{DisabledMailer, EmailError, Mailer, OutgoingEmail, ResendMailer};
use crate::email::templates::{
    email_timestamp, ContactContext, EmailTemplates, ReplyContext, TestimonialContext,
};

/// A contact-form submission.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

/// An admin reply to a customer enquiry.
#[derive(Debug, Clone)]
pub struct ReplyMessage {
    pub to: String,
    pub subject: Option<String>,
    pub message: String,
    pub customer_name: Option<String>,
}

/// Renders and sends the site's transactional emails.
///
/// Every send is bounded by the configured timeout and never retried.
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    templates: EmailTemplates,
    config: EmailConfig,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>, config: EmailConfig) -> Result<Self, EmailError> {
        Ok(Self {
            mailer,
            templates: EmailTemplates::new()?,
            config,
        })
    }

    /// Build the service with the Resend transport, or a disabled one when
    /// no API key is configured.
    pub fn from_config(config: EmailConfig) -> Result<Self, EmailError> {
        let mailer: Arc<dyn Mailer> = match &config.api_key {
            Some(key) => {
                tracing::info!("Email delivery via Resend ({})", config.api_url);
                Arc::new(ResendMailer::new(config.api_url.clone(), key.clone()))
            }
            None => {
                tracing::warn!("RESEND_API_KEY not set, email delivery is disabled");
                Arc::new(DisabledMailer)
            }
        };
        Self::new(mailer, config)
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    fn sender(&self) -> String {
        format!("{} <{}>", self.config.company_name, self.config.from)
    }

    /// Forward a contact-form message to the site inbox.
    pub async fn send_contact(
        &self,
        contact: &ContactMessage,
        now: DateTime<Utc>,
    ) -> Result<(), EmailError> {
        let body = self.templates.contact(&ContactContext {
            name: &contact.name,
            email: &contact.email,
            phone: contact.phone.as_deref(),
            message: &contact.message,
            submitted_at: email_timestamp(now),
        })?;

        self.deliver(OutgoingEmail {
            from: self.sender(),
            to: vec![self.config.contact_email.clone()],
            reply_to: Some(contact.email.clone()),
            subject: format!("A Message from {}", contact.name),
            html: body.html,
            text: body.text,
        })
        .await
    }

    /// Send an admin's reply to a customer.
    pub async fn send_reply(
        &self,
        reply: &ReplyMessage,
        now: DateTime<Utc>,
    ) -> Result<(), EmailError> {
        let greeting = match &reply.customer_name {
            Some(name) => format!("Dear {name},"),
            None => "Dear Valued Customer,".to_string(),
        };
        let body = self.templates.reply(&ReplyContext {
            greeting,
            message: &reply.message,
            company_name: &self.config.company_name,
            from_email: &self.config.from,
            sent_at: email_timestamp(now),
        })?;

        let subject = reply
            .subject
            .clone()
            .unwrap_or_else(|| format!("Re: Your Inquiry - {}", self.config.company_name));

        self.deliver(OutgoingEmail {
            from: self.sender(),
            to: vec![reply.to.clone()],
            reply_to: Some(self.config.from.clone()),
            subject,
            html: body.html,
            text: body.text,
        })
        .await
    }

    /// Tell the site inbox that a testimonial is waiting for review.
    pub async fn send_testimonial_notification(
        &self,
        testimonial: &TestimonialView,
    ) -> Result<(), EmailError> {
        let body = self.templates.testimonial(&TestimonialContext {
            name: &testimonial.name,
            email: &testimonial.email,
            location: testimonial.location.as_deref(),
            message: &testimonial.message,
            dashboard_url: &self.config.admin_dashboard_url,
            company_name: &self.config.company_name,
            submitted_at: email_timestamp(testimonial.created_at),
        })?;

        self.deliver(OutgoingEmail {
            from: self.sender(),
            to: vec![self.config.contact_email.clone()],
            reply_to: None,
            subject: format!("New Testimonial Submission by : {}", testimonial.name),
            html: body.html,
            text: body.text,
        })
        .await
    }

    async fn deliver(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        match tokio::time::timeout(self.config.timeout, self.mailer.send(email)).await {
            Ok(result) => result,
            Err(_) => Err(EmailError::Timeout(self.config.timeout.as_secs())),
        }
    }
}

/// Send the testimonial notification in the background.
///
/// The submission has already been stored; a failed notification is only
/// logged.
pub fn spawn_testimonial_notification(
    service: Arc<EmailService>,
    testimonial: TestimonialView,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match service.send_testimonial_notification(&testimonial).await {
            Ok(()) => tracing::info!("Testimonial notification sent for {}", testimonial.id),
            Err(e) => tracing::warn!(
                "Failed to send testimonial notification for {}: {e}",
                testimonial.id
            ),
        }
    })
}
