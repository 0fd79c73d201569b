use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;

use crate::api::envelope::ApiResponse;
use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::middleware::AdminGuard;
use crate::email::mailer::EmailError;
use crate::email::service::{ContactMessage, EmailService, ReplyMessage};
use crate::error::AppError;
use crate::validation::non_blank;

#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub customer_name: Option<String>,
}

/// Visitor-facing text for a failed contact-form send.
pub fn contact_failure_message(err: &EmailError, contact_email: &str) -> String {
    match err {
        EmailError::Timeout(_) => format!(
            "Email service is taking too long to respond. Please try again later or contact us directly at {contact_email}"
        ),
        EmailError::Authentication(_) => format!(
            "Email service authentication failed. Please contact us directly at {contact_email}"
        ),
        EmailError::NotConfigured => format!(
            "Email service is not configured. Please contact us directly at {contact_email}"
        ),
        EmailError::Provider(_) | EmailError::Template(_) => format!(
            "Failed to send message. Please try again later or contact us directly at {contact_email}"
        ),
    }
}

/// Admin-facing text for a failed reply.
pub fn reply_failure_message(err: &EmailError) -> &'static str {
    match err {
        EmailError::Timeout(_) => {
            "Email service is taking too long to respond. Please try again later."
        }
        EmailError::Authentication(_) => "Email service authentication failed.",
        EmailError::NotConfigured => "Email service is not configured",
        EmailError::Provider(_) | EmailError::Template(_) => {
            "Failed to send reply email. Please try again later."
        }
    }
}

pub async fn send_contact_message(
    email: &EmailService,
    request: ContactRequest,
) -> Result<(), AppError> {
    let (Some(name), Some(sender), Some(message)) = (
        non_blank(request.name),
        non_blank(request.email),
        non_blank(request.message),
    ) else {
        return Err(AppError::BadRequest(
            "Please provide name, email, and message".into(),
        ));
    };

    let contact = ContactMessage {
        name,
        email: sender,
        phone: non_blank(request.phone),
        message,
    };

    email
        .send_contact(&contact, Utc::now())
        .await
        .map_err(|e| {
            tracing::error!("Failed to send contact email from {}: {e}", contact.email);
            AppError::Email {
                message: contact_failure_message(&e, &email.config().contact_email),
                detail: e.to_string(),
            }
        })?;

    tracing::info!("Contact message from {} forwarded", contact.email);
    Ok(())
}

pub async fn send_reply_message(
    email: &EmailService,
    request: ReplyRequest,
) -> Result<(), AppError> {
    let (Some(to), Some(message)) = (non_blank(request.to), non_blank(request.message)) else {
        return Err(AppError::BadRequest(
            "Please provide recipient email (to) and message".into(),
        ));
    };

    let reply = ReplyMessage {
        to,
        subject: non_blank(request.subject),
        message,
        customer_name: non_blank(request.customer_name),
    };

    email.send_reply(&reply, Utc::now()).await.map_err(|e| {
        tracing::error!("Failed to send reply to {}: {e}", reply.to);
        AppError::Email {
            message: reply_failure_message(&e).to_string(),
            detail: e.to_string(),
        }
    })?;

    tracing::info!("Reply sent to {}", reply.to);
    Ok(())
}

/// `POST /api/contact`
pub async fn contact_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ContactRequest>,
) -> Result<ApiResponse<()>, AppError> {
    send_contact_message(&state.email, request).await?;
    Ok(ApiResponse::message(
        "Your message has been sent successfully. We will get back to you soon!",
    ))
}

/// `POST /api/contact/reply`
pub async fn reply_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ReplyRequest>,
) -> Result<ApiResponse<()>, AppError> {
    send_reply_message(&state.email, request).await?;
    Ok(ApiResponse::message("Reply email sent successfully"))
}
