use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};

use crate::email::mailer::EmailError;

const TEMPLATES: &[(&str, &str)] = &[
    ("email/base.html", include_str!("../../templates/email/base.html")),
    ("email/contact.html", include_str!("../../templates/email/contact.html")),
    ("email/contact.txt", include_str!("../../templates/email/contact.txt")),
    ("email/reply.html", include_str!("../../templates/email/reply.html")),
    ("email/reply.txt", include_str!("../../templates/email/reply.txt")),
    ("email/testimonial.html", include_str!("../../templates/email/testimonial.html")),
    ("email/testimonial.txt", include_str!("../../templates/email/testimonial.txt")),
];

/// Format a timestamp the way it appears in email footers.
pub fn email_timestamp(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y, %H:%M:%S UTC").to_string()
}

/// An email body in both renditions.
#[derive(Debug, Clone)]
pub struct RenderedBody {
    pub html: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ContactContext<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub message: &'a str,
    pub submitted_at: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyContext<'a> {
    pub greeting: String,
    pub message: &'a str,
    pub company_name: &'a str,
    pub from_email: &'a str,
    pub sent_at: String,
}

#[derive(Debug, Serialize)]
pub struct TestimonialContext<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub location: Option<&'a str>,
    pub message: &'a str,
    pub dashboard_url: &'a str,
    pub company_name: &'a str,
    pub submitted_at: String,
}

/// The compiled email templates, embedded in the binary.
///
/// HTML templates are autoescaped; text templates are not.
pub struct EmailTemplates {
    tera: Tera,
}

impl EmailTemplates {
    pub fn new() -> Result<Self, EmailError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self { tera })
    }

    pub fn contact(&self, ctx: &ContactContext<'_>) -> Result<RenderedBody, EmailError> {
        self.render_pair("contact", ctx)
    }

    pub fn reply(&self, ctx: &ReplyContext<'_>) -> Result<RenderedBody, EmailError> {
        self.render_pair("reply", ctx)
    }

    pub fn testimonial(&self, ctx: &TestimonialContext<'_>) -> Result<RenderedBody, EmailError> {
        self.render_pair("testimonial", ctx)
    }

    fn render_pair(&self, name: &str, data: &impl Serialize) -> Result<RenderedBody, EmailError> {
        let context = Context::from_serialize(data)?;
        Ok(RenderedBody {
            html: self.tera.render(&format!("email/{name}.html"), &context)?,
            text: self.tera.render(&format!("email/{name}.txt"), &context)?,
        })
    }
}
