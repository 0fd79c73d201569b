use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Session secret used when none is configured. Refused in production.
pub const DEV_SESSION_SECRET: &str = "development-session-secret-change-me";

/// Raw service configuration.
///
/// Keys are flat so that the plain environment names used by the
/// deployment (`MONGO_URI`, `PORT`, `FRONTEND_URL`, ...) map onto fields
/// directly.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Comma-separated CORS allow-list.
    #[serde(default)]
    pub frontend_url: Option<String>,

    #[serde(default = "default_mongo_uri")]
    pub mongo_uri: String,
    #[serde(default = "default_mongo_database")]
    pub mongo_database: String,
    #[serde(default)]
    pub mongo_username: Option<String>,
    #[serde(default)]
    pub mongo_password: Option<String>,

    #[serde(default)]
    pub resend_api_key: Option<String>,
    #[serde(default = "default_resend_api_url")]
    pub resend_api_url: String,
    #[serde(default = "default_email_from")]
    pub email_from: String,
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default = "default_admin_dashboard_url")]
    pub admin_dashboard_url: String,
    #[serde(default = "default_email_timeout_secs")]
    pub email_timeout_secs: u64,

    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default = "default_session_secret")]
    pub session_secret: String,
    #[serde(default)]
    pub require_admin_auth: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_mongo_database() -> String {
    "modern_services".to_string()
}

fn default_resend_api_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_email_from() -> String {
    "onboarding@resend.dev".to_string()
}

fn default_contact_email() -> String {
    "info@modernservices.org.uk".to_string()
}

fn default_company_name() -> String {
    "Modern Services".to_string()
}

fn default_admin_dashboard_url() -> String {
    "http://localhost:5173/admin".to_string()
}

fn default_email_timeout_secs() -> u64 {
    15
}

fn default_session_secret() -> String {
    DEV_SESSION_SECRET.to_string()
}

/// Where to find MongoDB.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub uri: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Outgoing email settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Resend API key; without it every send fails as "not configured".
    pub api_key: Option<String>,
    pub api_url: String,
    /// Bare sender address; the company name is prepended where needed.
    pub from: String,
    /// Inbox receiving contact-form messages and testimonial notifications.
    pub contact_email: String,
    pub company_name: String,
    pub admin_dashboard_url: String,
    pub timeout: Duration,
}

/// The single admin credential and session settings.
#[derive(Debug, Clone)]
pub struct AdminAuthConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub session_secret: String,
    pub session_ttl: Duration,
    /// Enforce an admin session on mutating routes.
    pub require_for_writes: bool,
    /// Mark the session cookie `Secure` (HTTPS only).
    pub secure_cookie: bool,
}

impl AdminAuthConfig {
    /// Configuration for tests and tools: no credential, guard off.
    pub fn disabled() -> Self {
        Self {
            email: None,
            password: None,
            session_secret: DEV_SESSION_SECRET.to_string(),
            session_ttl: Duration::from_secs(24 * 60 * 60),
            require_for_writes: false,
            secure_cookie: false,
        }
    }
}

/// Which browser origins may call the API.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    /// Accept any `http://localhost:<port>` origin (development only).
    pub allow_any_localhost: bool,
}

impl CorsPolicy {
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
            || (self.allow_any_localhost && origin.starts_with("http://localhost:"))
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then the environment.
    ///
    /// Without an explicit path, `modern-services.toml` in the working
    /// directory is read if present. Environment variables override file
    /// values (`MONGO_URI` → `mongo_uri`).
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder();

        let builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name("modern-services").required(false)),
        };

        let config = builder
            .add_source(config::Environment::default())
            .build()?;

        Self::from_config(config)
    }

    pub fn from_config(config: config::Config) -> Result<Self, config::ConfigError> {
        config.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Reject settings that are unsafe to run with.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.is_production() && self.session_secret == DEV_SESSION_SECRET {
            return Err(config::ConfigError::Message(
                "SESSION_SECRET must be set to a unique value in production".into(),
            ));
        }
        if self.email_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "EMAIL_TIMEOUT_SECS must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            uri: self.mongo_uri.clone(),
            database: self.mongo_database.clone(),
            username: non_empty(&self.mongo_username),
            password: non_empty(&self.mongo_password),
        }
    }

    pub fn email(&self) -> EmailConfig {
        EmailConfig {
            api_key: non_empty(&self.resend_api_key),
            api_url: self.resend_api_url.trim_end_matches('/').to_string(),
            from: self.email_from.clone(),
            contact_email: self.contact_email.clone(),
            company_name: self.company_name.clone(),
            admin_dashboard_url: self.admin_dashboard_url.clone(),
            timeout: Duration::from_secs(self.email_timeout_secs),
        }
    }

    pub fn admin(&self) -> AdminAuthConfig {
        AdminAuthConfig {
            email: non_empty(&self.admin_email),
            password: non_empty(&self.admin_password),
            session_secret: self.session_secret.clone(),
            session_ttl: Duration::from_secs(24 * 60 * 60),
            require_for_writes: self.require_admin_auth,
            secure_cookie: self.is_production(),
        }
    }

    pub fn cors(&self) -> CorsPolicy {
        let configured: Vec<String> = self
            .frontend_url
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let allowed_origins = if configured.is_empty() {
            vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
            ]
        } else {
            configured
        };

        CorsPolicy {
            allowed_origins,
            allow_any_localhost: !self.is_production(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> AppConfig {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap();
        AppConfig::from_config(config).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = from_toml("");
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.mongo_database, "modern_services");
        assert!(!cfg.is_production());
        assert!(!cfg.require_admin_auth);
        assert_eq!(cfg.email().timeout, Duration::from_secs(15));
        assert_eq!(cfg.email().contact_email, "info@modernservices.org.uk");
        assert!(cfg.email().api_key.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_values_override_defaults() {
        let cfg = from_toml(
            r#"
            port = 8080
            mongo_uri = "mongodb://db:27017"
            resend_api_key = "re_123"
            resend_api_url = "https://api.resend.com/"
            require_admin_auth = true
            admin_email = "admin@modernservices.com"
            admin_password = "  "
            "#,
        );
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database().uri, "mongodb://db:27017");
        assert_eq!(cfg.email().api_key.as_deref(), Some("re_123"));
        assert_eq!(cfg.email().api_url, "https://api.resend.com");
        let admin = cfg.admin();
        assert!(admin.require_for_writes);
        assert_eq!(admin.email.as_deref(), Some("admin@modernservices.com"));
        assert_eq!(admin.password, None);
    }

    #[test]
    fn test_production_requires_session_secret() {
        let cfg = from_toml(r#"environment = "production""#);
        assert!(cfg.validate().is_err());

        let cfg = from_toml(
            r#"
            environment = "production"
            session_secret = "a-long-random-secret"
            "#,
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_cors_default_origins() {
        let policy = from_toml("").cors();
        assert!(policy.allows("http://localhost:5173"));
        assert!(policy.allows("http://localhost:3000"));
        assert!(!policy.allows("https://evil.example"));
    }

    #[test]
    fn test_cors_production_is_exact() {
        let policy = from_toml(
            r#"
            environment = "production"
            frontend_url = "https://modernservices.org.uk/, https://www.modernservices.org.uk"
            "#,
        )
        .cors();
        assert!(policy.allows("https://modernservices.org.uk"));
        assert!(policy.allows("https://www.modernservices.org.uk"));
        assert!(!policy.allows("http://localhost:5173"));
    }
}
