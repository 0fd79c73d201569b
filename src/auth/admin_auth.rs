use axum::extract::State;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::api::envelope::ApiResponse;
use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::models::{AdminSession, LoginRequest, SessionClaims, ADMIN_UID, SESSION_COOKIE};
use crate::config::AdminAuthConfig;
use crate::error::AppError;

/// Check a login attempt against the configured admin credential.
///
/// Emails compare case-insensitively; passwords exactly.
pub fn authenticate_admin(
    config: &AdminAuthConfig,
    email: &str,
    password: &str,
) -> Result<String, AppError> {
    let (Some(admin_email), Some(admin_password)) = (&config.email, &config.password) else {
        return Err(AppError::Auth("Admin login is not configured".into()));
    };

    let email = email.trim();
    if email.eq_ignore_ascii_case(admin_email) && password == admin_password {
        Ok(admin_email.to_lowercase())
    } else {
        Err(AppError::Auth(
            "Invalid email or password. Please check your credentials.".into(),
        ))
    }
}

/// Sign a session token for `email`, valid for the configured TTL.
pub fn issue_session_token(
    config: &AdminAuthConfig,
    email: &str,
    now: DateTime<Utc>,
) -> Result<(String, AdminSession), AppError> {
    let ttl = chrono::Duration::from_std(config.session_ttl)
        .map_err(|e| AppError::Internal(format!("Invalid session TTL: {e}")))?;
    let expires_at = now + ttl;

    let claims = SessionClaims {
        sub: email.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    let key = EncodingKey::from_secret(config.session_secret.as_bytes());
    let token = encode(&Header::default(), &claims, &key)
        .map_err(|e| AppError::Internal(format!("Failed to sign session token: {e}")))?;

    let session = AdminSession {
        email: email.to_string(),
        uid: ADMIN_UID.to_string(),
        expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
    };
    Ok((token, session))
}

/// Validate a session token and return the session it describes.
pub fn verify_session_token(config: &AdminAuthConfig, token: &str) -> Result<AdminSession, AppError> {
    let key = DecodingKey::from_secret(config.session_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Auth("Session expired".into()),
        _ => {
            tracing::debug!("Rejected session token: {e}");
            AppError::Auth("Not logged in".into())
        }
    })?;

    let claims = data.claims;
    Ok(AdminSession {
        email: claims.sub,
        uid: ADMIN_UID.to_string(),
        expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_default(),
    })
}

/// Read the session from the `admin_session` cookie or a bearer token.
pub fn session_from_headers(
    config: &AdminAuthConfig,
    headers: &HeaderMap,
) -> Result<AdminSession, AppError> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    let token = bearer
        .or_else(|| {
            CookieJar::from_headers(headers)
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string())
        })
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Auth("Not logged in".into()))?;

    verify_session_token(config, &token)
}

/// `POST /api/auth/login`
///
/// On success, sets the `admin_session` cookie and returns the session.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<AdminSession>), AppError> {
    let email = match authenticate_admin(&state.auth, &req.email, &req.password) {
        Ok(email) => email,
        Err(e) => {
            tracing::warn!("Failed admin login attempt for '{}'", req.email.trim());
            return Err(e);
        }
    };

    let (token, session) = issue_session_token(&state.auth, &email, Utc::now())?;
    let max_age = time::Duration::seconds(state.auth.session_ttl.as_secs() as i64);

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.auth.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build();

    tracing::info!("Admin '{email}' logged in");
    Ok((
        jar.add(cookie),
        ApiResponse::data(session).with_message("Login successful"),
    ))
}

/// `GET /api/auth/me`
pub async fn me_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiResponse<AdminSession>, AppError> {
    let session = session_from_headers(&state.auth, &headers)?;
    Ok(ApiResponse::data(session))
}

/// `POST /api/auth/logout`: clears the session cookie.
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, ApiResponse<()>) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .removal()
        .build();

    (jar.remove(cookie), ApiResponse::message("Logged out successfully"))
}
