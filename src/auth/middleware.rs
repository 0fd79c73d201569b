use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::app::AppState;
use crate::auth::admin_auth::session_from_headers;
use crate::auth::models::AdminSession;
use crate::error::AppError;

/// Extractor placed on every admin-only handler.
///
/// With `REQUIRE_ADMIN_AUTH` off it always succeeds and carries no
/// session. With it on, requests without a valid session are rejected
/// with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AdminGuard(pub Option<AdminSession>);

impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.auth.require_for_writes {
            return Ok(AdminGuard(None));
        }

        match session_from_headers(&state.auth, &parts.headers) {
            Ok(session) => Ok(AdminGuard(Some(session))),
            Err(e) => {
                tracing::debug!("Rejected {} {}: {e}", parts.method, parts.uri.path());
                Err(e)
            }
        }
    }
}
