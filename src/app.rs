use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::admin_auth;
use crate::config::{AdminAuthConfig, CorsPolicy};
use crate::db::blog_repository::BlogRepository;
use crate::db::page_repository::PageRepository;
use crate::db::settings_repository::SettingsRepository;
use crate::db::testimonial_repository::TestimonialRepository;
use crate::email::service::EmailService;
use crate::events::{self, TestimonialEvents};

/// Shared state available to every handler.
#[derive(Clone)]
pub struct AppState {
    pub blog_repo: Arc<dyn BlogRepository>,
    pub page_repo: Arc<dyn PageRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub testimonial_repo: Arc<dyn TestimonialRepository>,
    pub email: Arc<EmailService>,
    pub events: TestimonialEvents,
    pub auth: AdminAuthConfig,
}

/// All `/api` routes plus the banner and the JSON 404 fallback.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api::health::index_handler))
        .route("/api/health", get(api::health::health_handler))
        // Blogs
        .route(
            "/api/blogs",
            get(api::blogs::list_blogs_handler).post(api::blogs::create_blog_handler),
        )
        .route(
            "/api/blogs/published",
            get(api::blogs::list_published_blogs_handler),
        )
        .route(
            "/api/blogs/{id}",
            get(api::blogs::get_blog_handler)
                .put(api::blogs::update_blog_handler)
                .delete(api::blogs::delete_blog_handler),
        )
        .route(
            "/api/blogs/{id}/publish",
            patch(api::blogs::toggle_publish_handler),
        )
        // Pages
        .route(
            "/api/pages",
            get(api::pages::list_pages_handler).post(api::pages::create_page_handler),
        )
        .route(
            "/api/pages/{slug}",
            get(api::pages::get_page_handler)
                .put(api::pages::update_page_handler)
                .delete(api::pages::delete_page_handler),
        )
        // Site settings
        .route(
            "/api/site-settings",
            get(api::site_settings::get_site_settings_handler)
                .put(api::site_settings::update_site_settings_handler),
        )
        // Testimonials
        .route(
            "/api/testimonials",
            get(api::testimonials::list_testimonials_handler)
                .post(api::testimonials::submit_testimonial_handler),
        )
        .route(
            "/api/testimonials/approved",
            get(api::testimonials::list_approved_handler),
        )
        .route(
            "/api/testimonials/unapproved",
            get(api::testimonials::list_unapproved_handler),
        )
        .route(
            "/api/testimonials/events",
            get(events::testimonial_events_handler),
        )
        .route(
            "/api/testimonials/{id}",
            delete(api::testimonials::delete_testimonial_handler),
        )
        .route(
            "/api/testimonials/{id}/approve",
            patch(api::testimonials::approve_testimonial_handler),
        )
        // Contact
        .route("/api/contact", post(api::contact::contact_handler))
        .route("/api/contact/reply", post(api::contact::reply_handler))
        // Admin session
        .route("/api/auth/login", post(admin_auth::login_handler))
        .route("/api/auth/me", get(admin_auth::me_handler))
        .route("/api/auth/logout", post(admin_auth::logout_handler))
        .method_not_allowed_fallback(api::errors::method_not_allowed)
        .fallback(api::errors::route_not_found)
}

/// Browser CORS rules: exact allow-list, credentials allowed.
pub fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let policy = policy.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request: &axum::http::request::Parts| {
                origin.to_str().map(|o| policy.allows(o)).unwrap_or(false)
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the complete application router.
pub fn build_router(state: AppState, cors: &CorsPolicy) -> Router {
    api_router()
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
