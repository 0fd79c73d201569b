use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// `GET /api/health`
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Server is running",
        "timestamp": Utc::now(),
    }))
}

/// `GET /`: service banner with the endpoint map.
pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Modern Services API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "blogs": "/api/blogs",
            "pages": "/api/pages",
            "siteSettings": "/api/site-settings",
            "testimonials": "/api/testimonials",
            "testimonialEvents": "/api/testimonials/events",
            "contact": "/api/contact",
            "auth": "/api/auth"
        }
    }))
}
