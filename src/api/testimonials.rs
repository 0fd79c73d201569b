use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;

use crate::api::envelope::ApiResponse;
use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::middleware::AdminGuard;
use crate::db::models::{Testimonial, TestimonialView};
use crate::db::testimonial_repository::TestimonialRepository;
use crate::email::service::spawn_testimonial_notification;
use crate::error::AppError;
use crate::events::{TestimonialEvent, TestimonialEvents};
use crate::validation::{check_max_len, finish, non_blank, parse_object_id};

const NAME_MAX: usize = 100;
const LOCATION_MAX: usize = 100;
const MESSAGE_MAX: usize = 1000;

fn not_found() -> AppError {
    AppError::NotFound("Testimonial not found".into())
}

/// Placeholder address for submissions without an email:
/// `Jane  Smith` becomes `jane.smith@example.com`.
pub fn fallback_email(name: &str) -> String {
    let local = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".");
    format!("{local}@example.com")
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitTestimonialRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
}

pub async fn list_testimonials(
    repo: &dyn TestimonialRepository,
    approved: Option<bool>,
) -> Result<Vec<TestimonialView>, AppError> {
    Ok(repo.list(approved).await?.into_iter().map(Into::into).collect())
}

/// Store a public submission. It stays hidden until approved.
pub async fn submit_testimonial(
    repo: &dyn TestimonialRepository,
    events: &TestimonialEvents,
    request: SubmitTestimonialRequest,
) -> Result<TestimonialView, AppError> {
    let (Some(name), Some(message)) = (non_blank(request.name), non_blank(request.message)) else {
        return Err(AppError::BadRequest("Please provide name and message".into()));
    };
    let location = non_blank(request.location);
    let email = non_blank(request.email)
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| fallback_email(&name));

    let mut errors = Vec::new();
    check_max_len(&mut errors, "Name", &name, NAME_MAX);
    if let Some(location) = &location {
        check_max_len(&mut errors, "Location", location, LOCATION_MAX);
    }
    check_max_len(&mut errors, "Message", &message, MESSAGE_MAX);
    finish(errors)?;

    let testimonial = repo
        .insert(Testimonial {
            id: None,
            name,
            email,
            location,
            message,
            approved: false,
            created_at: Utc::now(),
        })
        .await?;

    let view = TestimonialView::from(testimonial);
    tracing::info!("Testimonial {} submitted by {}", view.id, view.name);
    events.publish(TestimonialEvent::Created(view.clone()));
    Ok(view)
}

/// Approve a testimonial. Approving an approved one is a no-op.
pub async fn approve_testimonial(
    repo: &dyn TestimonialRepository,
    events: &TestimonialEvents,
    id: &str,
) -> Result<TestimonialView, AppError> {
    let id = parse_object_id(id, "testimonial")?;
    let view = TestimonialView::from(repo.approve(id).await?.ok_or_else(not_found)?);
    events.publish(TestimonialEvent::Approved(view.clone()));
    Ok(view)
}

/// Remove a testimonial (declining a submission deletes it).
pub async fn delete_testimonial(
    repo: &dyn TestimonialRepository,
    events: &TestimonialEvents,
    id: &str,
) -> Result<(), AppError> {
    let oid = parse_object_id(id, "testimonial")?;
    repo.delete(oid).await?.ok_or_else(not_found)?;
    events.publish(TestimonialEvent::Deleted { id: oid.to_hex() });
    Ok(())
}

// -- Handlers --

/// `GET /api/testimonials`
pub async fn list_testimonials_handler(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<TestimonialView>>, AppError> {
    Ok(ApiResponse::list(
        list_testimonials(state.testimonial_repo.as_ref(), None).await?,
    ))
}

/// `GET /api/testimonials/approved`
pub async fn list_approved_handler(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<TestimonialView>>, AppError> {
    Ok(ApiResponse::list(
        list_testimonials(state.testimonial_repo.as_ref(), Some(true)).await?,
    ))
}

/// `GET /api/testimonials/unapproved`
pub async fn list_unapproved_handler(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<TestimonialView>>, AppError> {
    Ok(ApiResponse::list(
        list_testimonials(state.testimonial_repo.as_ref(), Some(false)).await?,
    ))
}

/// `POST /api/testimonials`
///
/// Public. The admin notification is sent in the background and never
/// delays or fails the submission.
pub async fn submit_testimonial_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubmitTestimonialRequest>,
) -> Result<ApiResponse<TestimonialView>, AppError> {
    let testimonial =
        submit_testimonial(state.testimonial_repo.as_ref(), &state.events, request).await?;
    spawn_testimonial_notification(state.email.clone(), testimonial.clone());

    Ok(ApiResponse::data(testimonial)
        .with_message("Testimonial submitted successfully")
        .created())
}

/// `PATCH /api/testimonials/{id}/approve`
pub async fn approve_testimonial_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<TestimonialView>, AppError> {
    let testimonial =
        approve_testimonial(state.testimonial_repo.as_ref(), &state.events, &id).await?;
    Ok(ApiResponse::data(testimonial).with_message("Testimonial approved successfully"))
}

/// `DELETE /api/testimonials/{id}`
pub async fn delete_testimonial_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    delete_testimonial(state.testimonial_repo.as_ref(), &state.events, &id).await?;
    Ok(ApiResponse::message("Testimonial deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemTestimonialRepo;

    fn submission(name: &str, email: Option<&str>) -> SubmitTestimonialRequest {
        SubmitTestimonialRequest {
            name: Some(name.to_string()),
            email: email.map(str::to_string),
            location: Some("Manchester".to_string()),
            message: Some("They sorted our lettings quickly.".to_string()),
        }
    }

    #[test]
    fn test_fallback_email() {
        assert_eq!(fallback_email("Jane Smith"), "jane.smith@example.com");
        assert_eq!(fallback_email("Mary  Ann\tLee"), "mary.ann.lee@example.com");
    }

    #[tokio::test]
    async fn test_submit_starts_unapproved_and_normalizes_email() {
        let repo = MemTestimonialRepo::default();
        let events = TestimonialEvents::default();
        let mut rx = events.subscribe();

        let t = submit_testimonial(&repo, &events, submission(" Jane Smith ", Some(" Jane@Example.COM ")))
            .await
            .unwrap();
        assert!(!t.approved);
        assert_eq!(t.name, "Jane Smith");
        assert_eq!(t.email, "jane@example.com");
        assert_eq!(rx.recv().await.unwrap(), TestimonialEvent::Created(t));
    }

    #[tokio::test]
    async fn test_submit_without_email_uses_fallback() {
        let repo = MemTestimonialRepo::default();
        let t = submit_testimonial(&repo, &TestimonialEvents::default(), submission(" Jane Smith ", None))
            .await
            .unwrap();
        assert_eq!(t.email, "jane.smith@example.com");
    }

    #[tokio::test]
    async fn test_submit_requires_name_and_message() {
        let repo = MemTestimonialRepo::default();
        let mut req = submission("Jane", None);
        req.message = Some("  ".to_string());
        let err = submit_testimonial(&repo, &TestimonialEvents::default(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Please provide name and message"));
    }

    #[tokio::test]
    async fn test_message_length_cap() {
        let repo = MemTestimonialRepo::default();
        let mut req = submission("Jane", None);
        req.message = Some("m".repeat(1001));
        let err = submit_testimonial(&repo, &TestimonialEvents::default(), req)
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::Validation(v) if v == vec!["Message cannot exceed 1000 characters"])
        );
    }

    #[tokio::test]
    async fn test_approved_listing_never_contains_pending() {
        let repo = MemTestimonialRepo::default();
        let events = TestimonialEvents::default();
        let a = submit_testimonial(&repo, &events, submission("A", None)).await.unwrap();
        submit_testimonial(&repo, &events, submission("B", None)).await.unwrap();

        approve_testimonial(&repo, &events, &a.id).await.unwrap();
        // Approving again is harmless.
        assert!(approve_testimonial(&repo, &events, &a.id).await.unwrap().approved);

        let approved = list_testimonials(&repo, Some(true)).await.unwrap();
        assert_eq!(approved.len(), 1);
        assert!(approved.iter().all(|t| t.approved));

        let pending = list_testimonials(&repo, Some(false)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "B");
    }

    #[tokio::test]
    async fn test_delete_publishes_event_and_handles_missing() {
        let repo = MemTestimonialRepo::default();
        let events = TestimonialEvents::default();
        let t = submit_testimonial(&repo, &events, submission("A", None)).await.unwrap();
        let mut rx = events.subscribe();

        delete_testimonial(&repo, &events, &t.id).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), TestimonialEvent::Deleted { id: t.id.clone() });

        let err = delete_testimonial(&repo, &events, &t.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Testimonial not found"));

        let err = approve_testimonial(&repo, &events, "123").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid testimonial ID"));
    }
}
