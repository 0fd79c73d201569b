use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;

use crate::api::envelope::ApiResponse;
use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::middleware::AdminGuard;
use crate::db::models::{Page, PageChanges, PageMeta, PageSlug, PageView};
use crate::db::page_repository::{page_exists_message, PageRepository};
use crate::error::AppError;
use crate::validation::{check_max_len, finish, non_blank};

const TITLE_MAX: usize = 200;
const META_DESCRIPTION_MAX: usize = 500;

fn not_found(slug: &str) -> AppError {
    AppError::NotFound(format!("Page with slug \"{slug}\" not found"))
}

/// Resolve a slug from a path segment; unknown slugs are simply not found.
fn known_slug(slug: &str) -> Result<PageSlug, AppError> {
    PageSlug::from_str_ci(slug).ok_or_else(|| not_found(&slug.trim().to_lowercase()))
}

fn normalize_meta(meta: PageMeta) -> PageMeta {
    PageMeta {
        description: non_blank(meta.description),
        keywords: non_blank(meta.keywords),
    }
}

fn validate(title: Option<&str>, meta: Option<&PageMeta>) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if let Some(title) = title {
        check_max_len(&mut errors, "Title", title, TITLE_MAX);
    }
    if let Some(description) = meta.and_then(|m| m.description.as_deref()) {
        check_max_len(&mut errors, "Meta description", description, META_DESCRIPTION_MAX);
    }
    finish(errors)
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePageRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePageRequest {
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    pub meta: Option<PageMeta>,
}

pub async fn list_pages(repo: &dyn PageRepository) -> Result<Vec<PageView>, AppError> {
    Ok(repo.list().await?.into_iter().map(Into::into).collect())
}

pub async fn get_page(repo: &dyn PageRepository, slug: &str) -> Result<PageView, AppError> {
    let page_slug = known_slug(slug)?;
    repo.find_by_slug(page_slug)
        .await?
        .map(Into::into)
        .ok_or_else(|| not_found(page_slug.as_str()))
}

/// Create a page. A slug can only be created once; later edits go through
/// [`update_page`].
pub async fn create_page(
    repo: &dyn PageRepository,
    request: CreatePageRequest,
) -> Result<PageView, AppError> {
    let (Some(slug), Some(title), Some(content)) = (
        non_blank(request.slug),
        non_blank(request.title),
        request.content,
    ) else {
        return Err(AppError::BadRequest(
            "Please provide slug, title, and content".into(),
        ));
    };

    let slug = PageSlug::from_str_ci(&slug).ok_or_else(|| {
        let allowed: Vec<&str> = PageSlug::ALL.iter().map(|s| s.as_str()).collect();
        AppError::Validation(vec![format!(
            "Page slug must be one of: {}",
            allowed.join(", ")
        )])
    })?;
    let meta = normalize_meta(request.meta.unwrap_or_default());
    validate(Some(&title), Some(&meta))?;

    if repo.find_by_slug(slug).await?.is_some() {
        return Err(AppError::BadRequest(page_exists_message(slug.as_str())));
    }

    let now = Utc::now();
    let page = repo
        .insert(Page {
            id: None,
            slug,
            title,
            content,
            meta,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!("Created page '{slug}'");
    Ok(page.into())
}

pub async fn update_page(
    repo: &dyn PageRepository,
    slug: &str,
    request: UpdatePageRequest,
) -> Result<PageView, AppError> {
    let page_slug = known_slug(slug)?;
    let changes = PageChanges {
        title: non_blank(request.title),
        content: request.content,
        meta: request.meta.map(normalize_meta),
    };
    validate(changes.title.as_deref(), changes.meta.as_ref())?;

    repo.update(page_slug, changes, Utc::now())
        .await?
        .map(Into::into)
        .ok_or_else(|| not_found(page_slug.as_str()))
}

pub async fn delete_page(repo: &dyn PageRepository, slug: &str) -> Result<PageView, AppError> {
    let page_slug = known_slug(slug)?;
    repo.delete(page_slug)
        .await?
        .map(Into::into)
        .ok_or_else(|| not_found(page_slug.as_str()))
}

// -- Handlers --

/// `GET /api/pages`
pub async fn list_pages_handler(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<PageView>>, AppError> {
    Ok(ApiResponse::list(list_pages(state.page_repo.as_ref()).await?))
}

/// `GET /api/pages/{slug}`
pub async fn get_page_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<PageView>, AppError> {
    Ok(ApiResponse::data(get_page(state.page_repo.as_ref(), &slug).await?))
}

/// `POST /api/pages`
pub async fn create_page_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreatePageRequest>,
) -> Result<ApiResponse<PageView>, AppError> {
    let page = create_page(state.page_repo.as_ref(), request).await?;
    Ok(ApiResponse::data(page)
        .with_message("Page created successfully")
        .created())
}

/// `PUT /api/pages/{slug}`
pub async fn update_page_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ApiJson(request): ApiJson<UpdatePageRequest>,
) -> Result<ApiResponse<PageView>, AppError> {
    let page = update_page(state.page_repo.as_ref(), &slug, request).await?;
    Ok(ApiResponse::data(page).with_message("Page updated successfully"))
}

/// `DELETE /api/pages/{slug}`
pub async fn delete_page_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<PageView>, AppError> {
    let page = delete_page(state.page_repo.as_ref(), &slug).await?;
    Ok(ApiResponse::data(page).with_message("Page deleted successfully"))
}
