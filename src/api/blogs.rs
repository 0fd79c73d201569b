use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;

use crate::api::envelope::ApiResponse;
use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::middleware::AdminGuard;
use crate::db::blog_repository::BlogRepository;
use crate::db::models::{Blog, BlogCategory, BlogChanges, BlogView};
use crate::error::AppError;
use crate::validation::{check_max_len, finish, non_blank, parse_object_id};

const TITLE_MAX: usize = 200;
const SOURCE_MAX: usize = 200;

fn not_found() -> AppError {
    AppError::NotFound("Blog post not found".into())
}

fn parse_category(value: &str) -> Result<BlogCategory, AppError> {
    BlogCategory::parse(value).ok_or_else(|| {
        let allowed: Vec<&str> = BlogCategory::ALL.iter().map(|c| c.as_str()).collect();
        AppError::Validation(vec![format!(
            "Category must be one of: {}",
            allowed.join(", ")
        )])
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBlogRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
    pub source: Option<String>,
}

/// Partial update. Blank `title`, `category` and `content` are ignored; an
/// empty `source` removes the source.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
    pub source: Option<String>,
    pub published: Option<bool>,
}

pub async fn list_blogs(repo: &dyn BlogRepository) -> Result<Vec<BlogView>, AppError> {
    Ok(repo.list(None).await?.into_iter().map(Into::into).collect())
}

pub async fn list_published_blogs(repo: &dyn BlogRepository) -> Result<Vec<BlogView>, AppError> {
    Ok(repo.list(Some(true)).await?.into_iter().map(Into::into).collect())
}

pub async fn get_blog(repo: &dyn BlogRepository, id: &str) -> Result<BlogView, AppError> {
    let id = parse_object_id(id, "blog")?;
    repo.find_by_id(id)
        .await?
        .map(Into::into)
        .ok_or_else(not_found)
}

/// Create a post. New posts always start unpublished.
pub async fn create_blog(
    repo: &dyn BlogRepository,
    request: CreateBlogRequest,
) -> Result<BlogView, AppError> {
    let (Some(title), Some(category), Some(content)) = (
        non_blank(request.title),
        non_blank(request.category),
        non_blank(request.content),
    ) else {
        return Err(AppError::BadRequest(
            "Please provide title, category, and content".into(),
        ));
    };

    let category = parse_category(&category)?;
    let source = non_blank(request.source);

    let mut errors = Vec::new();
    check_max_len(&mut errors, "Title", &title, TITLE_MAX);
    if let Some(source) = &source {
        check_max_len(&mut errors, "Source", source, SOURCE_MAX);
    }
    finish(errors)?;

    let now = Utc::now();
    let blog = repo
        .insert(Blog {
            id: None,
            title,
            category,
            content,
            source,
            published: false,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!("Created blog post {}", blog.id.map(|id| id.to_hex()).unwrap_or_default());
    Ok(blog.into())
}

pub async fn update_blog(
    repo: &dyn BlogRepository,
    id: &str,
    request: UpdateBlogRequest,
) -> Result<BlogView, AppError> {
    let id = parse_object_id(id, "blog")?;

    let category = match non_blank(request.category) {
        Some(category) => Some(parse_category(&category)?),
        None => None,
    };
    let changes = BlogChanges {
        title: non_blank(request.title),
        category,
        content: non_blank(request.content),
        source: request.source.map(|s| non_blank(Some(s))),
        published: request.published,
    };

    let mut errors = Vec::new();
    if let Some(title) = &changes.title {
        check_max_len(&mut errors, "Title", title, TITLE_MAX);
    }
    if let Some(Some(source)) = &changes.source {
        check_max_len(&mut errors, "Source", source, SOURCE_MAX);
    }
    finish(errors)?;

    repo.update(id, changes, Utc::now())
        .await?
        .map(Into::into)
        .ok_or_else(not_found)
}

/// Flip the publication state of a post.
pub async fn toggle_publish(repo: &dyn BlogRepository, id: &str) -> Result<BlogView, AppError> {
    let id = parse_object_id(id, "blog")?;
    repo.toggle_published(id, Utc::now())
        .await?
        .map(Into::into)
        .ok_or_else(not_found)
}

pub async fn delete_blog(repo: &dyn BlogRepository, id: &str) -> Result<BlogView, AppError> {
    let id = parse_object_id(id, "blog")?;
    repo.delete(id).await?.map(Into::into).ok_or_else(not_found)
}

// -- Handlers --

/// `GET /api/blogs`
pub async fn list_blogs_handler(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<BlogView>>, AppError> {
    Ok(ApiResponse::list(list_blogs(state.blog_repo.as_ref()).await?))
}

/// `GET /api/blogs/published`
pub async fn list_published_blogs_handler(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<BlogView>>, AppError> {
    Ok(ApiResponse::list(
        list_published_blogs(state.blog_repo.as_ref()).await?,
    ))
}

/// `GET /api/blogs/{id}`
pub async fn get_blog_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<BlogView>, AppError> {
    Ok(ApiResponse::data(get_blog(state.blog_repo.as_ref(), &id).await?))
}

/// `POST /api/blogs`
pub async fn create_blog_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateBlogRequest>,
) -> Result<ApiResponse<BlogView>, AppError> {
    let blog = create_blog(state.blog_repo.as_ref(), request).await?;
    Ok(ApiResponse::data(blog)
        .with_message("Blog post created successfully")
        .created())
}

/// `PUT /api/blogs/{id}`
pub async fn update_blog_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateBlogRequest>,
) -> Result<ApiResponse<BlogView>, AppError> {
    let blog = update_blog(state.blog_repo.as_ref(), &id, request).await?;
    Ok(ApiResponse::data(blog).with_message("Blog post updated successfully"))
}

/// `PATCH /api/blogs/{id}/publish`
pub async fn toggle_publish_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<BlogView>, AppError> {
    let blog = toggle_publish(state.blog_repo.as_ref(), &id).await?;
    let message = if blog.published {
        "Blog post published successfully"
    } else {
        "Blog post unpublished successfully"
    };
    Ok(ApiResponse::data(blog).with_message(message))
}

/// `DELETE /api/blogs/{id}`
pub async fn delete_blog_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<BlogView>, AppError> {
    let blog = delete_blog(state.blog_repo.as_ref(), &id).await?;
    Ok(ApiResponse::data(blog).with_message("Blog post deleted successfully"))
}
