use async_trait::async_trait;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use crate::db::connection::is_duplicate_key;
use crate::db::models::{Page, PageChanges, PageSlug};
use crate::error::AppError;

/// Message used when a page already exists for a slug.
pub fn page_exists_message(slug: &str) -> String {
    format!("Page with slug \"{slug}\" already exists. Use PUT to update instead.")
}

/// Repository trait for editable pages, keyed by slug.
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// List all pages sorted by slug.
    async fn list(&self) -> Result<Vec<Page>, AppError>;

    async fn find_by_slug(&self, slug: PageSlug) -> Result<Option<Page>, AppError>;

    /// Insert a page. Fails with `BadRequest` if the slug is taken.
    async fn insert(&self, page: Page) -> Result<Page, AppError>;

    async fn update(
        &self,
        slug: PageSlug,
        changes: PageChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Page>, AppError>;

    async fn delete(&self, slug: PageSlug) -> Result<Option<Page>, AppError>;
}

pub fn page_update_document(
    changes: &PageChanges,
    now: DateTime<Utc>,
) -> Result<Document, AppError> {
    let mut set = doc! { "updatedAt": bson::DateTime::from_chrono(now) };

    if let Some(title) = &changes.title {
        set.insert("title", title.as_str());
    }
    if let Some(content) = &changes.content {
        let content = bson::to_bson(content)
            .map_err(|e| AppError::BadRequest(format!("Unsupported page content: {e}")))?;
        set.insert("content", content);
    }
    if let Some(meta) = &changes.meta {
        let meta = bson::to_bson(meta).map_err(|e| AppError::Internal(e.to_string()))?;
        set.insert("meta", meta);
    }

    Ok(doc! { "$set": set })
}

/// MongoDB implementation of the PageRepository.
pub struct MongoPageRepository {
    collection: mongodb::Collection<Page>,
}

impl MongoPageRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("pages"),
        }
    }
}

#[async_trait]
impl PageRepository for MongoPageRepository {
    async fn list(&self) -> Result<Vec<Page>, AppError> {
        let options = FindOptions::builder().sort(doc! { "slug": 1 }).build();
        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_slug(&self, slug: PageSlug) -> Result<Option<Page>, AppError> {
        Ok(self
            .collection
            .find_one(doc! { "slug": slug.as_str() })
            .await?)
    }

    async fn insert(&self, mut page: Page) -> Result<Page, AppError> {
        match self.collection.insert_one(&page).await {
            Ok(result) => {
                page.id = result.inserted_id.as_object_id();
                Ok(page)
            }
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::BadRequest(page_exists_message(page.slug.as_str())))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        slug: PageSlug,
        changes: PageChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Page>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection
            .find_one_and_update(
                doc! { "slug": slug.as_str() },
                page_update_document(&changes, now)?,
            )
            .with_options(options)
            .await?)
    }

    async fn delete(&self, slug: PageSlug) -> Result<Option<Page>, AppError> {
        Ok(self
            .collection
            .find_one_and_delete(doc! { "slug": slug.as_str() })
            .await?)
    }
}
