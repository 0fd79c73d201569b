use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use crate::db::models::{Blog, BlogChanges};
use crate::error::AppError;

/// Repository trait for blog posts.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// List posts newest first, optionally filtered by publication state.
    async fn list(&self, published: Option<bool>) -> Result<Vec<Blog>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Blog>, AppError>;

    /// Insert a new post and return it with its generated id.
    async fn insert(&self, blog: Blog) -> Result<Blog, AppError>;

    /// Apply `changes` and bump `updatedAt`. Returns the updated post, or
    /// `None` if no post has this id.
    async fn update(
        &self,
        id: ObjectId,
        changes: BlogChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Blog>, AppError>;

    /// Flip `published` in a single atomic update.
    async fn toggle_published(
        &self,
        id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<Option<Blog>, AppError>;

    /// Delete a post, returning what was removed.
    async fn delete(&self, id: ObjectId) -> Result<Option<Blog>, AppError>;
}

/// Build the `$set`/`$unset` update for a set of blog changes.
pub fn blog_update_document(changes: &BlogChanges, now: DateTime<Utc>) -> Document {
    let mut set = doc! { "updatedAt": bson::DateTime::from_chrono(now) };
    let mut unset = Document::new();

    if let Some(title) = &changes.title {
        set.insert("title", title.as_str());
    }
    if let Some(category) = &changes.category {
        set.insert("category", category.as_str());
    }
    if let Some(content) = &changes.content {
        set.insert("content", content.as_str());
    }
    match &changes.source {
        Some(Some(source)) => {
            set.insert("source", source.as_str());
        }
        Some(None) => {
            unset.insert("source", "");
        }
        None => {}
    }
    if let Some(published) = changes.published {
        set.insert("published", published);
    }

    let mut update = doc! { "$set": set };
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}

/// MongoDB implementation of the BlogRepository.
pub struct MongoBlogRepository {
    collection: mongodb::Collection<Blog>,
}

impl MongoBlogRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("blogs"),
        }
    }

    fn return_updated() -> FindOneAndUpdateOptions {
        FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build()
    }
}

#[async_trait]
impl BlogRepository for MongoBlogRepository {
    async fn list(&self, published: Option<bool>) -> Result<Vec<Blog>, AppError> {
        let filter = match published {
            Some(published) => doc! { "published": published },
            None => doc! {},
        };
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Blog>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut blog: Blog) -> Result<Blog, AppError> {
        let result = self.collection.insert_one(&blog).await?;
        blog.id = result.inserted_id.as_object_id();
        Ok(blog)
    }

    async fn update(
        &self,
        id: ObjectId,
        changes: BlogChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Blog>, AppError> {
        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, blog_update_document(&changes, now))
            .with_options(Self::return_updated())
            .await?)
    }

    async fn toggle_published(
        &self,
        id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<Option<Blog>, AppError> {
        // Pipeline form so the read-and-flip happens server side.
        let pipeline = vec![doc! {
            "$set": {
                "published": { "$not": [{ "$eq": ["$published", true] }] },
                "updatedAt": bson::DateTime::from_chrono(now),
            }
        }];

        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, pipeline)
            .with_options(Self::return_updated())
            .await?)
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<Blog>, AppError> {
        Ok(self.collection.find_one_and_delete(doc! { "_id": id }).await?)
    }
}
