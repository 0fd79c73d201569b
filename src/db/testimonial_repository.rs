use async_trait::async_trait;
use bson::doc;
use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use crate::db::models::Testimonial;
use crate::error::AppError;

/// Repository trait for testimonials.
#[async_trait]
pub trait TestimonialRepository: Send + Sync {
    /// List testimonials newest first, optionally filtered by approval.
    async fn list(&self, approved: Option<bool>) -> Result<Vec<Testimonial>, AppError>;

    async fn insert(&self, testimonial: Testimonial) -> Result<Testimonial, AppError>;

    /// Mark a testimonial approved. Approving twice is harmless.
    async fn approve(&self, id: ObjectId) -> Result<Option<Testimonial>, AppError>;

    async fn delete(&self, id: ObjectId) -> Result<Option<Testimonial>, AppError>;
}

/// MongoDB implementation of the TestimonialRepository.
pub struct MongoTestimonialRepository {
    collection: mongodb::Collection<Testimonial>,
}

impl MongoTestimonialRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("testimonials"),
        }
    }
}

#[async_trait]
impl TestimonialRepository for MongoTestimonialRepository {
    async fn list(&self, approved: Option<bool>) -> Result<Vec<Testimonial>, AppError> {
        let filter = match approved {
            Some(approved) => doc! { "approved": approved },
            None => doc! {},
        };
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, mut testimonial: Testimonial) -> Result<Testimonial, AppError> {
        let result = self.collection.insert_one(&testimonial).await?;
        testimonial.id = result.inserted_id.as_object_id();
        Ok(testimonial)
    }

    async fn approve(&self, id: ObjectId) -> Result<Option<Testimonial>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": { "approved": true } })
            .with_options(options)
            .await?)
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<Testimonial>, AppError> {
        Ok(self
            .collection
            .find_one_and_delete(doc! { "_id": id })
            .await?)
    }
}
