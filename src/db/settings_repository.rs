use async_trait::async_trait;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

use crate::db::connection::is_duplicate_key;
use crate::db::models::{SettingsChanges, SiteSettings, SETTINGS_KEY};
use crate::error::AppError;

/// Repository trait for the site-settings singleton.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Get the settings document, creating it with defaults if absent.
    async fn get_settings(&self) -> Result<SiteSettings, AppError>;

    /// Apply `changes`, creating the document first if needed.
    async fn update_settings(
        &self,
        changes: SettingsChanges,
        now: DateTime<Utc>,
    ) -> Result<SiteSettings, AppError>;
}

/// Build the single upsert used for both reading and updating the singleton.
///
/// Fields present in `changes` go to `$set`; every other field gets its
/// default through `$setOnInsert`, so the two operators never touch the
/// same path.
pub fn settings_upsert_document(changes: &SettingsChanges, now: DateTime<Utc>) -> Document {
    let defaults = SiteSettings::with_defaults(now);
    let now = bson::DateTime::from_chrono(now);

    let mut set = Document::new();
    let mut on_insert = doc! { "key": SETTINGS_KEY, "createdAt": now };

    let text_fields = [
        ("yearsOfExperience", &changes.years_of_experience, defaults.years_of_experience),
        ("happyClients", &changes.happy_clients, defaults.happy_clients),
        ("clientSatisfaction", &changes.client_satisfaction, defaults.client_satisfaction),
        ("propertiesManaged", &changes.properties_managed, defaults.properties_managed),
    ];
    for (field, change, default) in text_fields {
        match change {
            Some(value) => set.insert(field, value.as_str()),
            None => on_insert.insert(field, default),
        };
    }
    match changes.company_founded_year {
        Some(year) => set.insert("companyFoundedYear", year),
        None => on_insert.insert("companyFoundedYear", defaults.company_founded_year),
    };

    if set.is_empty() {
        // Plain read: only stamp updatedAt on first insert.
        on_insert.insert("updatedAt", now);
    } else {
        set.insert("updatedAt", now);
    }

    let mut update = doc! { "$setOnInsert": on_insert };
    if !set.is_empty() {
        update.insert("$set", set);
    }
    update
}

/// MongoDB implementation of the SettingsRepository.
pub struct MongoSettingsRepository {
    collection: mongodb::Collection<SiteSettings>,
}

impl MongoSettingsRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("sitesettings"),
        }
    }

    async fn upsert(&self, update: Document) -> Result<SiteSettings, mongodb::error::Error> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let settings = self
            .collection
            .find_one_and_update(doc! { "key": SETTINGS_KEY }, update)
            .with_options(options)
            .await?;

        // An upsert that returns the new document always yields one.
        Ok(settings.unwrap_or_else(|| SiteSettings::with_defaults(Utc::now())))
    }

    /// Run the upsert, retrying once if a concurrent first write won the
    /// unique `key` index.
    async fn upsert_with_retry(&self, update: Document) -> Result<SiteSettings, AppError> {
        match self.upsert(update.clone()).await {
            Err(e) if is_duplicate_key(&e) => {
                tracing::debug!("Settings upsert raced with another writer, retrying");
                Ok(self.upsert(update).await?)
            }
            result => Ok(result?),
        }
    }
}

#[async_trait]
impl SettingsRepository for MongoSettingsRepository {
    async fn get_settings(&self) -> Result<SiteSettings, AppError> {
        self.upsert_with_retry(settings_upsert_document(&SettingsChanges::default(), Utc::now()))
            .await
    }

    async fn update_settings(
        &self,
        changes: SettingsChanges,
        now: DateTime<Utc>,
    ) -> Result<SiteSettings, AppError> {
        self.upsert_with_retry(settings_upsert_document(&changes, now))
            .await
    }
}
