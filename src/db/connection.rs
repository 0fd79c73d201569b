use bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

use crate::config::DatabaseConfig;
use crate::db::models::SETTINGS_KEY;
use crate::error::AppError;

const DUPLICATE_KEY: i32 = 11000;

/// Insert credentials into a MongoDB connection string.
///
/// Credentials are percent-encoded, so passwords may contain `@` or `:`.
/// A URI that already carries credentials is overridden. Without a
/// username the URI is returned unchanged.
pub fn connection_uri(
    uri: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<String, AppError> {
    let Some(username) = username.filter(|u| !u.is_empty()) else {
        return Ok(uri.to_string());
    };

    let mut url = url::Url::parse(uri)
        .map_err(|e| AppError::Internal(format!("Invalid MongoDB URI: {e}")))?;
    url.set_username(username)
        .map_err(|_| AppError::Internal("MongoDB URI cannot carry a username".into()))?;
    url.set_password(password)
        .map_err(|_| AppError::Internal("MongoDB URI cannot carry a password".into()))?;

    Ok(url.to_string())
}

/// Connect to MongoDB and return a handle to the configured database.
pub async fn connect(config: &DatabaseConfig) -> Result<mongodb::Database, AppError> {
    let uri = connection_uri(
        &config.uri,
        config.username.as_deref(),
        config.password.as_deref(),
    )?;
    let client = mongodb::Client::with_uri_str(&uri).await?;
    let db = client.database(&config.database);

    db.run_command(doc! { "ping": 1 }).await?;
    tracing::info!("Connected to MongoDB database '{}'", config.database);

    Ok(db)
}

/// Create the indexes every collection relies on. Safe to call repeatedly.
pub async fn ensure_indexes(db: &mongodb::Database) -> Result<(), AppError> {
    let unique = || IndexOptions::builder().unique(true).build();

    db.collection::<bson::Document>("blogs")
        .create_indexes([
            IndexModel::builder()
                .keys(doc! { "published": 1, "createdAt": -1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "category": 1, "published": 1 })
                .build(),
        ])
        .await?;

    db.collection::<bson::Document>("pages")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "slug": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    db.collection::<bson::Document>("testimonials")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "approved": 1, "createdAt": -1 })
                .build(),
        )
        .await?;

    adopt_legacy_settings(db).await?;
    db.collection::<bson::Document>("sitesettings")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "key": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    tracing::debug!("MongoDB indexes ensured");
    Ok(())
}

/// Give a settings document written without a `key` the singleton key.
///
/// Older deployments created the document with no `key` field. Without this
/// the keyed upsert would miss it and insert a second, default document.
/// Nothing changes once a keyed document exists.
pub async fn adopt_legacy_settings(db: &mongodb::Database) -> Result<(), AppError> {
    let settings = db.collection::<bson::Document>("sitesettings");
    if settings
        .count_documents(doc! { "key": SETTINGS_KEY })
        .await?
        > 0
    {
        return Ok(());
    }

    let result = settings
        .update_one(
            doc! { "key": { "$exists": false } },
            doc! { "$set": { "key": SETTINGS_KEY } },
        )
        .await?;
    if result.modified_count > 0 {
        tracing::info!("Adopted existing site settings document as the '{SETTINGS_KEY}' singleton");
    }
    Ok(())
}

/// Whether a driver error is a unique-index violation.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
