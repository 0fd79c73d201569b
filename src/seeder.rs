use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{Page, PageMeta, PageSlug};
use crate::db::page_repository::PageRepository;
use crate::db::settings_repository::SettingsRepository;
use crate::error::AppError;

/// Default page content, embedded directly into the binary.
const DEFAULT_PAGES: &str = include_str!("../seed_data/pages.json");

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPage {
    pub slug: PageSlug,
    pub title: String,
    pub content: serde_json::Value,
    #[serde(default)]
    pub meta: PageMeta,
}

/// What a seeding run did.
#[derive(Debug, Default, PartialEq)]
pub struct SeedReport {
    pub created: Vec<PageSlug>,
    pub skipped: Vec<PageSlug>,
}

pub fn default_pages() -> Result<Vec<SeedPage>, AppError> {
    serde_json::from_str(DEFAULT_PAGES)
        .map_err(|e| AppError::Internal(format!("Invalid embedded page defaults: {e}")))
}

/// Insert the default pages and the settings singleton where absent.
///
/// Pages that already exist are left untouched, so running this against a
/// live database never overwrites edits made in the dashboard.
pub async fn seed_defaults(
    pages: &dyn PageRepository,
    settings: &dyn SettingsRepository,
) -> Result<SeedReport, AppError> {
    tracing::info!("Starting default content seeding...");
    let mut report = SeedReport::default();

    for seed in default_pages()? {
        if pages.find_by_slug(seed.slug).await?.is_some() {
            tracing::info!("Page '{}' already exists, skipping.", seed.slug);
            report.skipped.push(seed.slug);
            continue;
        }

        let now = Utc::now();
        let page = Page {
            id: None,
            slug: seed.slug,
            title: seed.title,
            content: seed.content,
            meta: seed.meta,
            created_at: now,
            updated_at: now,
        };
        match pages.insert(page).await {
            Ok(_) => {
                tracing::info!("Inserted default page '{}'.", seed.slug);
                report.created.push(seed.slug);
            }
            // Someone created it between the check and the insert.
            Err(AppError::BadRequest(_)) => {
                tracing::info!("Page '{}' was created concurrently, skipping.", seed.slug);
                report.skipped.push(seed.slug);
            }
            Err(e) => return Err(e),
        }
    }

    let site = settings.get_settings().await?;
    tracing::info!(
        "Site settings present (founded {}, {} happy clients).",
        site.company_founded_year,
        site.happy_clients
    );

    tracing::info!(
        "Seeding completed: {} created, {} skipped.",
        report.created.len(),
        report.skipped.len()
    );
    Ok(report)
}
