use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;

use crate::api::envelope::ApiResponse;
use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::middleware::AdminGuard;
use crate::db::models::{SettingsChanges, SiteSettingsView};
use crate::db::settings_repository::SettingsRepository;
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub years_of_experience: Option<String>,
    pub happy_clients: Option<String>,
    pub client_satisfaction: Option<String>,
    pub properties_managed: Option<String>,
    pub company_founded_year: Option<i32>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Every field present in the request is applied, an empty string included,
/// so a statistic can be cleared from the dashboard.
impl From<UpdateSettingsRequest> for SettingsChanges {
    fn from(req: UpdateSettingsRequest) -> Self {
        Self {
            years_of_experience: trimmed(req.years_of_experience),
            happy_clients: trimmed(req.happy_clients),
            client_satisfaction: trimmed(req.client_satisfaction),
            properties_managed: trimmed(req.properties_managed),
            company_founded_year: req.company_founded_year,
        }
    }
}

/// Read the settings, creating the defaults on first access.
pub async fn get_site_settings(
    repo: &dyn SettingsRepository,
) -> Result<SiteSettingsView, AppError> {
    Ok(repo.get_settings().await?.into())
}

pub async fn update_site_settings(
    repo: &dyn SettingsRepository,
    request: UpdateSettingsRequest,
) -> Result<SiteSettingsView, AppError> {
    let settings = repo.update_settings(request.into(), Utc::now()).await?;
    tracing::info!("Site settings updated");
    Ok(settings.into())
}

/// `GET /api/site-settings`
pub async fn get_site_settings_handler(
    State(state): State<AppState>,
) -> Result<ApiResponse<SiteSettingsView>, AppError> {
    Ok(ApiResponse::data(
        get_site_settings(state.settings_repo.as_ref()).await?,
    ))
}

/// `PUT /api/site-settings`
pub async fn update_site_settings_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateSettingsRequest>,
) -> Result<ApiResponse<SiteSettingsView>, AppError> {
    let settings = update_site_settings(state.settings_repo.as_ref(), request).await?;
    Ok(ApiResponse::data(settings).with_message("Site settings updated successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemSettingsRepo;

    #[tokio::test]
    async fn test_get_creates_defaults_once() {
        let repo = MemSettingsRepo::default();
        let first = get_site_settings(&repo).await.unwrap();
        let second = get_site_settings(&repo).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.happy_clients, "56+");
        assert_eq!(first.company_founded_year, 2014);
    }

    #[tokio::test]
    async fn test_update_before_any_read_creates_document() {
        let repo = MemSettingsRepo::default();
        let updated = update_site_settings(
            &repo,
            UpdateSettingsRequest {
                happy_clients: Some(" 80+ ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.happy_clients, "80+");
        assert_eq!(updated.years_of_experience, "10+");

        let read = get_site_settings(&repo).await.unwrap();
        assert_eq!(read.id, updated.id);
        assert_eq!(read.happy_clients, "80+");
    }

    #[test]
    fn test_present_values_are_trimmed_and_absent_ones_skipped() {
        let changes = SettingsChanges::from(UpdateSettingsRequest {
            client_satisfaction: Some("   ".to_string()),
            happy_clients: Some(" 60+ ".to_string()),
            company_founded_year: Some(2010),
            ..Default::default()
        });
        assert_eq!(changes.client_satisfaction.as_deref(), Some(""));
        assert_eq!(changes.happy_clients.as_deref(), Some("60+"));
        assert_eq!(changes.years_of_experience, None);
        assert_eq!(changes.company_founded_year, Some(2010));
    }

    #[tokio::test]
    async fn test_empty_value_clears_a_statistic() {
        let repo = MemSettingsRepo::default();
        let updated = update_site_settings(
            &repo,
            UpdateSettingsRequest {
                properties_managed: Some("".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.properties_managed, "");
        assert_eq!(updated.happy_clients, "56+");
    }
}
