//! Brand settings repository for `SQLite` persistence.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;

use crate::workflow::brand::{BrandProfile, BrandRepo};
use crate::Result;

use super::db::Database;

/// Repository wrapper around `SQLite` for brand settings records.
#[derive(Clone)]
pub struct SqliteBrandRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct BrandRow {
    company_name: String,
    company_description: String,
    tone_profile: String,
    custom_tone: Option<String>,
    audience: String,
}

impl BrandRow {
    fn into_profile(self) -> BrandProfile {
        BrandProfile {
            company_name: self.company_name,
            company_description: self.company_description,
            tone_profile: self.tone_profile,
            custom_tone: self.custom_tone,
            audience: self.audience,
        }
    }
}

impl SqliteBrandRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Retrieve the stored profile for an organization, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get(&self, organization_id: &str) -> Result<Option<BrandProfile>> {
        let row: Option<BrandRow> = sqlx::query_as(
            "SELECT company_name, company_description, tone_profile, custom_tone, audience
             FROM brand_settings WHERE organization_id = ?1",
        )
        .bind(organization_id)
        .fetch_optional(self.db.as_ref())
        .await?;

        Ok(row.map(BrandRow::into_profile))
    }
}

impl BrandRepo for SqliteBrandRepo {
    fn save(
        &self,
        organization_id: &str,
        url: &str,
        profile: &BrandProfile,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let organization_id = organization_id.to_owned();
        let url = url.to_owned();
        let profile = profile.clone();
        Box::pin(async move {
            let updated_at = Utc::now().to_rfc3339();
            sqlx::query(
                "INSERT INTO brand_settings
                 (organization_id, company_name, company_description, tone_profile,
                  custom_tone, audience, source_url, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(organization_id) DO UPDATE SET
                     company_name = excluded.company_name,
                     company_description = excluded.company_description,
                     tone_profile = excluded.tone_profile,
                     custom_tone = excluded.custom_tone,
                     audience = excluded.audience,
                     source_url = excluded.source_url,
                     updated_at = excluded.updated_at",
            )
            .bind(&organization_id)
            .bind(&profile.company_name)
            .bind(&profile.company_description)
            .bind(&profile.tone_profile)
            .bind(&profile.custom_tone)
            .bind(&profile.audience)
            .bind(&url)
            .bind(&updated_at)
            .execute(self.db.as_ref())
            .await?;

            Ok(())
        })
    }
}
