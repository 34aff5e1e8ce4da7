//! Offline collaborators: a JSON file catalog and a log-only analytics sink.

use std::path::Path;

use async_trait::async_trait;
use perkfinder_model::{BenefitProgram, Offer, UserProgram};
use serde::{Deserialize, Serialize};

use crate::{offers_from_values, AnalyticsError, AnalyticsSink, CatalogError, CatalogSource};

/// On-disk catalog layout. Offer rows use the same shape as the REST view
/// and are decoded one by one, so a mistyped row only drops itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub offers: Vec<serde_json::Value>,
    #[serde(default)]
    pub programs: Vec<BenefitProgram>,
    #[serde(default)]
    pub user_programs: Vec<UserProgram>,
}

/// In-memory catalog, validated once at load time.
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    offers: Vec<Offer>,
    programs: Vec<BenefitProgram>,
    user_programs: Vec<UserProgram>,
}

impl FileCatalog {
    /// Catalog holding already validated offers and no programs.
    pub fn new(offers: Vec<Offer>) -> Self {
        Self {
            offers,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| CatalogError::ParseError(e.to_string()))?;
        Ok(Self {
            offers: offers_from_values(file.offers),
            programs: file.programs,
            user_programs: file.user_programs,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Connection(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            offers = catalog.offers.len(),
            programs = catalog.programs.len(),
            "Loaded catalog file"
        );
        Ok(catalog)
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn get_featured_offers(&self) -> Result<Vec<Offer>, CatalogError> {
        Ok(self.offers.clone())
    }

    async fn get_all_programs(&self) -> Result<Vec<BenefitProgram>, CatalogError> {
        Ok(self
            .programs
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn get_user_programs(&self, user_id: &str) -> Result<Vec<UserProgram>, CatalogError> {
        Ok(self
            .user_programs
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Analytics sink that only emits a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAnalytics;

#[async_trait]
impl AnalyticsSink for LogAnalytics {
    async fn log_search(
        &self,
        user_id: Option<&str>,
        query: &str,
        result_count: usize,
    ) -> Result<(), AnalyticsError> {
        tracing::info!(user_id = ?user_id, query, result_count, "search");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "offers": [
            {"id": "1", "title": "Groceries", "program_name": "Livelo", "institution_brand": "Bradesco", "cashback_percentage": 2},
            {"id": "", "title": "No id", "program_name": "Livelo", "institution_brand": "Bradesco"},
            {"id": "3", "title": "Nike", "merchant_name": "Nike", "program_name": "Esfera", "institution_brand": "Santander", "valid_until": "2030-01-01"}
        ],
        "programs": [
            {"id": "p1", "name": "Livelo"},
            {"id": "p2", "name": "Retired", "is_active": false}
        ],
        "user_programs": [
            {"id": "u1", "user_id": "user-123", "program_id": "p1"},
            {"id": "u2", "user_id": "someone-else", "program_id": "p1"}
        ]
    }"#;

    #[tokio::test]
    async fn test_file_catalog_validates_offers() {
        let catalog = FileCatalog::from_json(CATALOG).unwrap();
        let offers = catalog.get_featured_offers().await.unwrap();
        let ids: Vec<_> = offers.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_file_catalog_programs() {
        let catalog = FileCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.get_all_programs().await.unwrap().len(), 1);

        let mine = catalog.get_user_programs("user-123").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "u1");
    }

    #[tokio::test]
    async fn test_mistyped_rows_do_not_empty_the_catalog() {
        let json = r#"{
            "offers": [
                {"id": "1", "title": "Groceries", "program_name": "Livelo", "institution_brand": "Bradesco"},
                {"id": 2, "title": "Numeric id", "program_name": "Livelo", "institution_brand": "Bradesco"},
                {"id": "3", "title": "Text priority", "program_name": "Livelo", "institution_brand": "Bradesco", "priority_score": "80"},
                {"id": "4", "title": "Nike", "program_name": "Esfera", "institution_brand": "Santander"}
            ]
        }"#;
        let catalog = FileCatalog::from_json(json).unwrap();
        let offers = catalog.get_featured_offers().await.unwrap();
        let ids: Vec<_> = offers.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            FileCatalog::from_json("[1, 2"),
            Err(CatalogError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_connection_error() {
        assert!(matches!(
            FileCatalog::load("/nonexistent/catalog.json"),
            Err(CatalogError::Connection(_))
        ));
    }
}
