//! PostgREST (Supabase REST) catalog source and analytics sink.

use async_trait::async_trait;
use perkfinder_model::{BenefitProgram, Offer, UserProgram};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{offers_from_values, AnalyticsError, AnalyticsSink, CatalogError, CatalogSource};

/// PostgREST backend configuration.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project base URL; `/rest/v1` is appended
    pub base_url: String,
    /// Anonymous or service key, sent as `apikey` and bearer token
    pub api_key: String,
    /// View serving featured offers, pre-sorted by priority
    pub featured_view: String,
    /// Maximum featured offers to fetch
    pub featured_limit: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PostgrestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:54321".to_string(),
            api_key: String::new(),
            featured_view: "v_featured_offers".to_string(),
            featured_limit: 10,
            timeout_secs: 30,
        }
    }
}

/// PostgREST store.
pub struct PostgrestBackend {
    config: PostgrestConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SearchLogRow<'a> {
    user_id: Option<&'a str>,
    search_query: &'a str,
    results_count: usize,
}

impl PostgrestBackend {
    /// Create a new PostgREST backend.
    pub fn new(config: PostgrestConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    fn featured_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("select", "*".to_string()),
            ("limit", self.config.featured_limit.to_string()),
        ]
    }

    fn programs_params() -> Vec<(&'static str, String)> {
        vec![
            (
                "select",
                "*,institution:institutions(*),program_type:program_types(*)".to_string(),
            ),
            ("is_active", "eq.true".to_string()),
            ("order", "name".to_string()),
        ]
    }

    fn user_programs_params(user_id: &str) -> Vec<(&'static str, String)> {
        vec![
            (
                "select",
                "*,program:benefit_programs(*,institution:institutions(*),program_type:program_types(*))"
                    .to_string(),
            ),
            ("user_id", format!("eq.{}", user_id)),
            ("is_active", "eq.true".to_string()),
            ("order", "added_at.desc".to_string()),
        ]
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn select<T: DeserializeOwned + Send>(
        &self,
        table: &str,
        params: &[(&'static str, String)],
    ) -> Result<Vec<T>, CatalogError> {
        let url = self.table_url(table);
        tracing::debug!(url = %url, ?params, "Executing PostgREST select");

        let response = self
            .authorized(self.client.get(&url))
            .query(params)
            .send()
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::QueryFailed(format!("HTTP {}: {}", status, body)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        parse_rows(json)
    }

    /// Check if the REST endpoint answers.
    pub async fn health_check(&self) -> Result<(), CatalogError> {
        let response = self
            .authorized(self.client.get(self.table_url("")))
            .send()
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CatalogError::Unavailable)
        }
    }
}

/// Parse a PostgREST JSON array into typed rows.
fn parse_rows<T: DeserializeOwned>(json: serde_json::Value) -> Result<Vec<T>, CatalogError> {
    if !json.is_array() {
        return Err(CatalogError::ParseError("Expected a JSON array".to_string()));
    }
    serde_json::from_value(json).map_err(|e| CatalogError::ParseError(e.to_string()))
}

#[async_trait]
impl CatalogSource for PostgrestBackend {
    async fn get_featured_offers(&self) -> Result<Vec<Offer>, CatalogError> {
        let rows: Vec<serde_json::Value> = self
            .select(&self.config.featured_view, &self.featured_params())
            .await?;
        Ok(offers_from_values(rows))
    }

    async fn get_all_programs(&self) -> Result<Vec<BenefitProgram>, CatalogError> {
        self.select("benefit_programs", &Self::programs_params()).await
    }

    async fn get_user_programs(&self, user_id: &str) -> Result<Vec<UserProgram>, CatalogError> {
        self.select("user_programs", &Self::user_programs_params(user_id))
            .await
    }

    fn name(&self) -> &'static str {
        "postgrest"
    }
}

#[async_trait]
impl AnalyticsSink for PostgrestBackend {
    async fn log_search(
        &self,
        user_id: Option<&str>,
        query: &str,
        result_count: usize,
    ) -> Result<(), AnalyticsError> {
        let row = SearchLogRow {
            user_id,
            search_query: query,
            results_count: result_count,
        };

        let response = self
            .authorized(self.client.post(self.table_url("search_logs")))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| AnalyticsError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AnalyticsError::Rejected(format!("HTTP {}: {}", status, body)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn backend(base_url: &str) -> PostgrestBackend {
        PostgrestBackend::new(PostgrestConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_table_url() {
        let b = backend("https://abc.supabase.co/");
        assert_eq!(
            b.table_url("v_featured_offers"),
            "https://abc.supabase.co/rest/v1/v_featured_offers"
        );
    }

    #[test]
    fn test_featured_params() {
        let b = PostgrestBackend::new(PostgrestConfig {
            featured_limit: 25,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            b.featured_params(),
            vec![("select", "*".to_string()), ("limit", "25".to_string())]
        );
    }

    #[test]
    fn test_user_programs_filter() {
        let params = PostgrestBackend::user_programs_params("user-123");
        assert!(params.contains(&("user_id", "eq.user-123".to_string())));
        assert!(params.contains(&("order", "added_at.desc".to_string())));
    }

    #[test]
    fn test_parse_offer_rows() {
        let json = json!([
            {"id": "1", "title": "Fuel", "program_name": "Km de Vantagens", "institution_brand": "Ipiranga", "discount_percentage": 3},
            {"id": "2", "title": "Broken", "institution_brand": "Ipiranga"}
        ]);
        let rows: Vec<serde_json::Value> = parse_rows(json).unwrap();
        let offers = offers_from_values(rows);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].discount_percentage, Some(3.0));
    }

    #[test]
    fn test_one_mistyped_row_keeps_the_rest() {
        let json = json!([
            {"id": "1", "title": "Fuel", "program_name": "Km de Vantagens", "institution_brand": "Ipiranga"},
            {"id": "2", "title": "Bad priority", "program_name": "Esfera", "institution_brand": "Santander", "priority_score": 7.5},
            {"id": "3", "title": "Movies", "program_name": "Esfera", "institution_brand": "Santander"}
        ]);
        let rows: Vec<serde_json::Value> = parse_rows(json).unwrap();
        let ids: Vec<_> = offers_from_values(rows).into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_parse_rejects_error_object() {
        let json = json!({"code": "42P01", "message": "relation does not exist"});
        let result: Result<Vec<serde_json::Value>, _> = parse_rows(json);
        assert!(matches!(result, Err(CatalogError::ParseError(_))));
    }

    #[test]
    fn test_search_log_row_shape() {
        let row = SearchLogRow {
            user_id: None,
            search_query: "nike",
            results_count: 1,
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"user_id": null, "search_query": "nike", "results_count": 1})
        );
    }
}
