//! Composition layer.
//!
//! Wires the pure core (query, matcher, advisory parser) to the external
//! collaborators from `perkfinder-backend`. This is the only crate that
//! spawns tasks or holds shared state.

mod insights;

pub use insights::{GenerationParams, InsightService, InsightSlot, InsightState};

use std::sync::Arc;

use chrono::NaiveDate;
use perkfinder_backend::{AnalyticsSink, CatalogSource};
use perkfinder_matcher::MatchConfig;
use perkfinder_model::{MatchResult, Offer};
use perkfinder_query::Query;
use tokio::task::JoinHandle;

/// Offer search over a catalog source, reporting each search to analytics.
#[derive(Clone)]
pub struct SearchService {
    catalog: Arc<dyn CatalogSource>,
    analytics: Arc<dyn AnalyticsSink>,
    config: MatchConfig,
}

impl SearchService {
    pub fn new(catalog: Arc<dyn CatalogSource>, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            catalog,
            analytics,
            config: MatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogSource> {
        &self.catalog
    }

    /// Featured offers, or an empty catalog if the source failed.
    async fn load_catalog(&self) -> Vec<Offer> {
        match self.catalog.get_featured_offers().await {
            Ok(offers) => offers,
            Err(e) => {
                tracing::warn!(
                    source = self.catalog.name(),
                    error = %e,
                    "Catalog unavailable, searching an empty catalog"
                );
                Vec::new()
            }
        }
    }

    /// Search the featured catalog for `text`.
    ///
    /// A blank query returns the capped catalog head and is not reported.
    /// Otherwise the search is reported on a spawned task; reporting failures
    /// are logged and never affect the returned result.
    pub async fn search(&self, user_id: Option<String>, text: &str, today: NaiveDate) -> MatchResult {
        self.search_tracked(user_id, text, today).await.0
    }

    /// Like `search`, also returning the handle of the analytics task if one
    /// was spawned. Short-lived callers await it before exiting.
    pub async fn search_tracked(
        &self,
        user_id: Option<String>,
        text: &str,
        today: NaiveDate,
    ) -> (MatchResult, Option<JoinHandle<()>>) {
        let catalog = self.load_catalog().await;
        let query = Query::new(text);

        if query.is_empty() {
            return (perkfinder_matcher::featured(catalog, today, &self.config), None);
        }

        let result = perkfinder_matcher::search(&query, catalog, today, &self.config);
        tracing::debug!(
            query = %query,
            hits = result.len(),
            fallback = result.fallback,
            "Search complete"
        );

        // search_logs keeps the term as typed; matching uses the normalized form.
        let report = self.report(user_id, text.trim().to_string(), result.len());
        (result, Some(report))
    }

    fn report(&self, user_id: Option<String>, query: String, result_count: usize) -> JoinHandle<()> {
        let analytics = Arc::clone(&self.analytics);
        tokio::spawn(async move {
            if let Err(e) = analytics
                .log_search(user_id.as_deref(), &query, result_count)
                .await
            {
                tracing::warn!(error = %e, query = %query, "Failed to log search");
            }
        })
    }
}
