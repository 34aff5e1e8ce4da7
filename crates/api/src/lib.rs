//! HTTP boundary.
//!
//! Routes:
//! - `GET /health`
//! - `GET /api/search?q=&user_id=`
//! - `GET /api/programs?user_id=&available=`
//! - `POST /api/ai-insights` (body: camelCase user profile)

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, SecondsFormat, Utc};
use perkfinder_explain::{describe_hit, summarize_result, HitCard};
use perkfinder_backend::{CatalogError, CatalogSource};
use perkfinder_model::{available_programs, BenefitProgram, InsightRecord, OfferHit, UserProfile};
use perkfinder_service::{InsightService, SearchService};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    search: Arc<SearchService>,
    insights: Arc<InsightService>,
    today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(search: SearchService, insights: InsightService) -> Self {
        Self {
            search: Arc::new(search),
            insights: Arc::new(insights),
            today: None,
        }
    }

    /// Pin the calendar day used for expiry classification.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/search", get(search))
        .route("/api/programs", get(programs))
        .route("/api/ai-insights", post(ai_insights))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Serialize)]
struct SearchResult {
    #[serde(flatten)]
    hit: OfferHit,
    card: HitCard,
}

#[derive(Serialize)]
struct SearchResp {
    query: String,
    fallback: bool,
    summary: String,
    results: Vec<SearchResult>,
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResp> {
    let result = state
        .search
        .search(params.user_id, &params.q, state.today())
        .await;

    let summary = summarize_result(&result, params.q.trim());
    let fallback = result.fallback;
    let results = result
        .hits
        .into_iter()
        .map(|hit| SearchResult {
            card: describe_hit(&hit),
            hit,
        })
        .collect();

    Json(SearchResp {
        query: params.q,
        fallback,
        summary,
        results,
    })
}

#[derive(Deserialize)]
struct ProgramParams {
    #[serde(default)]
    user_id: Option<String>,
    /// With `user_id`: active programs the user has not enrolled in
    #[serde(default)]
    available: bool,
}

#[derive(Serialize)]
struct ErrorResp {
    success: bool,
    error: String,
    details: String,
}

impl ErrorResp {
    fn new(error: &str, details: impl ToString) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            details: details.to_string(),
        }
    }

    fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

async fn programs(State(state): State<AppState>, Query(params): Query<ProgramParams>) -> Response {
    let catalog = state.search.catalog();
    let result = match (params.user_id.as_deref(), params.available) {
        (Some(user_id), true) => available_for(catalog.as_ref(), user_id)
            .await
            .map(|p| Json(p).into_response()),
        (Some(user_id), false) => catalog
            .get_user_programs(user_id)
            .await
            .map(|p| Json(p).into_response()),
        (None, _) => catalog
            .get_all_programs()
            .await
            .map(|p| Json(p).into_response()),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load programs");
        ErrorResp::new("Failed to load programs", e).with_status(StatusCode::SERVICE_UNAVAILABLE)
    })
}

async fn available_for(
    catalog: &dyn CatalogSource,
    user_id: &str,
) -> Result<Vec<BenefitProgram>, CatalogError> {
    let all = catalog.get_all_programs().await?;
    let enrolled = catalog.get_user_programs(user_id).await?;
    Ok(available_programs(all, &enrolled))
}

#[derive(Serialize)]
struct InsightsResp {
    success: bool,
    insights: InsightRecord,
    timestamp: String,
}

async fn ai_insights(State(state): State<AppState>, Json(profile): Json<UserProfile>) -> Response {
    match state.insights.generate(&profile).await {
        Ok(insights) => Json(InsightsResp {
            success: true,
            insights,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Insight generation failed");
            ErrorResp::new("Failed to generate insights", e).with_status(StatusCode::BAD_GATEWAY)
        }
    }
}
