//! External collaborators: catalog, analytics and advisory generation.
//!
//! Provides the `CatalogSource`, `AnalyticsSink` and `AdvisoryGenerator`
//! traits plus their implementations:
//! - `PostgrestBackend`: Supabase-style REST store (catalog + search logs)
//! - `OpenAiGenerator`: chat-completions advisory generator
//! - `FileCatalog` / `LogAnalytics`: offline stand-ins
//!
//! The matching and parsing logic never talks to these directly; the service
//! layer owns them and hands plain data to the core.

mod file;
mod openai;
mod postgrest;

pub use file::{CatalogFile, FileCatalog, LogAnalytics};
pub use openai::{OpenAiConfig, OpenAiGenerator};
pub use postgrest::{PostgrestBackend, PostgrestConfig};

use async_trait::async_trait;
use perkfinder_model::{BenefitProgram, Offer, RawOfferRow, UserProgram};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from catalog reads.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Catalog not available")]
    Unavailable,
}

/// Errors from analytics writes. Callers swallow these.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Insert rejected: {0}")]
    Rejected(String),
}

/// Errors from the advisory generator, surfaced to the caller as-is.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generator API key is not configured")]
    MissingApiKey,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed generator response: {0}")]
    Decode(String),

    #[error("Generator returned no content")]
    EmptyResponse,
}

/// One advisory request. Knobs are forwarded to the provider untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Read-only access to offers and programs.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Featured offers, pre-sorted by priority score descending.
    async fn get_featured_offers(&self) -> Result<Vec<Offer>, CatalogError>;

    async fn get_all_programs(&self) -> Result<Vec<BenefitProgram>, CatalogError>;

    async fn get_user_programs(&self, user_id: &str) -> Result<Vec<UserProgram>, CatalogError>;

    /// Get the source name for logging.
    fn name(&self) -> &'static str;
}

/// Search event sink.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn log_search(
        &self,
        user_id: Option<&str>,
        query: &str,
        result_count: usize,
    ) -> Result<(), AnalyticsError>;
}

/// Text generation service producing advisory text.
#[async_trait]
pub trait AdvisoryGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    fn name(&self) -> &'static str;
}

/// Validate raw rows into offers, keeping row order and dropping invalid rows.
pub fn offers_from_rows(rows: Vec<RawOfferRow>) -> Vec<Offer> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, row)| validate_row(i, row))
        .collect()
}

/// Decode and validate untyped rows one by one.
///
/// A row whose fields have the wrong JSON type is skipped like any other
/// invalid row instead of failing the whole payload.
pub fn offers_from_values(values: Vec<serde_json::Value>) -> Vec<Offer> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let row = serde_json::from_value::<RawOfferRow>(value)
                .map_err(|e| tracing::warn!(row = i, error = %e, "Skipping malformed offer row"))
                .ok()?;
            validate_row(i, row)
        })
        .collect()
}

fn validate_row(i: usize, row: RawOfferRow) -> Option<Offer> {
    let id = row.id.clone().unwrap_or_default();
    match Offer::try_from(row) {
        Ok(offer) => Some(offer),
        Err(e) => {
            tracing::warn!(row = i, id = %id, error = %e, "Skipping invalid offer row");
            None
        }
    }
}
