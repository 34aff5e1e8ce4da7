//! Query normalization and offer matching predicate.
//!
//! A query is free text compared case-insensitively against an offer's
//! searchable fields; surrounding whitespace is not significant.

use perkfinder_model::Offer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Empty query text")]
    EmptyQuery,
}

/// A normalized (trimmed, lowercased) search query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Query {
    normalized: String,
}

impl Query {
    /// Normalize any text. An empty query matches every offer.
    pub fn new(text: &str) -> Self {
        Self {
            normalized: text.trim().to_lowercase(),
        }
    }

    /// Normalize and reject text that is blank after trimming.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let query = Self::new(text);
        if query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        Ok(query)
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// True if the query is a substring of any searchable field of `offer`.
    pub fn matches(&self, offer: &Offer) -> bool {
        offer
            .searchable_fields()
            .any(|field| field.to_lowercase().contains(&self.normalized))
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<Query> for String {
    fn from(q: Query) -> Self {
        q.normalized
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}
