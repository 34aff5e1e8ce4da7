//! Core domain model for PerkFinder benefit discovery.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `Offer`: a benefit opportunity attached to a loyalty/cashback program
//! - `BenefitTag`: the single display tag projected from an offer
//! - `ExpiryBucket`: urgency class of an offer's expiry date
//! - `OfferHit` / `MatchResult`: ranked search output
//! - `InsightRecord`: segmented advisory text
//!
//! Loosely typed rows from the data store enter through [`RawOfferRow`] and
//! are validated into `Offer` before anything else sees them.

mod profile;
mod program;
mod raw;

pub use profile::{
    CardSummary, CategorySpend, ExpiringBenefit, InsightRecord, RecentTransaction, UserProfile,
};
pub use program::{available_programs, BenefitProgram, Institution, InstitutionKind, UserProgram};
pub use raw::{parse_calendar_date, RawOfferRow, ValidationError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Declared type of an offer, as stored by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Cashback,
    Points,
    Discount,
    Bonus,
    /// Anything the store reports that we do not know about
    Other,
}

impl Default for OfferType {
    fn default() -> Self {
        Self::Other
    }
}

impl From<&str> for OfferType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cashback" => Self::Cashback,
            "points" => Self::Points,
            "discount" => Self::Discount,
            "bonus" => Self::Bonus,
            _ => Self::Other,
        }
    }
}

/// A single benefit opportunity.
///
/// Offers are read-only once built; catalogs arrive pre-sorted by
/// `priority_score` descending and that order is trusted downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Opaque identifier, unique within a catalog snapshot
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,

    pub program_name: String,

    pub institution_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashback_percentage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_multiplier: Option<f64>,

    /// Last valid calendar day; `None` means the offer never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,

    #[serde(default)]
    pub priority_score: u32,

    #[serde(default)]
    pub offer_type: OfferType,
}

impl Offer {
    /// Create a minimal offer with no benefit fields set.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        program_name: impl Into<String>,
        institution_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            merchant_name: None,
            program_name: program_name.into(),
            institution_name: institution_name.into(),
            category_name: None,
            cashback_percentage: None,
            discount_percentage: None,
            points_multiplier: None,
            valid_until: None,
            priority_score: 0,
            offer_type: OfferType::Other,
        }
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant_name = Some(merchant.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_name = Some(category.into());
        self
    }

    pub fn with_cashback(mut self, pct: f64) -> Self {
        self.cashback_percentage = Some(pct);
        self
    }

    pub fn with_discount(mut self, pct: f64) -> Self {
        self.discount_percentage = Some(pct);
        self
    }

    pub fn with_points(mut self, multiplier: f64) -> Self {
        self.points_multiplier = Some(multiplier);
        self
    }

    pub fn with_valid_until(mut self, date: NaiveDate) -> Self {
        self.valid_until = Some(date);
        self
    }

    pub fn with_priority(mut self, score: u32) -> Self {
        self.priority_score = score;
        self
    }

    /// Fields a query is matched against: title, merchant, program,
    /// institution and category (when present). The description is not searched.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.title.as_str()),
            self.merchant_name.as_deref(),
            Some(self.program_name.as_str()),
            Some(self.institution_name.as_str()),
            self.category_name.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// Which benefit field a tag was projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenefitKind {
    Cashback,
    Discount,
    Points,
    Generic,
}

impl BenefitKind {
    /// Get a human-readable label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cashback => "Cashback",
            Self::Discount => "Discount",
            Self::Points => "Points",
            Self::Generic => "Benefit",
        }
    }
}

/// Exactly one display tag per offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitTag {
    pub label: String,
    pub kind: BenefitKind,
    /// Benefit value; always 0 for `Generic`
    pub magnitude: f64,
}

/// Urgency class of an offer's expiry date relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "bucket", rename_all = "snake_case")]
pub enum ExpiryBucket {
    /// No expiry date
    None,
    Expired,
    ExpiresToday,
    ExpiresTomorrow,
    /// Two to seven days left
    ExpiresSoon { days: i64 },
    /// More than a week left
    Normal { date: NaiveDate },
}

impl ExpiryBucket {
    /// True for buckets a user should act on soon (today through a week out).
    pub fn is_urgent(&self) -> bool {
        matches!(
            self,
            Self::ExpiresToday | Self::ExpiresTomorrow | Self::ExpiresSoon { .. }
        )
    }
}

/// A single ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferHit {
    pub offer: Offer,

    /// Only the first hit of a result is the best offer
    pub is_best_offer: bool,

    pub benefit: BenefitTag,

    pub expiry: ExpiryBucket,
}

/// Output of matching a query against a catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub hits: Vec<OfferHit>,

    /// True when no offer matched and the head of the catalog was returned
    #[serde(default)]
    pub fallback: bool,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// The hit flagged as best offer, if any.
    pub fn best(&self) -> Option<&OfferHit> {
        self.hits.first().filter(|h| h.is_best_offer)
    }
}
