//! Validating boundary between loosely typed store rows and [`Offer`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Offer, OfferType};

/// Reasons a raw row is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Negative value for {field}: {value}")]
    NegativeValue { field: &'static str, value: f64 },

    #[error("Invalid priority score: {0}")]
    InvalidPriority(i64),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// An offer row as served by the featured-offers view.
///
/// Every field is optional here; [`Offer::try_from`] decides what is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOfferRow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "offer_title")]
    pub title: Option<String>,
    #[serde(default, alias = "offer_description")]
    pub description: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub program_name: Option<String>,
    #[serde(default, alias = "institution_name")]
    pub institution_brand: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub cashback_percentage: Option<f64>,
    #[serde(default)]
    pub points_multiplier: Option<f64>,
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default)]
    pub priority_score: Option<i64>,
    #[serde(default)]
    pub offer_type: Option<String>,
}

impl TryFrom<RawOfferRow> for Offer {
    type Error = ValidationError;

    fn try_from(row: RawOfferRow) -> Result<Self, Self::Error> {
        let id = required(row.id, "id")?;
        let title = required(row.title, "title")?;
        let program_name = required(row.program_name, "program_name")?;
        let institution_name = required(row.institution_brand, "institution_brand")?;

        let priority_score = match row.priority_score {
            None => 0,
            Some(p) => u32::try_from(p).map_err(|_| ValidationError::InvalidPriority(p))?,
        };

        let valid_until = row
            .valid_until
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_calendar_date)
            .transpose()?;

        Ok(Offer {
            id,
            title,
            description: optional(row.description),
            merchant_name: optional(row.merchant_name),
            program_name,
            institution_name,
            category_name: optional(row.category_name),
            cashback_percentage: non_negative(row.cashback_percentage, "cashback_percentage")?,
            discount_percentage: non_negative(row.discount_percentage, "discount_percentage")?,
            points_multiplier: non_negative(row.points_multiplier, "points_multiplier")?,
            valid_until,
            priority_score,
            offer_type: row
                .offer_type
                .as_deref()
                .map(OfferType::from)
                .unwrap_or_default(),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    optional(value).ok_or(ValidationError::MissingField(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn non_negative(value: Option<f64>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if v < 0.0 || v.is_nan() => Err(ValidationError::NegativeValue { field, value: v }),
        other => Ok(other),
    }
}

/// Parse a store date and drop any time-of-day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`
/// timestamps (the formats PostgREST emits for `date`, `timestamptz` and
/// `timestamp` columns).
pub fn parse_calendar_date(s: &str) -> Result<NaiveDate, ValidationError> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.date());
    }
    Err(ValidationError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row() -> RawOfferRow {
        RawOfferRow {
            id: Some("o-1".into()),
            title: Some("10% off sneakers".into()),
            program_name: Some("Esfera".into()),
            institution_brand: Some("Santander".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_row_converts() {
        let offer = Offer::try_from(row()).unwrap();
        assert_eq!(offer.id, "o-1");
        assert_eq!(offer.priority_score, 0);
        assert_eq!(offer.valid_until, None);
        assert_eq!(offer.offer_type, OfferType::Other);
    }

    #[test]
    fn test_row_from_view_json() {
        let json = r#"{
            "id": "o-9",
            "title": "Nike week",
            "description": null,
            "merchant_name": "Nike",
            "program_name": "Livelo",
            "institution_brand": "Bradesco",
            "category_name": "Sports",
            "cashback_percentage": null,
            "points_multiplier": 4,
            "discount_percentage": null,
            "valid_until": "2025-08-31T23:59:59+00:00",
            "priority_score": 80,
            "offer_type": "points"
        }"#;
        let raw: RawOfferRow = serde_json::from_str(json).unwrap();
        let offer = Offer::try_from(raw).unwrap();

        assert_eq!(offer.merchant_name.as_deref(), Some("Nike"));
        assert_eq!(offer.points_multiplier, Some(4.0));
        assert_eq!(offer.valid_until, NaiveDate::from_ymd_opt(2025, 8, 31));
        assert_eq!(offer.priority_score, 80);
        assert_eq!(offer.offer_type, OfferType::Points);
    }

    #[test]
    fn test_missing_program_rejected() {
        let raw = RawOfferRow {
            program_name: Some("   ".into()),
            ..row()
        };
        assert_eq!(
            Offer::try_from(raw),
            Err(ValidationError::MissingField("program_name"))
        );
    }

    #[test]
    fn test_negative_benefit_rejected() {
        let raw = RawOfferRow {
            cashback_percentage: Some(-2.0),
            ..row()
        };
        assert!(matches!(
            Offer::try_from(raw),
            Err(ValidationError::NegativeValue { field: "cashback_percentage", .. })
        ));
    }

    #[test]
    fn test_negative_priority_rejected() {
        let raw = RawOfferRow {
            priority_score: Some(-1),
            ..row()
        };
        assert_eq!(Offer::try_from(raw), Err(ValidationError::InvalidPriority(-1)));
    }

    #[test]
    fn test_bad_date_rejected() {
        let raw = RawOfferRow {
            valid_until: Some("next friday".into()),
            ..row()
        };
        assert!(matches!(Offer::try_from(raw), Err(ValidationError::InvalidDate(_))));
    }

    #[test]
    fn test_calendar_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(parse_calendar_date("2025-01-15").unwrap(), expected);
        assert_eq!(parse_calendar_date("2025-01-15T08:30:00Z").unwrap(), expected);
        assert_eq!(parse_calendar_date("2025-01-15T08:30:00.123").unwrap(), expected);
    }
}
