//! Display text for search results.
//!
//! Converts benefit tags and expiry buckets into the short strings and
//! emphasis levels shown next to each offer.

use perkfinder_model::{ExpiryBucket, MatchResult, OfferHit};
use serde::{Deserialize, Serialize};

/// Badge shown on the first hit of a result.
pub const BEST_OFFER_BADGE: &str = "Best option for you";

/// How loudly an expiry notice should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    Critical,
    Warning,
    Neutral,
}

/// Expiry notice for a single offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryNotice {
    pub text: String,
    pub emphasis: Emphasis,
}

/// Render an expiry bucket; `None` for offers without an expiry date.
pub fn expiry_notice(bucket: &ExpiryBucket) -> Option<ExpiryNotice> {
    let (text, emphasis) = match bucket {
        ExpiryBucket::None => return None,
        ExpiryBucket::Expired => ("Expired".to_string(), Emphasis::Critical),
        ExpiryBucket::ExpiresToday => ("Expires today".to_string(), Emphasis::Critical),
        ExpiryBucket::ExpiresTomorrow => ("Expires tomorrow".to_string(), Emphasis::Warning),
        ExpiryBucket::ExpiresSoon { days } => (format!("Expires in {} days", days), Emphasis::Warning),
        ExpiryBucket::Normal { date } => (date.format("%d/%m").to_string(), Emphasis::Neutral),
    };
    Some(ExpiryNotice { text, emphasis })
}

/// Display card for one hit.
#[derive(Debug, Clone, Serialize)]
pub struct HitCard {
    /// Offer title, with the merchant when there is one
    pub headline: String,

    /// "program · institution"
    pub source: String,

    pub benefit: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<ExpiryNotice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<&'static str>,
}

/// Build the display card for a hit.
pub fn describe_hit(hit: &OfferHit) -> HitCard {
    let offer = &hit.offer;
    let headline = match &offer.merchant_name {
        Some(merchant) => format!("{} ({})", offer.title, merchant),
        None => offer.title.clone(),
    };

    HitCard {
        headline,
        source: format!("{} · {}", offer.program_name, offer.institution_name),
        benefit: hit.benefit.label.clone(),
        expiry: expiry_notice(&hit.expiry),
        badge: hit.is_best_offer.then_some(BEST_OFFER_BADGE),
    }
}

/// One-line summary of a whole result.
pub fn summarize_result(result: &MatchResult, query_text: &str) -> String {
    let n = result.len();
    let noun = if n == 1 { "offer" } else { "offers" };

    if result.is_empty() {
        return "No offers available right now.".to_string();
    }
    if result.fallback {
        return format!(
            "Nothing matched '{}'. Showing {} featured {} instead.",
            query_text, n, noun
        );
    }
    format!("{} {} found for '{}'.", n, noun, query_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use perkfinder_model::{BenefitKind, BenefitTag, Offer};
    use pretty_assertions::assert_eq;

    fn hit(best: bool, expiry: ExpiryBucket) -> OfferHit {
        OfferHit {
            offer: Offer::new("1", "Sneaker week", "Livelo", "Bradesco").with_merchant("Nike"),
            is_best_offer: best,
            benefit: BenefitTag {
                label: "4x points".to_string(),
                kind: BenefitKind::Points,
                magnitude: 4.0,
            },
            expiry,
        }
    }

    #[test]
    fn test_expiry_texts() {
        let text = |b: ExpiryBucket| expiry_notice(&b).map(|n| n.text);
        assert_eq!(text(ExpiryBucket::None), None);
        assert_eq!(text(ExpiryBucket::Expired).as_deref(), Some("Expired"));
        assert_eq!(text(ExpiryBucket::ExpiresToday).as_deref(), Some("Expires today"));
        assert_eq!(text(ExpiryBucket::ExpiresTomorrow).as_deref(), Some("Expires tomorrow"));
        assert_eq!(
            text(ExpiryBucket::ExpiresSoon { days: 5 }).as_deref(),
            Some("Expires in 5 days")
        );
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(text(ExpiryBucket::Normal { date }).as_deref(), Some("09/03"));
    }

    #[test]
    fn test_expiry_emphasis() {
        assert_eq!(
            expiry_notice(&ExpiryBucket::ExpiresToday).unwrap().emphasis,
            Emphasis::Critical
        );
        assert_eq!(
            expiry_notice(&ExpiryBucket::ExpiresSoon { days: 3 }).unwrap().emphasis,
            Emphasis::Warning
        );
    }

    #[test]
    fn test_describe_best_hit() {
        let card = describe_hit(&hit(true, ExpiryBucket::None));
        assert_eq!(card.headline, "Sneaker week (Nike)");
        assert_eq!(card.source, "Livelo · Bradesco");
        assert_eq!(card.benefit, "4x points");
        assert_eq!(card.badge, Some(BEST_OFFER_BADGE));
        assert!(card.expiry.is_none());
    }

    #[test]
    fn test_describe_other_hit_has_no_badge() {
        let card = describe_hit(&hit(false, ExpiryBucket::Expired));
        assert_eq!(card.badge, None);
        assert_eq!(card.expiry.unwrap().text, "Expired");
    }

    #[test]
    fn test_summaries() {
        let one = MatchResult {
            hits: vec![hit(true, ExpiryBucket::None)],
            fallback: false,
        };
        assert_eq!(summarize_result(&one, "nike"), "1 offer found for 'nike'.");

        let fallback = MatchResult {
            hits: vec![hit(true, ExpiryBucket::None), hit(false, ExpiryBucket::None)],
            fallback: true,
        };
        assert_eq!(
            summarize_result(&fallback, "yacht"),
            "Nothing matched 'yacht'. Showing 2 featured offers instead."
        );

        assert_eq!(
            summarize_result(&MatchResult::default(), "x"),
            "No offers available right now."
        );
    }
}
