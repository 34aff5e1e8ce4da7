//! Offer matching and ranking.
//!
//! Filters a catalog against a query and tags each hit for display. The
//! catalog's own priority order is trusted: the matcher never re-sorts.

use chrono::NaiveDate;
use perkfinder_features::{classify_expiry, format_benefit};
use perkfinder_model::{MatchResult, Offer, OfferHit};
use perkfinder_query::Query;

/// Configuration for the matcher.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// How many catalog offers to return when nothing matches
    pub fallback_limit: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { fallback_limit: 3 }
    }
}

/// Match `query` against `catalog` and return tagged hits.
///
/// Offers matching on any searchable field are kept in catalog order. If none
/// match, the first `fallback_limit` catalog offers are returned instead so
/// the user always has something to look at. The first hit is the best offer.
pub fn search(
    query: &Query,
    catalog: Vec<Offer>,
    today: NaiveDate,
    config: &MatchConfig,
) -> MatchResult {
    let (matched, rest): (Vec<Offer>, Vec<Offer>) =
        catalog.into_iter().partition(|offer| query.matches(offer));

    let fallback = matched.is_empty();
    let selected = if fallback {
        rest.into_iter().take(config.fallback_limit).collect()
    } else {
        matched
    };

    MatchResult {
        hits: tag_hits(selected, today),
        fallback,
    }
}

/// Head of the catalog with no filtering, capped like the fallback path.
///
/// Used by callers that treat an empty query as "no search yet".
pub fn featured(catalog: Vec<Offer>, today: NaiveDate, config: &MatchConfig) -> MatchResult {
    let selected = catalog.into_iter().take(config.fallback_limit).collect();
    MatchResult {
        hits: tag_hits(selected, today),
        fallback: true,
    }
}

fn tag_hits(offers: Vec<Offer>, today: NaiveDate) -> Vec<OfferHit> {
    offers
        .into_iter()
        .enumerate()
        .map(|(i, offer)| OfferHit {
            benefit: format_benefit(&offer),
            expiry: classify_expiry(offer.valid_until, today),
            is_best_offer: i == 0,
            offer,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use perkfinder_model::{BenefitKind, ExpiryBucket};
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    fn make_offer(id: &str, title: &str, merchant: Option<&str>) -> Offer {
        let offer = Offer::new(id, title, "Livelo", "Bradesco");
        match merchant {
            Some(m) => offer.with_merchant(m),
            None => offer,
        }
    }

    fn catalog() -> Vec<Offer> {
        vec![
            make_offer("1", "Groceries boost", Some("Pao de Acucar")).with_cashback(3.0),
            make_offer("2", "Fuel Fridays", Some("Shell")).with_discount(5.0),
            make_offer("3", "Sneaker week", Some("Nike Store")).with_points(4.0),
            make_offer("4", "Burger night", Some("McDonald's")),
            make_offer("5", "Pharmacy", None),
        ]
    }

    fn ids(result: &MatchResult) -> Vec<&str> {
        result.hits.iter().map(|h| h.offer.id.as_str()).collect()
    }

    #[test]
    fn test_single_merchant_match() {
        let result = search(&Query::new("nike"), catalog(), today(), &MatchConfig::default());

        assert_eq!(ids(&result), vec!["3"]);
        assert!(result.hits[0].is_best_offer);
        assert!(!result.fallback);
        assert_eq!(result.hits[0].benefit.kind, BenefitKind::Points);
    }

    #[test]
    fn test_matches_keep_catalog_order() {
        // Every offer shares the institution.
        let result = search(&Query::new("bradesco"), catalog(), today(), &MatchConfig::default());
        assert_eq!(ids(&result), vec!["1", "2", "3", "4", "5"]);

        let best: Vec<bool> = result.hits.iter().map(|h| h.is_best_offer).collect();
        assert_eq!(best, vec![true, false, false, false, false]);
    }

    #[test]
    fn test_fallback_returns_catalog_head() {
        let result = search(&Query::new("airline"), catalog(), today(), &MatchConfig::default());

        assert!(result.fallback);
        assert_eq!(ids(&result), vec!["1", "2", "3"]);
        assert!(result.hits[0].is_best_offer);
    }

    #[test]
    fn test_fallback_on_short_catalog() {
        let short = catalog().into_iter().take(2).collect();
        let result = search(&Query::new("airline"), short, today(), &MatchConfig::default());
        assert_eq!(ids(&result), vec!["1", "2"]);
    }

    #[test]
    fn test_empty_catalog_is_empty_result() {
        let result = search(&Query::new("nike"), Vec::new(), today(), &MatchConfig::default());
        assert!(result.is_empty());
        assert!(result.best().is_none());
    }

    #[test]
    fn test_empty_query_returns_whole_catalog() {
        let result = search(&Query::new("  "), catalog(), today(), &MatchConfig::default());
        assert_eq!(result.len(), 5);
        assert!(!result.fallback);
    }

    #[test]
    fn test_featured_caps_catalog() {
        let config = MatchConfig { fallback_limit: 2 };
        let result = featured(catalog(), today(), &config);
        assert_eq!(ids(&result), vec!["1", "2"]);
    }

    #[test]
    fn test_hits_carry_expiry() {
        let offers = vec![make_offer("9", "Last call", Some("Nike"))
            .with_valid_until(today())];
        let result = search(&Query::new("nike"), offers, today(), &MatchConfig::default());
        assert_eq!(result.hits[0].expiry, ExpiryBucket::ExpiresToday);
    }

    #[test]
    fn test_membership_matches_predicate() {
        let query = Query::new("s");
        let offers = catalog();
        let expected: Vec<&str> = offers
            .iter()
            .filter(|o| query.matches(o))
            .map(|o| o.id.as_str())
            .collect();

        let result = search(&query, offers.clone(), today(), &MatchConfig::default());
        assert_eq!(ids(&result), expected);
    }
}
