//! Per-offer features used for presentation and ranking output.
//!
//! Provides pure functions over a single offer:
//! - Benefit tag projection (cashback > discount > points > generic)
//! - Expiry urgency classification on calendar-day granularity

use chrono::{DateTime, NaiveDate, TimeZone};
use perkfinder_model::{BenefitKind, BenefitTag, ExpiryBucket, Offer};

/// Days left up to which an offer counts as expiring soon.
pub const SOON_WINDOW_DAYS: i64 = 7;

/// Project an offer's benefit fields into exactly one display tag.
///
/// When several fields are set the fixed priority decides, never the
/// magnitudes. A field set to zero counts as absent.
pub fn format_benefit(offer: &Offer) -> BenefitTag {
    if let Some(pct) = positive(offer.cashback_percentage) {
        return BenefitTag {
            label: format!("{}% cashback", pct),
            kind: BenefitKind::Cashback,
            magnitude: pct,
        };
    }
    if let Some(pct) = positive(offer.discount_percentage) {
        return BenefitTag {
            label: format!("{}% discount", pct),
            kind: BenefitKind::Discount,
            magnitude: pct,
        };
    }
    if let Some(mult) = positive(offer.points_multiplier) {
        return BenefitTag {
            label: format!("{}x points", mult),
            kind: BenefitKind::Points,
            magnitude: mult,
        };
    }
    BenefitTag {
        label: "special benefit".to_string(),
        kind: BenefitKind::Generic,
        magnitude: 0.0,
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// Bucket an optional expiry date relative to `today`.
///
/// Both sides are calendar dates, so the day difference is exact.
pub fn classify_expiry(valid_until: Option<NaiveDate>, today: NaiveDate) -> ExpiryBucket {
    let Some(date) = valid_until else {
        return ExpiryBucket::None;
    };

    match (date - today).num_days() {
        d if d < 0 => ExpiryBucket::Expired,
        0 => ExpiryBucket::ExpiresToday,
        1 => ExpiryBucket::ExpiresTomorrow,
        d if d <= SOON_WINDOW_DAYS => ExpiryBucket::ExpiresSoon { days: d },
        _ => ExpiryBucket::Normal { date },
    }
}

/// Same as [`classify_expiry`], truncating a wall-clock instant to its local day first.
pub fn classify_expiry_at<Tz: TimeZone>(
    valid_until: Option<NaiveDate>,
    now: &DateTime<Tz>,
) -> ExpiryBucket {
    classify_expiry(valid_until, now.date_naive())
}
