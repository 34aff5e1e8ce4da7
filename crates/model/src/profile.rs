use serde::{Deserialize, Serialize};

/// Spending and rewards snapshot sent by the client when asking for advice.
///
/// Field names follow the camelCase wire format of the insights endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub cards: Vec<CardSummary>,
    #[serde(default)]
    pub total_points: f64,
    #[serde(default)]
    pub total_cashback: f64,
    #[serde(default)]
    pub monthly_spending: f64,
    #[serde(default)]
    pub categories: Vec<CategorySpend>,
    #[serde(default)]
    pub recent_transactions: Vec<RecentTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSummary {
    pub name: String,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub cashback: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expiring_benefits: Vec<ExpiringBenefit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringBenefit {
    pub name: String,
    /// Free-form date string as entered by the client
    pub expiry_date: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentTransaction {
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: String,
}

/// Advisory text segmented into the four display categories.
///
/// `raw` always holds the generator output exactly as received, so callers
/// can render it when no section was recognized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub opportunities: String,
    pub alerts: String,
    pub recommendations: String,
    pub tips: String,
    pub raw: String,
}

impl InsightRecord {
    /// Record with no recognized sections.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Default::default()
        }
    }

    /// True when none of the four sections was found.
    pub fn is_unstructured(&self) -> bool {
        self.sections().iter().all(|(_, text)| text.is_empty())
    }

    /// Sections in display order, paired with their headings.
    pub fn sections(&self) -> [(&'static str, &str); 4] {
        [
            ("Opportunities", self.opportunities.as_str()),
            ("Alerts", self.alerts.as_str()),
            ("Recommendations", self.recommendations.as_str()),
            ("Tips", self.tips.as_str()),
        ]
    }
}
