//! Prompt templating for the advisory generator.

use perkfinder_model::UserProfile;
use serde::{Deserialize, Serialize};

/// System message sent with every advisory request.
pub const SYSTEM_INSTRUCTION: &str = "You are an assistant specialized in optimizing credit card \
benefits and loyalty programs. Your answers must be practical, specific and focused on saving money.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Currency symbol printed before amounts
    pub currency: String,
    /// Language the advice should be written in
    pub language: String,
    /// How many recent transactions to include
    pub max_transactions: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            currency: "R$".to_string(),
            language: "Brazilian Portuguese".to_string(),
            max_transactions: 5,
        }
    }
}

/// Render a user profile into the advisory prompt.
///
/// The numbered request list at the end is what the parser segments on, so
/// its order must stay opportunities, alerts, recommendations, tips.
pub fn build_prompt(profile: &UserProfile, config: &PromptConfig) -> String {
    let cur = &config.currency;
    let mut out = String::new();

    out.push_str(&format!(
        "You are an expert in credit cards and benefit programs. Analyze the user's data and \
         give valuable insights in {}.\n\n",
        config.language
    ));

    out.push_str("User data:\n");
    out.push_str(&format!("- Total points: {}\n", profile.total_points));
    out.push_str(&format!("- Total cashback: {} {:.2}\n", cur, profile.total_cashback));
    out.push_str(&format!("- Monthly spending: {} {:.2}\n", cur, profile.monthly_spending));

    out.push_str("\nCards:\n");
    for card in &profile.cards {
        out.push_str(&format!(
            "- {}: {} points, {} {:.2} cashback\n",
            card.name, card.points, cur, card.cashback
        ));
        for benefit in &card.expiring_benefits {
            out.push_str(&format!(
                "  * expiring: {} ({}) on {}\n",
                benefit.name, benefit.value, benefit.expiry_date
            ));
        }
    }

    out.push_str("\nSpending categories:\n");
    for cat in &profile.categories {
        out.push_str(&format!(
            "- {}: {} {:.2} ({}%)\n",
            cat.name, cur, cat.amount, cat.percentage
        ));
    }

    out.push_str("\nRecent transactions:\n");
    for tx in profile.recent_transactions.iter().take(config.max_transactions) {
        out.push_str(&format!(
            "- {}: {} {:.2} on {}\n",
            tx.description, cur, tx.amount, tx.date
        ));
    }

    out.push_str(
        "\nPlease provide:\n\
         1. One specific, actionable savings opportunity\n\
         2. An alert about an expiring benefit (if any)\n\
         3. A smart recommendation based on the spending profile\n\
         4. A tip for getting more out of the benefits\n\n\
         Keep the answers concise and practical. Use real values when possible.\n",
    );

    out
}
