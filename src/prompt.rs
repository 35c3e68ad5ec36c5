//! Prompt text for the advisory post.
//!
//! The wording is fixed business content. Only the headline block changes
//! between runs.

use crate::models::MarketContext;

const THEMES: &[&str] = &[
    "Volatility/SIP/Long-term investing",
    "Profit booking/Portfolio rebalancing",
    "Debt/EMI/Asset allocation",
    "Inflation/Gold/Real estate",
    "Global diversification/Currency risk/Safe havens",
];

const REQUIREMENTS: &[&str] = &[
    "Hooks with a shocking stat or reality",
    "Tells an anonymized emotional client story",
    "Explains the chosen concept simply",
    "Provides 3 actionable tips",
    "Ends with a reflective question",
    "Uses 1–3 emojis",
    "Includes SEBI compliance language",
];

/// Build the single-turn instruction sent to the model.
pub fn advisory_prompt(context: &MarketContext) -> String {
    let headlines = context.headlines.join("\n");
    let themes = bullet_list(THEMES);
    let requirements = bullet_list(REQUIREMENTS);

    format!(
        "You are a SEBI-registered investment advisor with 20 years of experience, \
using NISM Series Investment Advisor Level 1 & 2 principles.

Your job is to create a LinkedIn post (max 280 words) based on the current Indian market \
sentiment. Use the following news headlines from the last 7–30 days to determine the most \
relevant financial concern for 30–50 year old corporate employees with families in India:

HEADLINES:
{headlines}

Based on these headlines, select ONE of the following themes:
{themes}

Create a LinkedIn post that:
{requirements}

Avoid jargon. Be relatable, professional, and compliance-aware.
"
    )
}

fn bullet_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(headlines: &[&str]) -> MarketContext {
        MarketContext {
            date: "2025-05-06".to_string(),
            headlines: headlines.iter().map(|h| h.to_string()).collect(),
        }
    }

    #[test]
    fn test_prompt_lists_headlines_in_order() {
        let prompt = advisory_prompt(&context(&["Markets fall 2%", "SIP inflows rise"]));
        assert!(prompt.contains("HEADLINES:\nMarkets fall 2%\nSIP inflows rise\n"));
    }

    #[test]
    fn test_prompt_includes_every_theme_and_requirement() {
        let prompt = advisory_prompt(&context(&["x"]));
        for theme in THEMES {
            assert!(prompt.contains(&format!("- {theme}")), "missing theme {theme}");
        }
        for requirement in REQUIREMENTS {
            assert!(prompt.contains(requirement), "missing requirement {requirement}");
        }
        assert!(prompt.contains("max 280 words"));
    }
}
