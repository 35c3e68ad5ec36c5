//! Moneycontrol markets page scraper.
//!
//! Pulls the headline list from the markets news section. The page renders
//! each story as an `li.clearfix` item; the item text (title plus teaser) is
//! used as the headline.

use super::ContextSource;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::models::MarketContext;
use chrono::Local;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

/// Maximum number of list items considered per page.
pub const MAX_HEADLINES: usize = 10;

/// Scraper bound to one source URL and selector.
#[derive(Debug)]
pub struct MoneycontrolScraper {
    client: Client,
    config: SourceConfig,
}

impl MoneycontrolScraper {
    /// Build a scraper whose HTTP client carries the configured
    /// `User-Agent` and request timeout.
    pub fn new(config: SourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

impl ContextSource for MoneycontrolScraper {
    #[instrument(level = "info", skip_all, fields(url = %self.config.url))]
    async fn fetch_context(&self) -> Result<MarketContext, FetchError> {
        let response = self.client.get(self.config.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "News source returned an error status");
            return Err(FetchError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        debug!(bytes = html.len(), "Fetched news page");

        let headlines = parse_headlines(&html, &self.config.headline_selector, MAX_HEADLINES)?;
        if headlines.is_empty() {
            warn!(selector = %self.config.headline_selector, "No headlines matched");
            return Err(FetchError::NoHeadlines);
        }

        info!(count = headlines.len(), "Scraped market headlines");
        debug!(?headlines, "Headlines");
        Ok(MarketContext::new(Local::now(), headlines))
    }
}

/// Extract headline text from `html`.
///
/// Only the first `limit` elements matching `selector` are considered. Each
/// element's text has its whitespace collapsed; elements that end up empty
/// are dropped, so fewer than `limit` headlines may be returned.
pub fn parse_headlines(html: &str, selector: &str, limit: usize) -> Result<Vec<String>, FetchError> {
    let selector =
        Selector::parse(selector).map_err(|_| FetchError::Selector(selector.to_string()))?;
    let document = Html::parse_document(html);

    let headlines = document
        .select(&selector)
        .take(limit)
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect();

    Ok(headlines)
}
