//! News source scrapers that produce a [`MarketContext`].
//!
//! A source is anything implementing [`ContextSource`]. The pipeline asks it
//! for context exactly once per run and halts if it fails.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Moneycontrol markets | [`moneycontrol`] | HTML scraping | `li.clearfix` list items, first ten |

use crate::error::FetchError;
use crate::models::MarketContext;

pub mod moneycontrol;

/// A single-shot provider of market headlines.
pub trait ContextSource {
    /// Fetch the current headlines. No retries are attempted here.
    async fn fetch_context(&self) -> Result<MarketContext, FetchError>;
}
