mod fixture;
mod http;
mod models;

pub use fixture::FixtureMarketData;
pub use http::HttpMarketData;
pub use models::{PricePoint, Quote, RiskLevel, Strategy};

use anyhow::Result;

/// Source of current quotes and daily price history.
///
/// Unknown symbols are not errors: `quote` yields `None` and `history`
/// yields an empty series. `Err` means the source itself failed (transport,
/// malformed payload).
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>>;

    /// Daily points reaching `days` back from today, ordered oldest to
    /// newest, at most `days + 1` entries.
    async fn history(&self, symbol: &str, days: u32) -> Result<Vec<PricePoint>>;

    async fn quotes(&self) -> Result<Vec<Quote>>;

    /// Quotes whose symbol or company name contains the query, ignoring
    /// case. A blank query matches nothing.
    async fn search(&self, query: &str) -> Result<Vec<Quote>>;

    fn name(&self) -> &str;
}

/// Catalog of curated trading strategies.
#[async_trait::async_trait]
pub trait StrategySource: Send + Sync {
    async fn strategies(&self) -> Result<Vec<Strategy>>;

    async fn strategy(&self, id: u32) -> Result<Option<Strategy>>;
}
