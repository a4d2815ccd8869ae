//! In-process market data used by default and in tests.
//!
//! Quotes come from a fixed table of large-cap symbols; history is a
//! simulated random walk seeded from the quoted price. No network access.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::clock::{Clock, SystemClock};

use super::{PricePoint, Quote, QuoteSource, RiskLevel, Strategy, StrategySource};

/// (symbol, company, price, day change), money columns in cents.
const QUOTE_TABLE: &[(&str, &str, i64, i64)] = &[
    ("AAPL", "Apple Inc.", 180_95, 2_30),
    ("MSFT", "Microsoft Corporation", 325_14, 4_25),
    ("GOOGL", "Alphabet Inc.", 2950_12, 15_72),
    ("AMZN", "Amazon.com Inc.", 3550_50, -12_30),
    ("TSLA", "Tesla, Inc.", 950_75, 28_15),
    ("META", "Meta Platforms, Inc.", 330_42, -5_18),
    ("NFLX", "Netflix, Inc.", 620_83, 8_94),
    ("NVDA", "NVIDIA Corporation", 780_25, 22_40),
    ("JNJ", "Johnson & Johnson", 175_32, 1_15),
    ("PG", "Procter & Gamble Co.", 162_80, 0_75),
    ("V", "Visa Inc.", 240_35, 3_25),
    ("JPM", "JPMorgan Chase & Co.", 155_48, -1_22),
    ("UNH", "UnitedHealth Group Inc.", 480_92, 5_20),
    ("HD", "The Home Depot, Inc.", 340_65, -2_35),
    ("PFE", "Pfizer Inc.", 48_75, 0_65),
];

fn seed_quotes() -> Vec<Quote> {
    QUOTE_TABLE
        .iter()
        .map(|(symbol, name, price, change)| Quote {
            symbol: (*symbol).to_string(),
            name: (*name).to_string(),
            price: Decimal::new(*price, 2),
            change: Decimal::new(*change, 2),
        })
        .collect()
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

fn seed_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            id: 1,
            name: "Blue Chip Growth".to_string(),
            description:
                "Focus on established, industry-leading companies with strong growth potential."
                    .to_string(),
            risk: RiskLevel::Medium,
            expected_return: "8-12%".to_string(),
            recommended_symbols: symbols(&["AAPL", "MSFT", "JNJ", "PG", "V"]),
        },
        Strategy {
            id: 2,
            name: "Tech Innovation".to_string(),
            description: "Invest in cutting-edge technology companies poised for rapid growth."
                .to_string(),
            risk: RiskLevel::High,
            expected_return: "12-20%".to_string(),
            recommended_symbols: symbols(&["TSLA", "NVDA", "GOOGL", "META", "AMZN"]),
        },
        Strategy {
            id: 3,
            name: "Value Investing".to_string(),
            description: "Target undervalued stocks with strong fundamentals and dividends."
                .to_string(),
            risk: RiskLevel::Low,
            expected_return: "5-8%".to_string(),
            recommended_symbols: symbols(&["JNJ", "PG", "JPM", "HD", "UNH"]),
        },
        Strategy {
            id: 4,
            name: "Dividend Income".to_string(),
            description: "Focus on companies with consistent dividend payments and growth."
                .to_string(),
            risk: RiskLevel::Low,
            expected_return: "4-6%".to_string(),
            recommended_symbols: symbols(&["PFE", "JNJ", "PG", "JPM", "HD"]),
        },
    ]
}

/// Built-in quote and strategy source.
pub struct FixtureMarketData {
    quotes: Vec<Quote>,
    strategies: Vec<Strategy>,
    clock: Arc<dyn Clock>,
}

impl FixtureMarketData {
    pub fn new() -> Self {
        Self {
            quotes: seed_quotes(),
            strategies: seed_strategies(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Override the clock so history dates are deterministic in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn find(&self, symbol: &str) -> Option<&Quote> {
        self.quotes
            .iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
    }
}

impl Default for FixtureMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl QuoteSource for FixtureMarketData {
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        Ok(self.find(symbol).cloned())
    }

    async fn history(&self, symbol: &str, days: u32) -> Result<Vec<PricePoint>> {
        let Some(quote) = self.find(symbol) else {
            return Ok(Vec::new());
        };

        let today = self.clock.today();
        let mut rng = rand::thread_rng();
        let mut price = quote.price;
        let mut points = Vec::with_capacity(days as usize + 1);

        // Walk backward-dated points forward in time: each step drifts the
        // carried price by a random amount within ±3%, floored at 1.
        for offset in (0..=i64::from(days)).rev() {
            let drift = rng.gen_range(-0.03..0.03);
            let step = price * Decimal::from_f64(drift).unwrap_or_default();
            price = (price + step).max(Decimal::ONE);
            points.push(PricePoint {
                date: today - Duration::days(offset),
                price: price.round_dp(2),
            });
        }

        Ok(points)
    }

    async fn quotes(&self) -> Result<Vec<Quote>> {
        Ok(self.quotes.clone())
    }

    async fn search(&self, query: &str) -> Result<Vec<Quote>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .quotes
            .iter()
            .filter(|quote| {
                quote.symbol.to_lowercase().contains(&query)
                    || quote.name.to_lowercase().contains(&query)
            })
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

#[async_trait::async_trait]
impl StrategySource for FixtureMarketData {
    async fn strategies(&self) -> Result<Vec<Strategy>> {
        Ok(self.strategies.clone())
    }

    async fn strategy(&self, id: u32) -> Result<Option<Strategy>> {
        Ok(self.strategies.iter().find(|s| s.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::clock::FixedClock;

    use super::*;

    fn fixture_at(date: NaiveDate) -> FixtureMarketData {
        FixtureMarketData::new().with_clock(Arc::new(FixedClock::on_date(date)))
    }

    #[tokio::test]
    async fn quote_lookup_ignores_case_and_misses_cleanly() {
        let source = FixtureMarketData::new();
        let quote = source.quote("aapl").await.unwrap().unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, Decimal::new(180_95, 2));

        assert!(source.quote("ZZZZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn quotes_returns_the_whole_table() {
        let source = FixtureMarketData::new();
        assert_eq!(source.quotes().await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn search_matches_symbol_and_name_fragments() {
        let source = FixtureMarketData::new();

        let by_symbol = source.search("nvd").await.unwrap();
        assert_eq!(by_symbol.len(), 1);
        assert_eq!(by_symbol[0].symbol, "NVDA");

        let by_name = source.search("johnson").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].symbol, "JNJ");

        assert!(source.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_covers_the_horizon_in_order() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let source = fixture_at(today);

        let points = source.history("MSFT", 30).await.unwrap();
        assert_eq!(points.len(), 31);
        assert_eq!(points[0].date, today - Duration::days(30));
        assert_eq!(points.last().unwrap().date, today);
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn history_prices_stay_floored_and_rounded() {
        let source = fixture_at(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
        let points = source.history("PFE", 90).await.unwrap();
        for point in points {
            assert!(point.price >= Decimal::ONE);
            assert!(point.price.scale() <= 2, "price {} too precise", point.price);
        }
    }

    #[tokio::test]
    async fn history_for_unknown_symbol_is_empty() {
        let source = FixtureMarketData::new();
        assert!(source.history("ZZZZ", 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_day_history_is_a_single_point_dated_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let points = fixture_at(today).history("AAPL", 0).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, today);
    }

    #[tokio::test]
    async fn strategy_catalog_is_seeded() {
        let source = FixtureMarketData::new();
        assert_eq!(source.strategies().await.unwrap().len(), 4);

        let value = source.strategy(3).await.unwrap().unwrap();
        assert_eq!(value.name, "Value Investing");
        assert_eq!(value.risk, RiskLevel::Low);

        assert!(source.strategy(99).await.unwrap().is_none());
    }
}
