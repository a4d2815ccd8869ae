//! Market data served by the stock advisor HTTP API.
//!
//! Quote and history rows arrive with float-typed numbers and snake_case
//! fields; strategies keep the API's camelCase spellings. Everything is
//! converted to the canonical models at this boundary.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{PricePoint, Quote, QuoteSource, RiskLevel, Strategy, StrategySource};

const STOCK_API_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Deserialize)]
struct WireQuote {
    symbol: String,
    name: String,
    price: f64,
    change: f64,
}

#[derive(Debug, Deserialize)]
struct WirePricePoint {
    date: NaiveDate,
    price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStrategy {
    id: u32,
    name: String,
    description: String,
    risk_level: String,
    expected_return: String,
    recommended_stocks: Vec<String>,
}

fn to_decimal(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).with_context(|| format!("{value} is not a finite number"))
}

impl WireQuote {
    fn into_quote(self) -> Result<Quote> {
        let price =
            to_decimal(self.price).with_context(|| format!("quote price for {}", self.symbol))?;
        let change =
            to_decimal(self.change).with_context(|| format!("day change for {}", self.symbol))?;
        Ok(Quote {
            symbol: self.symbol,
            name: self.name,
            price,
            change,
        })
    }
}

impl WirePricePoint {
    fn into_point(self) -> Result<PricePoint> {
        let price = to_decimal(self.price)
            .with_context(|| format!("history price on {}", self.date))?;
        Ok(PricePoint {
            date: self.date,
            price,
        })
    }
}

impl WireStrategy {
    fn into_strategy(self) -> Result<Strategy> {
        let risk = match self.risk_level.as_str() {
            "Low" => RiskLevel::Low,
            "Medium" => RiskLevel::Medium,
            "High" => RiskLevel::High,
            other => anyhow::bail!("unknown risk level {other:?} for strategy {}", self.id),
        };
        Ok(Strategy {
            id: self.id,
            name: self.name,
            description: self.description,
            risk,
            expected_return: self.expected_return,
            recommended_symbols: self.recommended_stocks,
        })
    }
}

/// Quote and strategy gateway over the stock advisor API.
#[derive(Debug, Clone)]
pub struct HttpMarketData {
    client: Client,
    base_url: String,
}

impl HttpMarketData {
    /// Gateway against the default local API address.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: STOCK_API_BASE_URL.to_string(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Point at a different server. Tests aim this at a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_quotes(&self, url: String) -> Result<Vec<Quote>> {
        let rows = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<WireQuote>>()
            .await?;
        rows.into_iter().map(WireQuote::into_quote).collect()
    }
}

impl Default for HttpMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl QuoteSource for HttpMarketData {
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        // The API serves the whole table; pick the row out of it.
        let quotes = self.quotes().await?;
        Ok(quotes
            .into_iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol)))
    }

    async fn history(&self, symbol: &str, days: u32) -> Result<Vec<PricePoint>> {
        let url = format!("{}/api/stocks/history/{symbol}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("days", days)])
            .send()
            .await
            .with_context(|| format!("requesting price history for {symbol}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let rows = response
            .error_for_status()?
            .json::<Vec<WirePricePoint>>()
            .await?;
        rows.into_iter().map(WirePricePoint::into_point).collect()
    }

    async fn quotes(&self) -> Result<Vec<Quote>> {
        self.fetch_quotes(format!("{}/api/stocks", self.base_url))
            .await
            .context("requesting stock quotes")
    }

    async fn search(&self, query: &str) -> Result<Vec<Quote>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/api/stocks/search", self.base_url);
        let rows = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<WireQuote>>()
            .await?;
        rows.into_iter().map(WireQuote::into_quote).collect()
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[async_trait::async_trait]
impl StrategySource for HttpMarketData {
    async fn strategies(&self) -> Result<Vec<Strategy>> {
        let url = format!("{}/api/strategies", self.base_url);
        let rows = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<WireStrategy>>()
            .await?;
        rows.into_iter().map(WireStrategy::into_strategy).collect()
    }

    async fn strategy(&self, id: u32) -> Result<Option<Strategy>> {
        let url = format!("{}/api/strategies/{id}", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let row = response.error_for_status()?.json::<WireStrategy>().await?;
        Ok(Some(row.into_strategy()?))
    }
}
