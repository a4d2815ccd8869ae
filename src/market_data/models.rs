use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current price snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    /// Company name.
    pub name: String,
    pub price: Decimal,
    /// Day change; negative when the price moved down.
    pub change: Decimal,
}

/// One day in a price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A curated strategy description with its recommended tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub risk: RiskLevel,
    /// Display range, e.g. "8-12%".
    pub expected_return: String,
    pub recommended_symbols: Vec<String>,
}
