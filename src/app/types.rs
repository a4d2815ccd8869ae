use serde::Serialize;

use crate::market_data::RiskLevel;

/// JSON output for the active user
#[derive(Serialize)]
pub struct UserOutput {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub portfolio_count: usize,
}

/// Output for the whoami command
#[derive(Serialize)]
pub struct WhoamiOutput {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserOutput>,
}

/// JSON output for holdings
#[derive(Serialize)]
pub struct HoldingOutput {
    pub symbol: String,
    pub shares: u32,
    pub purchase_price: String,
    pub purchase_date: String,
}

/// JSON output for portfolios
#[derive(Serialize)]
pub struct PortfolioOutput {
    pub id: u64,
    pub name: String,
    pub holding_count: usize,
    pub holdings: Vec<HoldingOutput>,
}

/// A valued position within a portfolio report
#[derive(Debug, Serialize)]
pub struct PositionValueOutput {
    pub symbol: String,
    pub shares: u32,
    pub purchase_price: String,
    pub current_price: String,
    pub current_value: String,
    pub profit: String,
    pub profit_percentage: String,
}

/// Valuation report for one portfolio
#[derive(Debug, Serialize)]
pub struct PortfolioValueOutput {
    pub id: u64,
    pub name: String,
    pub total_value: String,
    pub total_cost: String,
    pub total_profit: String,
    pub total_profit_percentage: String,
    pub positions: Vec<PositionValueOutput>,
}

/// Combined valuation report across every portfolio
#[derive(Serialize)]
pub struct ValueReportOutput {
    pub portfolios: Vec<PortfolioValueOutput>,
    pub total_value: String,
    pub total_cost: String,
    pub total_profit: String,
    pub total_profit_percentage: String,
}

/// JSON output for quotes
#[derive(Serialize)]
pub struct QuoteOutput {
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change: String,
}

/// One day in a price history output
#[derive(Serialize)]
pub struct PricePointOutput {
    pub date: String,
    pub price: String,
}

/// Output for the price history command
#[derive(Serialize)]
pub struct PriceHistoryOutput {
    pub symbol: String,
    pub days: u32,
    pub points: Vec<PricePointOutput>,
}

/// JSON output for strategies
#[derive(Debug, Serialize)]
pub struct StrategyOutput {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub risk: RiskLevel,
    pub expected_return: String,
    pub recommended_symbols: Vec<String>,
}
