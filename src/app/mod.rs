mod market;
mod portfolio;
mod session;
mod types;

pub use market::{list_quotes, list_strategies, price_history, search_quotes, show_strategy};
pub use portfolio::{
    add_holding, create_portfolio, delete_portfolio, list_portfolios, portfolio_value,
    remove_holding, value_report,
};
pub use session::{login, logout, register, whoami};
pub use types::{
    HoldingOutput, PortfolioOutput, PortfolioValueOutput, PositionValueOutput, PriceHistoryOutput,
    PricePointOutput, QuoteOutput, StrategyOutput, UserOutput, ValueReportOutput, WhoamiOutput,
};
