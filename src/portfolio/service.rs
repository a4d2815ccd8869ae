use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::debug;

use crate::market_data::QuoteSource;
use crate::models::{Holding, Portfolio};

use super::{valuate_all, PortfolioValuation};

/// Values portfolios against whatever [`QuoteSource`] is wired in.
pub struct ValuationService {
    quotes: Arc<dyn QuoteSource>,
}

impl ValuationService {
    pub fn new(quotes: Arc<dyn QuoteSource>) -> Self {
        Self { quotes }
    }

    /// Value every position in `portfolio` at the latest quotes. Symbols the
    /// source does not know are valued at zero so the shortfall shows up in
    /// the totals instead of vanishing.
    pub async fn valuate_portfolio(&self, portfolio: &Portfolio) -> Result<PortfolioValuation> {
        let mut prices = HashMap::new();
        self.collect_prices(&portfolio.holdings, &mut prices).await?;
        Ok(valuate_all(&portfolio.holdings, |symbol| {
            prices.get(symbol).copied()
        }))
    }

    /// Value several portfolios in one pass, fetching each symbol once.
    pub async fn valuate_portfolios(
        &self,
        portfolios: &[Portfolio],
    ) -> Result<Vec<PortfolioValuation>> {
        let mut prices = HashMap::new();
        for portfolio in portfolios {
            self.collect_prices(&portfolio.holdings, &mut prices).await?;
        }
        Ok(portfolios
            .iter()
            .map(|portfolio| {
                valuate_all(&portfolio.holdings, |symbol| prices.get(symbol).copied())
            })
            .collect())
    }

    async fn collect_prices(
        &self,
        holdings: &[Holding],
        prices: &mut HashMap<String, Decimal>,
    ) -> Result<()> {
        for holding in holdings {
            if prices.contains_key(&holding.symbol) {
                continue;
            }
            let quote = self
                .quotes
                .quote(&holding.symbol)
                .await
                .with_context(|| format!("fetching quote for {}", holding.symbol))?;
            match quote {
                Some(quote) => {
                    prices.insert(holding.symbol.clone(), quote.price);
                }
                None => {
                    debug!(symbol = %holding.symbol, "no quote available, position valued at zero");
                }
            }
        }
        Ok(())
    }
}
