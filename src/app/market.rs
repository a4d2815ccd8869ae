use anyhow::Result;

use crate::error::Error;
use crate::market_data::{Quote, QuoteSource, StrategySource};

use super::types::{PriceHistoryOutput, PricePointOutput, QuoteOutput, StrategyOutput};

fn quote_output(quote: Quote) -> QuoteOutput {
    QuoteOutput {
        symbol: quote.symbol,
        name: quote.name,
        price: quote.price.to_string(),
        change: quote.change.to_string(),
    }
}

pub async fn list_quotes(quotes: &dyn QuoteSource) -> Result<Vec<QuoteOutput>> {
    Ok(quotes.quotes().await?.into_iter().map(quote_output).collect())
}

pub async fn search_quotes(quotes: &dyn QuoteSource, query: &str) -> Result<Vec<QuoteOutput>> {
    Ok(quotes
        .search(query)
        .await?
        .into_iter()
        .map(quote_output)
        .collect())
}

/// Daily closing prices reaching `days` back. Unknown symbols produce an
/// empty series, not an error.
pub async fn price_history(
    quotes: &dyn QuoteSource,
    symbol: &str,
    days: u32,
) -> Result<PriceHistoryOutput> {
    let symbol = symbol.trim().to_ascii_uppercase();
    let points = quotes.history(&symbol, days).await?;
    Ok(PriceHistoryOutput {
        symbol,
        days,
        points: points
            .into_iter()
            .map(|point| PricePointOutput {
                date: point.date.to_string(),
                price: point.price.to_string(),
            })
            .collect(),
    })
}

pub async fn list_strategies(strategies: &dyn StrategySource) -> Result<Vec<StrategyOutput>> {
    Ok(strategies
        .strategies()
        .await?
        .into_iter()
        .map(strategy_output)
        .collect())
}

pub async fn show_strategy(strategies: &dyn StrategySource, id: u32) -> Result<StrategyOutput> {
    let strategy = strategies
        .strategy(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("strategy {id}")))?;
    Ok(strategy_output(strategy))
}

fn strategy_output(strategy: crate::market_data::Strategy) -> StrategyOutput {
    StrategyOutput {
        id: strategy.id,
        name: strategy.name,
        description: strategy.description,
        risk: strategy.risk,
        expected_return: strategy.expected_return,
        recommended_symbols: strategy.recommended_symbols,
    }
}
