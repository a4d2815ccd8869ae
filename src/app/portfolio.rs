use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Error;
use crate::models::{Holding, Portfolio};
use crate::portfolio::{PortfolioValuation, PositionValuation, SharedStore, ValuationService};
use crate::sync::{CommitStatus, SyncCoordinator};

use super::types::{
    HoldingOutput, PortfolioOutput, PortfolioValueOutput, PositionValueOutput, ValueReportOutput,
};

fn portfolio_object(portfolio: &Portfolio) -> serde_json::Value {
    serde_json::json!({
        "id": portfolio.id,
        "name": portfolio.name,
        "holding_count": portfolio.holdings.len()
    })
}

fn holding_object(holding: &Holding) -> serde_json::Value {
    serde_json::json!({
        "symbol": holding.symbol,
        "shares": holding.shares,
        "purchase_price": holding.purchase_price.to_string(),
        "purchase_date": holding.purchase_date.to_string()
    })
}

/// Fold the commit status into a mutation result document. A failed commit
/// still names the applied entity so the caller sees what the local state
/// holds.
fn mutation_json(key: &str, entity: serde_json::Value, commit: CommitStatus) -> serde_json::Value {
    let mut doc = match &commit {
        CommitStatus::Committed => serde_json::json!({ "success": true }),
        CommitStatus::FailedKept { cause } => serde_json::json!({
            "success": false,
            "error": cause,
            "local_change_kept": true
        }),
        CommitStatus::FailedRolledBack { cause } => serde_json::json!({
            "success": false,
            "error": cause,
            "local_change_kept": false
        }),
    };
    doc[key] = entity;
    doc
}

pub async fn create_portfolio(
    coordinator: &SyncCoordinator,
    name: &str,
) -> Result<serde_json::Value> {
    let outcome = coordinator.create_portfolio(name).await?;
    Ok(mutation_json(
        "portfolio",
        portfolio_object(&outcome.value),
        outcome.commit,
    ))
}

pub async fn delete_portfolio(
    coordinator: &SyncCoordinator,
    id: u64,
) -> Result<serde_json::Value> {
    let outcome = coordinator.delete_portfolio(id).await?;
    Ok(mutation_json(
        "portfolio",
        portfolio_object(&outcome.value),
        outcome.commit,
    ))
}

pub async fn add_holding(
    coordinator: &SyncCoordinator,
    portfolio_id: u64,
    symbol: &str,
    shares: u32,
    purchase_price: Decimal,
    purchase_date: NaiveDate,
) -> Result<serde_json::Value> {
    let holding = Holding::new(symbol, shares, purchase_price, purchase_date)?;
    let outcome = coordinator
        .upsert_holding(portfolio_id, holding.clone())
        .await?;

    let mut doc = mutation_json("holding", holding_object(&holding), outcome.commit);
    if let Some(replaced) = outcome.value {
        doc["replaced"] = holding_object(&replaced);
    }
    Ok(doc)
}

pub async fn remove_holding(
    coordinator: &SyncCoordinator,
    portfolio_id: u64,
    symbol: &str,
) -> Result<serde_json::Value> {
    let outcome = coordinator.remove_holding(portfolio_id, symbol).await?;
    let removed = match &outcome.value {
        Some(holding) => holding_object(holding),
        None => serde_json::Value::Null,
    };
    Ok(mutation_json("removed", removed, outcome.commit))
}

pub async fn list_portfolios(store: &SharedStore) -> Result<Vec<PortfolioOutput>> {
    let store = store.lock().await;
    let user = store
        .user()
        .ok_or_else(|| Error::auth("no active session"))?;

    Ok(user.portfolios.iter().map(portfolio_output).collect())
}

fn portfolio_output(portfolio: &Portfolio) -> PortfolioOutput {
    PortfolioOutput {
        id: portfolio.id,
        name: portfolio.name.clone(),
        holding_count: portfolio.holdings.len(),
        holdings: portfolio
            .holdings
            .iter()
            .map(|holding| HoldingOutput {
                symbol: holding.symbol.clone(),
                shares: holding.shares,
                purchase_price: holding.purchase_price.to_string(),
                purchase_date: holding.purchase_date.to_string(),
            })
            .collect(),
    }
}

/// Value a single portfolio at current quotes.
pub async fn portfolio_value(
    store: &SharedStore,
    valuation: &ValuationService,
    id: u64,
) -> Result<PortfolioValueOutput> {
    let portfolio = {
        let store = store.lock().await;
        let user = store
            .user()
            .ok_or_else(|| Error::auth("no active session"))?;
        user.portfolio(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("portfolio {id}")))?
    };

    let report = valuation.valuate_portfolio(&portfolio).await?;
    Ok(portfolio_value_output(&portfolio, report))
}

/// Value every portfolio, with combined totals across them.
pub async fn value_report(
    store: &SharedStore,
    valuation: &ValuationService,
) -> Result<ValueReportOutput> {
    let portfolios = {
        let store = store.lock().await;
        let user = store
            .user()
            .ok_or_else(|| Error::auth("no active session"))?;
        user.portfolios.clone()
    };

    let reports = valuation.valuate_portfolios(&portfolios).await?;

    let mut total_value = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    for report in &reports {
        total_value += report.total_value;
        total_cost += report.total_cost;
    }
    let total_profit = total_value - total_cost;
    let total_profit_percentage = if total_cost.is_zero() {
        Decimal::ZERO
    } else {
        total_profit / total_cost * Decimal::ONE_HUNDRED
    };

    Ok(ValueReportOutput {
        portfolios: portfolios
            .iter()
            .zip(reports)
            .map(|(portfolio, report)| portfolio_value_output(portfolio, report))
            .collect(),
        total_value: total_value.to_string(),
        total_cost: total_cost.to_string(),
        total_profit: total_profit.to_string(),
        total_profit_percentage: total_profit_percentage.round_dp(2).to_string(),
    })
}

fn portfolio_value_output(portfolio: &Portfolio, report: PortfolioValuation) -> PortfolioValueOutput {
    PortfolioValueOutput {
        id: portfolio.id,
        name: portfolio.name.clone(),
        total_value: report.total_value.to_string(),
        total_cost: report.total_cost.to_string(),
        total_profit: report.total_profit.to_string(),
        total_profit_percentage: report.total_profit_percentage.round_dp(2).to_string(),
        positions: report.positions.into_iter().map(position_value_output).collect(),
    }
}

fn position_value_output(position: PositionValuation) -> PositionValueOutput {
    PositionValueOutput {
        symbol: position.holding.symbol,
        shares: position.holding.shares,
        purchase_price: position.holding.purchase_price.to_string(),
        current_price: position.valuation.current_price.to_string(),
        current_value: position.valuation.current_value.to_string(),
        profit: position.valuation.profit.to_string(),
        profit_percentage: position.valuation.profit_percentage.round_dp(2).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;

    use crate::market_data::FixtureMarketData;
    use crate::portfolio::PortfolioStore;
    use crate::session::SessionManager;
    use crate::storage::MemoryStore;

    use super::*;

    async fn logged_in_admin() -> (SharedStore, SyncCoordinator) {
        let backend = Arc::new(MemoryStore::new());
        let store = PortfolioStore::shared();
        let manager = SessionManager::new(backend.clone(), backend.clone(), store.clone());
        manager
            .login("admin", SecretString::from("admin"))
            .await
            .unwrap();
        let coordinator = SyncCoordinator::new(store.clone(), backend);
        (store, coordinator)
    }

    #[tokio::test]
    async fn committed_mutations_report_success() {
        let (_store, coordinator) = logged_in_admin().await;

        let doc = create_portfolio(&coordinator, "Dividends").await.unwrap();
        assert_eq!(doc["success"], true);
        assert_eq!(doc["portfolio"]["name"], "Dividends");
        assert_eq!(doc["portfolio"]["id"], 3);
    }

    #[tokio::test]
    async fn replacing_a_holding_names_the_prior_position() {
        let (_store, coordinator) = logged_in_admin().await;

        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let doc = add_holding(&coordinator, 1, "aapl", 3, Decimal::from(190), date)
            .await
            .unwrap();
        assert_eq!(doc["success"], true);
        assert_eq!(doc["holding"]["symbol"], "AAPL");
        assert_eq!(doc["holding"]["shares"], 3);
        assert_eq!(doc["replaced"]["shares"], 10);
    }

    #[tokio::test]
    async fn removing_an_absent_holding_reports_null() {
        let (_store, coordinator) = logged_in_admin().await;

        let doc = remove_holding(&coordinator, 1, "ZZZZ").await.unwrap();
        assert_eq!(doc["success"], true);
        assert!(doc["removed"].is_null());
    }

    #[tokio::test]
    async fn value_report_covers_the_seeded_portfolios() {
        let (store, _coordinator) = logged_in_admin().await;
        let valuation = ValuationService::new(Arc::new(FixtureMarketData::new()));

        let report = value_report(&store, &valuation).await.unwrap();
        assert_eq!(report.portfolios.len(), 2);

        // Tech Portfolio: AAPL 10 @ 150 and MSFT 5 @ 280 and GOOGL 2 @ 2700
        // against fixture quotes 180.95 / 325.14 / 2950.12.
        let tech = &report.portfolios[0];
        assert_eq!(tech.name, "Tech Portfolio");
        assert_eq!(tech.total_value, "9335.44");
        assert_eq!(tech.total_cost, "8300");
        assert_eq!(tech.total_profit, "1035.44");
        assert_eq!(tech.total_profit_percentage, "12.48");
    }

    #[tokio::test]
    async fn single_portfolio_valuation_rejects_unknown_ids() {
        let (store, _coordinator) = logged_in_admin().await;
        let valuation = ValuationService::new(Arc::new(FixtureMarketData::new()));

        let err = portfolio_value(&store, &valuation, 99).await.unwrap_err();
        let local = err.downcast_ref::<Error>().unwrap();
        assert!(local.is_not_found());
    }
}
