use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Holding;

/// Derived profit and loss for one holding at a current price.
///
/// Never persisted; recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub profit: Decimal,
    pub profit_percentage: Decimal,
}

/// A holding together with its derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionValuation {
    pub holding: Holding,
    pub valuation: Valuation,
}

/// Aggregate valuation over a set of holdings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioValuation {
    pub positions: Vec<PositionValuation>,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub total_profit_percentage: Decimal,
}

/// Value one holding at `current_price`.
///
/// Total function: a price of zero is legitimate (delisted symbol, or the
/// documented sentinel for an unavailable price) and simply shows the full
/// loss.
pub fn valuate(holding: &Holding, current_price: Decimal) -> Valuation {
    let current_value = current_price * Decimal::from(holding.shares);
    let cost_basis = holding.cost_basis();
    let profit = current_value - cost_basis;
    Valuation {
        current_price,
        current_value,
        profit,
        profit_percentage: percentage(profit, cost_basis),
    }
}

/// Value every holding via `price_for`, summing totals. The total
/// percentage comes from the summed cost basis, with the same zero-basis
/// rule as the per-holding computation. An empty slice yields all zeros.
pub fn valuate_all<F>(holdings: &[Holding], mut price_for: F) -> PortfolioValuation
where
    F: FnMut(&str) -> Option<Decimal>,
{
    let mut positions = Vec::with_capacity(holdings.len());
    let mut total_value = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;

    for holding in holdings {
        // An absent price values the position at zero; the loss stays
        // visible rather than being hidden.
        let price = price_for(&holding.symbol).unwrap_or(Decimal::ZERO);
        let valuation = valuate(holding, price);
        total_value += valuation.current_value;
        total_cost += holding.cost_basis();
        positions.push(PositionValuation {
            holding: holding.clone(),
            valuation,
        });
    }

    let total_profit = total_value - total_cost;
    PortfolioValuation {
        positions,
        total_value,
        total_cost,
        total_profit,
        total_profit_percentage: percentage(total_profit, total_cost),
    }
}

fn percentage(profit: Decimal, cost_basis: Decimal) -> Decimal {
    if cost_basis.is_zero() {
        Decimal::ZERO
    } else {
        profit / cost_basis * Decimal::ONE_HUNDRED
    }
}
