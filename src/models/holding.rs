use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One stock position inside a portfolio.
///
/// A portfolio carries at most one holding per symbol. Adding a symbol that
/// is already present replaces the prior holding wholesale; share counts are
/// never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol, stored uppercase.
    pub symbol: String,
    /// Number of shares, always positive.
    pub shares: u32,
    /// Per-share price paid.
    pub purchase_price: Decimal,
    /// Trade date.
    pub purchase_date: NaiveDate,
}

impl Holding {
    /// Build a validated holding, trimming and uppercasing the symbol.
    pub fn new(
        symbol: impl Into<String>,
        shares: u32,
        purchase_price: Decimal,
        purchase_date: NaiveDate,
    ) -> Result<Self> {
        let holding = Self {
            symbol: symbol.into().trim().to_ascii_uppercase(),
            shares,
            purchase_price,
            purchase_date,
        };
        holding.validate()?;
        Ok(holding)
    }

    /// Invariant check: non-empty symbol, positive share count, positive
    /// purchase price.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::validation("holding symbol cannot be empty"));
        }
        if self.shares == 0 {
            return Err(Error::validation("share count must be greater than zero"));
        }
        if self.purchase_price <= Decimal::ZERO {
            return Err(Error::validation(
                "purchase price must be greater than zero",
            ));
        }
        Ok(())
    }

    /// purchase_price × shares, the reference value for profit computation.
    pub fn cost_basis(&self) -> Decimal {
        self.purchase_price * Decimal::from(self.shares)
    }
}
