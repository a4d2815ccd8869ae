use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::Portfolio;
use crate::error::{Error, Result};

/// An account holder and their portfolios.
///
/// This is the unit of session snapshots: the whole tree serializes and
/// restores losslessly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    /// Display name.
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub portfolios: Vec<Portfolio>,
}

impl User {
    pub fn new(
        id: u64,
        username: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            name: name.into(),
            email: email.into(),
            portfolios: Vec::new(),
        }
    }

    pub fn portfolio(&self, id: u64) -> Option<&Portfolio> {
        self.portfolios.iter().find(|p| p.id == id)
    }

    pub fn portfolio_mut(&mut self, id: u64) -> Option<&mut Portfolio> {
        self.portfolios.iter_mut().find(|p| p.id == id)
    }

    /// Id for the next created portfolio: one past the highest existing id,
    /// 1 when the collection is empty.
    pub fn next_portfolio_id(&self) -> u64 {
        1 + self.portfolios.iter().map(|p| p.id).max().unwrap_or(0)
    }

    /// Structural sweep applied to restored snapshots: non-blank identity,
    /// unique portfolio ids, unique symbols per portfolio, holdings within
    /// their invariants.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::validation("username cannot be empty"));
        }
        let mut portfolio_ids = HashSet::new();
        for portfolio in &self.portfolios {
            if portfolio.name.trim().is_empty() {
                return Err(Error::validation(format!(
                    "portfolio {} has an empty name",
                    portfolio.id
                )));
            }
            if !portfolio_ids.insert(portfolio.id) {
                return Err(Error::validation(format!(
                    "duplicate portfolio id {}",
                    portfolio.id
                )));
            }
            let mut symbols = HashSet::new();
            for holding in &portfolio.holdings {
                holding.validate()?;
                if !symbols.insert(holding.symbol.clone()) {
                    return Err(Error::validation(format!(
                        "duplicate holding {} in portfolio {}",
                        holding.symbol, portfolio.id
                    )));
                }
            }
        }
        Ok(())
    }
}
