use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Holding;

/// A named, ordered collection of holdings.
///
/// Ids are unique within the owning user's collection, assigned as one past
/// the highest existing id, and never handed back out after a deletion of a
/// lower id. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            holdings: Vec::new(),
        }
    }

    /// Look up a holding by symbol. Symbols are stored uppercase, so the
    /// comparison ignores ASCII case.
    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings
            .iter()
            .find(|h| h.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.holdings
            .iter()
            .position(|h| h.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Sum of cost bases across all holdings.
    pub fn cost_basis(&self) -> Decimal {
        self.holdings.iter().map(Holding::cost_basis).sum()
    }
}
