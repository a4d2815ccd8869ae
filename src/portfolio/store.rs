use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::{Holding, Portfolio, User};

/// Handle shared between the session, sync, and valuation layers. The sync
/// coordinator holds the lock across a full optimistic-apply/commit cycle,
/// which serializes mutations per user.
pub type SharedStore = Arc<Mutex<PortfolioStore>>;

/// In-memory authoritative state for the active user's portfolios.
///
/// The session layer installs and clears the user. Mutations reject with
/// typed errors before touching anything, so a failed call leaves state
/// exactly as it was. The store itself does no locking; see [`SharedStore`].
#[derive(Debug, Default)]
pub struct PortfolioStore {
    user: Option<User>,
}

impl PortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Install the active user. Also used to put a prior snapshot back when
    /// a mutation is rolled back.
    pub fn install_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn clear(&mut self) {
        self.user = None;
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Result<u64> {
        Ok(self.active()?.id)
    }

    /// Clone of the full user tree, the persisted session form.
    pub fn snapshot(&self) -> Option<User> {
        self.user.clone()
    }

    fn active(&self) -> Result<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| Error::auth("no active session"))
    }

    fn active_mut(&mut self) -> Result<&mut User> {
        self.user
            .as_mut()
            .ok_or_else(|| Error::auth("no active session"))
    }

    /// Create a portfolio named `name`. The id is one past the highest
    /// existing id, so deleted ids are not handed out again.
    pub fn create_portfolio(&mut self, name: &str) -> Result<Portfolio> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("portfolio name cannot be empty"));
        }
        let user = self.active_mut()?;
        let portfolio = Portfolio::new(user.next_portfolio_id(), name);
        user.portfolios.push(portfolio.clone());
        Ok(portfolio)
    }

    /// Remove the portfolio with `id`, returning it.
    pub fn delete_portfolio(&mut self, id: u64) -> Result<Portfolio> {
        let user = self.active_mut()?;
        let index = user
            .portfolios
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found(format!("portfolio {id}")))?;
        Ok(user.portfolios.remove(index))
    }

    /// Add `holding` to the portfolio, replacing any existing holding with
    /// the same symbol wholesale. Returns the replaced holding when there
    /// was one.
    pub fn add_or_replace_holding(
        &mut self,
        portfolio_id: u64,
        holding: Holding,
    ) -> Result<Option<Holding>> {
        let mut holding = holding;
        holding.symbol = holding.symbol.trim().to_ascii_uppercase();

        let user = self.active_mut()?;
        let portfolio = user
            .portfolio_mut(portfolio_id)
            .ok_or_else(|| Error::not_found(format!("portfolio {portfolio_id}")))?;
        holding.validate()?;

        match portfolio.index_of(&holding.symbol) {
            Some(index) => {
                let prior = std::mem::replace(&mut portfolio.holdings[index], holding);
                Ok(Some(prior))
            }
            None => {
                portfolio.holdings.push(holding);
                Ok(None)
            }
        }
    }

    /// Remove the holding with `symbol` if present; absent symbols are a
    /// no-op, an absent portfolio is an error.
    pub fn remove_holding(&mut self, portfolio_id: u64, symbol: &str) -> Result<Option<Holding>> {
        let user = self.active_mut()?;
        let portfolio = user
            .portfolio_mut(portfolio_id)
            .ok_or_else(|| Error::not_found(format!("portfolio {portfolio_id}")))?;
        Ok(portfolio
            .index_of(symbol)
            .map(|index| portfolio.holdings.remove(index)))
    }

    /// Adopt the id the persistence source assigned to an optimistically
    /// created portfolio.
    pub fn adopt_portfolio_id(&mut self, local_id: u64, canonical_id: u64) -> Result<()> {
        let user = self.active_mut()?;
        let portfolio = user
            .portfolio_mut(local_id)
            .ok_or_else(|| Error::not_found(format!("portfolio {local_id}")))?;
        portfolio.id = canonical_id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    fn store_with_user() -> PortfolioStore {
        let mut store = PortfolioStore::new();
        store.install_user(User::new(1, "admin", "Admin User", "admin@example.com"));
        store
    }

    fn holding(symbol: &str, shares: u32, price: i64) -> Holding {
        Holding::new(
            symbol,
            shares,
            Decimal::from(price),
            NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn create_assigns_sequential_ids_from_one() {
        let mut store = store_with_user();
        assert_eq!(store.create_portfolio("First").unwrap().id, 1);
        assert_eq!(store.create_portfolio("Second").unwrap().id, 2);
    }

    #[test]
    fn deleted_ids_are_never_reused() {
        let mut store = store_with_user();
        for id in [1, 3, 5] {
            store
                .active_mut()
                .unwrap()
                .portfolios
                .push(Portfolio::new(id, format!("P{id}")));
        }

        store.delete_portfolio(3).unwrap();
        let next = store.create_portfolio("Next").unwrap();
        assert_eq!(next.id, 6);
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut store = store_with_user();
        assert!(store.create_portfolio("").unwrap_err().is_validation());
        assert!(store.create_portfolio("   ").unwrap_err().is_validation());
    }

    #[test]
    fn names_are_stored_trimmed() {
        let mut store = store_with_user();
        let portfolio = store.create_portfolio("  Tech Portfolio  ").unwrap();
        assert_eq!(portfolio.name, "Tech Portfolio");
    }

    #[test]
    fn mutations_require_an_active_session() {
        let mut store = PortfolioStore::new();
        let err = store.create_portfolio("Tech").unwrap_err();
        assert!(matches!(err, Error::Auth(_)));

        let err = store
            .add_or_replace_holding(1, holding("AAPL", 1, 1))
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn delete_of_unknown_portfolio_is_not_found() {
        let mut store = store_with_user();
        assert!(store.delete_portfolio(42).unwrap_err().is_not_found());
    }

    #[test]
    fn same_symbol_add_replaces_wholesale() {
        let mut store = store_with_user();
        let portfolio_id = store.create_portfolio("Tech").unwrap().id;
        store
            .add_or_replace_holding(portfolio_id, holding("AAPL", 10, 150))
            .unwrap();

        let replaced = store
            .add_or_replace_holding(portfolio_id, holding("AAPL", 3, 190))
            .unwrap()
            .expect("prior holding");
        assert_eq!(replaced.shares, 10);

        let user = store.user().unwrap();
        let holdings = &user.portfolio(portfolio_id).unwrap().holdings;
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].shares, 3);
        assert_eq!(holdings[0].purchase_price, Decimal::from(190));
    }

    #[test]
    fn replace_matches_symbols_case_insensitively() {
        let mut store = store_with_user();
        let portfolio_id = store.create_portfolio("Tech").unwrap().id;
        store
            .add_or_replace_holding(portfolio_id, holding("AAPL", 10, 150))
            .unwrap();

        let replaced = store
            .add_or_replace_holding(portfolio_id, holding("aapl", 7, 160))
            .unwrap();
        assert!(replaced.is_some());

        let user = store.user().unwrap();
        let holdings = &user.portfolio(portfolio_id).unwrap().holdings;
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].symbol, "AAPL");
    }

    #[test]
    fn distinct_symbols_append_in_order() {
        let mut store = store_with_user();
        let portfolio_id = store.create_portfolio("Tech").unwrap().id;
        store
            .add_or_replace_holding(portfolio_id, holding("AAPL", 10, 150))
            .unwrap();
        store
            .add_or_replace_holding(portfolio_id, holding("MSFT", 5, 280))
            .unwrap();

        let user = store.user().unwrap();
        let symbols: Vec<&str> = user
            .portfolio(portfolio_id)
            .unwrap()
            .holdings
            .iter()
            .map(|h| h.symbol.as_str())
            .collect();
        assert_eq!(symbols, ["AAPL", "MSFT"]);
    }

    #[test]
    fn upsert_into_unknown_portfolio_leaves_state_untouched() {
        let mut store = store_with_user();
        store.create_portfolio("Tech").unwrap();
        let before = store.snapshot();

        let err = store
            .add_or_replace_holding(42, holding("AAPL", 10, 150))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn invalid_holdings_leave_state_untouched() {
        let mut store = store_with_user();
        let portfolio_id = store.create_portfolio("Tech").unwrap().id;
        let before = store.snapshot();

        let mut zero_shares = holding("AAPL", 10, 150);
        zero_shares.shares = 0;
        let err = store
            .add_or_replace_holding(portfolio_id, zero_shares)
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn remove_of_absent_symbol_is_a_noop() {
        let mut store = store_with_user();
        let portfolio_id = store.create_portfolio("Tech").unwrap().id;
        store
            .add_or_replace_holding(portfolio_id, holding("AAPL", 10, 150))
            .unwrap();

        assert!(store.remove_holding(portfolio_id, "MSFT").unwrap().is_none());

        let removed = store.remove_holding(portfolio_id, "AAPL").unwrap();
        assert_eq!(removed.unwrap().symbol, "AAPL");
        assert!(store.remove_holding(42, "AAPL").unwrap_err().is_not_found());
    }

    #[test]
    fn adopt_rewrites_the_local_id() {
        let mut store = store_with_user();
        let local = store.create_portfolio("Tech").unwrap();
        store.adopt_portfolio_id(local.id, 17).unwrap();

        let user = store.user().unwrap();
        assert!(user.portfolio(17).is_some());
        assert!(user.portfolio(local.id).is_none());
    }
}
