use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Holding, Portfolio, User};
use crate::portfolio::{PortfolioStore, SharedStore};
use crate::storage::PersistenceSource;

use super::{CommitStatus, MutationOutcome};

/// Runs every portfolio mutation as optimistic apply, remote commit,
/// resolve.
///
/// The store lock is held across the whole cycle, so one mutation is in
/// flight per user at a time and commits reach the backend in issuance
/// order. Validation failures surface before the local apply; commit
/// failures surface in the returned [`MutationOutcome`], never silently.
pub struct SyncCoordinator {
    store: SharedStore,
    persistence: Arc<dyn PersistenceSource>,
    rollback_on_failure: bool,
}

impl SyncCoordinator {
    pub fn new(store: SharedStore, persistence: Arc<dyn PersistenceSource>) -> Self {
        Self {
            store,
            persistence,
            rollback_on_failure: false,
        }
    }

    /// Revert the optimistic apply when the commit fails, instead of the
    /// default of keeping the local change visible and reporting failure.
    pub fn with_rollback_on_failure(mut self, rollback: bool) -> Self {
        self.rollback_on_failure = rollback;
        self
    }

    /// Create a portfolio locally and on the backend. When the backend
    /// assigns a different id, the local record adopts it.
    pub async fn create_portfolio(&self, name: &str) -> Result<MutationOutcome<Portfolio>> {
        let mut store = self.store.lock().await;
        let prior = self.prior_state(&store);
        let user_id = store.user_id()?;
        let mut portfolio = store.create_portfolio(name)?;
        info!(portfolio = %portfolio.name, "creating portfolio");

        let commit = match self
            .persistence
            .create_portfolio(user_id, &portfolio.name)
            .await
        {
            Ok(canonical) => {
                if canonical.id != portfolio.id {
                    debug!(
                        local_id = portfolio.id,
                        canonical_id = canonical.id,
                        "adopting backend-assigned portfolio id"
                    );
                    store.adopt_portfolio_id(portfolio.id, canonical.id)?;
                    portfolio.id = canonical.id;
                }
                Ok(())
            }
            Err(err) => Err(err),
        };

        Ok(self.resolve(&mut store, prior, portfolio, commit).await)
    }

    /// Delete a portfolio locally and on the backend. Returns the removed
    /// portfolio.
    pub async fn delete_portfolio(&self, id: u64) -> Result<MutationOutcome<Portfolio>> {
        let mut store = self.store.lock().await;
        let prior = self.prior_state(&store);
        let removed = store.delete_portfolio(id)?;
        info!(portfolio = %removed.name, "deleting portfolio");

        let commit = self.persistence.delete_portfolio(id).await;
        Ok(self.resolve(&mut store, prior, removed, commit).await)
    }

    /// Add a holding, replacing any holding with the same symbol. Returns
    /// the replaced holding when there was one.
    pub async fn upsert_holding(
        &self,
        portfolio_id: u64,
        holding: Holding,
    ) -> Result<MutationOutcome<Option<Holding>>> {
        let mut holding = holding;
        holding.symbol = holding.symbol.trim().to_ascii_uppercase();

        let mut store = self.store.lock().await;
        let prior = self.prior_state(&store);
        let replaced = store.add_or_replace_holding(portfolio_id, holding.clone())?;
        info!(symbol = %holding.symbol, portfolio_id, "upserting holding");

        let commit = self.persistence.upsert_holding(portfolio_id, &holding).await;
        Ok(self.resolve(&mut store, prior, replaced, commit).await)
    }

    /// Remove the holding with `symbol`. Removing an absent symbol is a
    /// local no-op and never reaches the backend.
    pub async fn remove_holding(
        &self,
        portfolio_id: u64,
        symbol: &str,
    ) -> Result<MutationOutcome<Option<Holding>>> {
        let mut store = self.store.lock().await;
        let prior = self.prior_state(&store);
        let Some(removed) = store.remove_holding(portfolio_id, symbol)? else {
            debug!(symbol, portfolio_id, "holding absent, nothing to remove");
            return Ok(MutationOutcome {
                value: None,
                commit: CommitStatus::Committed,
            });
        };
        info!(symbol = %removed.symbol, portfolio_id, "removing holding");

        let commit = self
            .persistence
            .delete_holding(portfolio_id, &removed.symbol)
            .await;
        Ok(self.resolve(&mut store, prior, Some(removed), commit).await)
    }

    fn prior_state(&self, store: &PortfolioStore) -> Option<User> {
        if self.rollback_on_failure {
            store.snapshot()
        } else {
            None
        }
    }

    async fn resolve<T>(
        &self,
        store: &mut PortfolioStore,
        prior: Option<User>,
        value: T,
        commit: anyhow::Result<()>,
    ) -> MutationOutcome<T> {
        let commit = match commit {
            Ok(()) => CommitStatus::Committed,
            Err(err) => {
                let cause = format!("{err:#}");
                warn!(error = %cause, "remote commit failed");
                if self.rollback_on_failure {
                    match prior {
                        Some(user) => store.install_user(user),
                        None => store.clear(),
                    }
                    CommitStatus::FailedRolledBack { cause }
                } else {
                    CommitStatus::FailedKept { cause }
                }
            }
        };

        // Keep the persisted snapshot mirroring local state, whatever the
        // commit decided.
        if let Some(user) = store.snapshot() {
            if let Err(err) = self.persistence.save_session(&user).await {
                warn!(error = %err, "failed to persist session snapshot");
            }
        }

        MutationOutcome { value, commit }
    }
}
