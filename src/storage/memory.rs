//! In-memory backend for tests and offline runs.

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::models::{Holding, Portfolio, User};
use crate::session::{AuthSource, NewUser, Registration};

use super::{seed_accounts, PersistenceSource};

struct Account {
    user: User,
    password: String,
}

/// Keeps accounts and the session snapshot in process memory. Same
/// semantics as [`super::JsonFileStore`] minus the files.
pub struct MemoryStore {
    accounts: Mutex<Vec<Account>>,
    session: Mutex<Option<User>>,
}

impl MemoryStore {
    /// Starts with the demo account the file backend also seeds.
    pub fn new() -> Self {
        let accounts = seed_accounts()
            .into_iter()
            .map(|(user, password)| Account { user, password })
            .collect();
        Self {
            accounts: Mutex::new(accounts),
            session: Mutex::new(None),
        }
    }

    /// Starts with no accounts at all.
    pub fn empty() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            session: Mutex::new(None),
        }
    }

    /// Direct look at a stored user, for assertions.
    pub async fn stored_user(&self, id: u64) -> Option<User> {
        let accounts = self.accounts.lock().await;
        accounts
            .iter()
            .find(|account| account.user.id == id)
            .map(|account| account.user.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuthSource for MemoryStore {
    async fn verify(&self, username: &str, password: &SecretString) -> Result<Option<User>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .iter()
            .find(|account| {
                account.user.username == username
                    && account.password == password.expose_secret()
            })
            .map(|account| account.user.clone()))
    }

    async fn create(&self, signup: &NewUser) -> Result<Registration> {
        let mut accounts = self.accounts.lock().await;
        if accounts
            .iter()
            .any(|account| account.user.username.eq_ignore_ascii_case(&signup.username))
        {
            return Ok(Registration::DuplicateUsername);
        }
        if accounts
            .iter()
            .any(|account| account.user.email.eq_ignore_ascii_case(&signup.email))
        {
            return Ok(Registration::DuplicateEmail);
        }

        let id = 1 + accounts
            .iter()
            .map(|account| account.user.id)
            .max()
            .unwrap_or(0);
        let user = User::new(id, &signup.username, &signup.name, &signup.email);
        accounts.push(Account {
            user: user.clone(),
            password: signup.password.expose_secret().to_string(),
        });
        Ok(Registration::Created(user))
    }
}

#[async_trait::async_trait]
impl PersistenceSource for MemoryStore {
    async fn load_session(&self) -> Result<Option<User>> {
        Ok(self.session.lock().await.clone())
    }

    async fn save_session(&self, user: &User) -> Result<()> {
        *self.session.lock().await = Some(user.clone());
        Ok(())
    }

    async fn clear_session(&self) -> Result<()> {
        *self.session.lock().await = None;
        Ok(())
    }

    async fn create_portfolio(&self, user_id: u64, name: &str) -> Result<Portfolio> {
        let mut accounts = self.accounts.lock().await;
        let user = accounts
            .iter_mut()
            .find(|account| account.user.id == user_id)
            .map(|account| &mut account.user)
            .ok_or_else(|| anyhow::anyhow!("user {user_id} not found"))?;

        let portfolio = Portfolio::new(user.next_portfolio_id(), name.trim());
        user.portfolios.push(portfolio.clone());
        Ok(portfolio)
    }

    async fn delete_portfolio(&self, id: u64) -> Result<()> {
        let mut accounts = self.accounts.lock().await;
        for account in accounts.iter_mut() {
            if let Some(index) = account.user.portfolios.iter().position(|p| p.id == id) {
                account.user.portfolios.remove(index);
                return Ok(());
            }
        }
        anyhow::bail!("portfolio {id} not found")
    }

    async fn upsert_holding(&self, portfolio_id: u64, holding: &Holding) -> Result<()> {
        let mut accounts = self.accounts.lock().await;
        let portfolio = find_portfolio(&mut accounts, portfolio_id)?;
        match portfolio.index_of(&holding.symbol) {
            Some(index) => portfolio.holdings[index] = holding.clone(),
            None => portfolio.holdings.push(holding.clone()),
        }
        Ok(())
    }

    async fn delete_holding(&self, portfolio_id: u64, symbol: &str) -> Result<()> {
        let mut accounts = self.accounts.lock().await;
        let portfolio = find_portfolio(&mut accounts, portfolio_id)?;
        match portfolio.index_of(symbol) {
            Some(index) => {
                portfolio.holdings.remove(index);
                Ok(())
            }
            None => anyhow::bail!("holding {symbol} not found in portfolio {portfolio_id}"),
        }
    }
}

fn find_portfolio(accounts: &mut [Account], portfolio_id: u64) -> Result<&mut Portfolio> {
    accounts
        .iter_mut()
        .find_map(|account| account.user.portfolio_mut(portfolio_id))
        .ok_or_else(|| anyhow::anyhow!("portfolio {portfolio_id} not found"))
}
